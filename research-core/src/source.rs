//! Sources: the referenced evidence behind a research answer.
//!
//! A [`Source`] keeps the URL exactly as the tier collaborator reported it
//! (that is what gets cited) next to a [`NormalizedUrl`] computed once at
//! construction. All equality and deduplication goes through the normalized
//! form, never the display URL.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default credibility for a source nobody has scored.
pub const DEFAULT_CREDIBILITY: f64 = 0.5;

/// Query parameters that only carry tracking information.
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid", "ref", "ref_src"];

/// Research tier levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    /// Fast, cheap research strategy
    #[serde(rename = "tier1")]
    TierOne,
    /// Thorough, expensive research strategy
    #[serde(rename = "tier2")]
    TierTwo,
}

impl Tier {
    /// Short machine-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::TierOne => "tier1",
            Self::TierTwo => "tier2",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TierOne => write!(f, "Tier 1"),
            Self::TierTwo => write!(f, "Tier 2"),
        }
    }
}

fn is_tracking_param(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("utm_") || TRACKING_PARAMS.contains(&name.as_str())
}

/// Canonical form of a source URL, used as its identity.
///
/// Scheme, host and path are lower-cased, trailing slashes are stripped,
/// tracking query parameters and the fragment are dropped. The remaining
/// query parameters keep their original order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl {
    value: String,
    domain: Option<String>,
}

impl NormalizedUrl {
    /// Normalize a raw URL. URLs without a scheme are read as `https`.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_source("source url is empty"));
        }

        let parsed = Url::parse(trimmed)
            .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
            .map_err(|e| Error::invalid_source(format!("unparseable url '{}': {}", trimmed, e)))?;

        let host = parsed.host_str().map(|h| h.to_ascii_lowercase());

        let mut value = parsed.scheme().to_ascii_lowercase();
        value.push(':');
        if let Some(host) = &host {
            value.push_str("//");
            value.push_str(host);
            if let Some(port) = parsed.port() {
                value.push_str(&format!(":{}", port));
            }
        }

        let path = parsed.path().to_lowercase();
        value.push_str(path.trim_end_matches('/'));

        let kept: Vec<(String, String)> = parsed
            .query_pairs()
            .filter(|(name, _)| !is_tracking_param(name))
            .map(|(name, val)| (name.into_owned(), val.into_owned()))
            .collect();
        if !kept.is_empty() {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(kept)
                .finish();
            value.push('?');
            value.push_str(&query);
        }

        let domain = host.map(|h| h.strip_prefix("www.").map(str::to_string).unwrap_or(h));

        Ok(Self { value, domain })
    }

    /// The normalized URL text.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Host without a leading `www.`, if the URL has one.
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }
}

impl std::fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl TryFrom<String> for NormalizedUrl {
    type Error = Error;

    fn try_from(raw: String) -> Result<Self> {
        Self::parse(&raw)
    }
}

impl From<NormalizedUrl> for String {
    fn from(url: NormalizedUrl) -> Self {
        url.value
    }
}

impl Serialize for NormalizedUrl {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.value)
    }
}

impl<'de> Deserialize<'de> for NormalizedUrl {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A single referenced piece of evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SourceRecord", into = "SourceRecord")]
pub struct Source {
    url: String,
    key: NormalizedUrl,
    /// Page or document title
    pub title: String,
    /// Author name
    pub author: Option<String>,
    /// Publisher or site name
    pub publisher: Option<String>,
    /// Date the source was accessed
    pub accessed_date: Option<NaiveDate>,
    /// Publication year, when the collaborator knows it
    pub published_year: Option<i32>,
    /// Source credibility (0.0-1.0)
    pub credibility_score: f64,
    /// Tier that first contributed this source
    pub origin_tier: Tier,
}

impl Source {
    /// Create a source. An empty title becomes `"Untitled"`.
    pub fn new(url: &str, title: impl Into<String>, origin_tier: Tier) -> Result<Self> {
        let key = NormalizedUrl::parse(url)?;
        let title = title.into();
        let title = if title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            title.trim().to_string()
        };

        Ok(Self {
            url: url.trim().to_string(),
            key,
            title,
            author: None,
            publisher: None,
            accessed_date: None,
            published_year: None,
            credibility_score: DEFAULT_CREDIBILITY,
            origin_tier,
        })
    }

    /// Set the author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Set the publisher.
    pub fn with_publisher(mut self, publisher: impl Into<String>) -> Self {
        self.publisher = Some(publisher.into());
        self
    }

    /// Set the access date.
    pub fn with_accessed_date(mut self, date: NaiveDate) -> Self {
        self.accessed_date = Some(date);
        self
    }

    /// Set the publication year.
    pub fn with_published_year(mut self, year: i32) -> Self {
        self.published_year = Some(year);
        self
    }

    /// Set the credibility score, clamped into [0, 1].
    pub fn with_credibility(mut self, score: f64) -> Self {
        self.credibility_score = clamp_unit(score);
        self
    }

    /// The URL as reported by the collaborator.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The normalized identity of this source.
    pub fn key(&self) -> &NormalizedUrl {
        &self.key
    }

    /// Domain of the source, if its URL has a host.
    pub fn domain(&self) -> Option<&str> {
        self.key.domain()
    }
}

/// Clamp a measured 0..1 signal. NaN becomes 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Wire shape of a [`Source`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SourceRecord {
    url: String,
    #[serde(default, skip_deserializing)]
    normalized_url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    accessed_date: Option<NaiveDate>,
    #[serde(default)]
    published_year: Option<i32>,
    #[serde(default = "default_credibility")]
    credibility_score: f64,
    #[serde(default = "default_origin_tier")]
    origin_tier: Tier,
}

fn default_credibility() -> f64 {
    DEFAULT_CREDIBILITY
}

fn default_origin_tier() -> Tier {
    Tier::TierOne
}

impl TryFrom<SourceRecord> for Source {
    type Error = Error;

    fn try_from(record: SourceRecord) -> Result<Self> {
        let mut source = Source::new(&record.url, record.title, record.origin_tier)?
            .with_credibility(record.credibility_score);
        source.author = record.author;
        source.publisher = record.publisher;
        source.accessed_date = record.accessed_date;
        source.published_year = record.published_year;
        Ok(source)
    }
}

impl From<Source> for SourceRecord {
    fn from(source: Source) -> Self {
        Self {
            normalized_url: source.key.to_string(),
            url: source.url,
            title: source.title,
            author: source.author,
            publisher: source.publisher,
            accessed_date: source.accessed_date,
            published_year: source.published_year,
            credibility_score: source.credibility_score,
            origin_tier: source.origin_tier,
        }
    }
}
