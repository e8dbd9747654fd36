//! Citation formatting in MLA and APA styles.
//!
//! Formatting is pure string construction: the same source, style and
//! access-date flag always produce the same text.
//!
//! The model has no reliable publication date for most web sources. When a
//! source carries no `published_year`, APA citations fall back to the access
//! year and the citation is marked `year_is_approximate`; callers should
//! present that year as an approximation, not a publication date.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::source::{NormalizedUrl, Source};

/// Bibliographic style.
///
/// Deserializes through [`FromStr`](std::str::FromStr), so `"mla"` and
/// `"MLA"` both parse and an unknown name is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CitationStyle {
    #[default]
    #[serde(rename = "MLA")]
    Mla,
    #[serde(rename = "APA")]
    Apa,
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mla => write!(f, "MLA"),
            Self::Apa => write!(f, "APA"),
        }
    }
}

impl std::str::FromStr for CitationStyle {
    type Err = Error;

    /// Unknown styles are a configuration error, never a silent default.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MLA" => Ok(Self::Mla),
            "APA" => Ok(Self::Apa),
            other => Err(Error::config(format!("unknown citation style '{}'", other))),
        }
    }
}

impl TryFrom<String> for CitationStyle {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Rendered bibliographic text for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub style: CitationStyle,
    pub text: String,
    /// Identity of the source this was derived from
    pub source_ref: NormalizedUrl,
    /// The APA year came from the access date, not a publication date
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub year_is_approximate: bool,
}

/// MLA month abbreviations (May, June and July are not abbreviated).
fn mla_month(month: u32) -> &'static str {
    match month {
        1 => "Jan.",
        2 => "Feb.",
        3 => "Mar.",
        4 => "Apr.",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "Aug.",
        9 => "Sept.",
        10 => "Oct.",
        11 => "Nov.",
        _ => "Dec.",
    }
}

/// Format a date MLA style, e.g. `23 Dec. 2025`.
pub fn format_mla_date(date: NaiveDate) -> String {
    format!("{} {} {}", date.day(), mla_month(date.month()), date.year())
}

/// Append a sentence-ending period unless the segment already ends in punctuation.
fn sentence(segment: &str) -> String {
    let trimmed = segment.trim();
    if trimmed.ends_with(['.', '?', '!']) {
        trimmed.to_string()
    } else {
        format!("{}.", trimmed)
    }
}

fn format_mla(source: &Source, include_access_date: bool) -> String {
    let mut parts = Vec::new();

    if let Some(author) = &source.author {
        parts.push(sentence(author));
    }

    parts.push(format!("\"{}\"", sentence(&source.title)));

    if let Some(publisher) = &source.publisher {
        parts.push(format!("{},", publisher.trim()));
    }

    parts.push(format!("{}.", source.url()));

    if include_access_date {
        if let Some(date) = source.accessed_date {
            parts.push(format!("Accessed {}.", format_mla_date(date)));
        }
    }

    parts.join(" ")
}

fn format_apa(source: &Source) -> (String, bool) {
    let mut parts = Vec::new();

    if let Some(author) = &source.author {
        parts.push(sentence(author));
    }

    let (year, approximate) = match (source.published_year, source.accessed_date) {
        (Some(year), _) => (year.to_string(), false),
        (None, Some(accessed)) => (accessed.year().to_string(), true),
        (None, None) => ("n.d.".to_string(), false),
    };
    parts.push(format!("({}).", year));

    parts.push(sentence(&source.title));

    if let Some(publisher) = &source.publisher {
        parts.push(sentence(publisher));
    }

    parts.push(source.url().to_string());

    (parts.join(" "), approximate)
}

/// Format one source in the given style.
pub fn format(source: &Source, style: CitationStyle, include_access_date: bool) -> Citation {
    let (text, year_is_approximate) = match style {
        CitationStyle::Mla => (format_mla(source, include_access_date), false),
        CitationStyle::Apa => format_apa(source),
    };

    Citation {
        style,
        text,
        source_ref: source.key().clone(),
        year_is_approximate,
    }
}

/// Formatter bound to one style and access-date preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationFormatter {
    pub style: CitationStyle,
    pub include_access_dates: bool,
}

impl Default for CitationFormatter {
    fn default() -> Self {
        Self::new(CitationStyle::Mla, true)
    }
}

impl CitationFormatter {
    pub fn new(style: CitationStyle, include_access_dates: bool) -> Self {
        Self {
            style,
            include_access_dates,
        }
    }

    /// Build a formatter from a style name; unknown names are rejected.
    pub fn from_style_name(style: &str, include_access_dates: bool) -> Result<Self> {
        Ok(Self::new(style.parse()?, include_access_dates))
    }

    /// Format a single source.
    pub fn format(&self, source: &Source) -> Citation {
        format(source, self.style, self.include_access_dates)
    }

    /// Format sources in order, one citation per source.
    pub fn format_all(&self, sources: &[Source]) -> Vec<Citation> {
        sources.iter().map(|s| self.format(s)).collect()
    }
}
