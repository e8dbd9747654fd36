//! Research requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::citation::CitationStyle;
use crate::config::ResearchConfig;
use crate::error::{Error, Result};

/// Largest per-request source cap a caller may ask for.
pub const MAX_REQUESTED_SOURCES: usize = 50;

/// Unique identifier for a research request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryId(pub Uuid);

impl QueryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QueryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QueryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User preference for how deep to research.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestedDepth {
    /// Tier 1 only
    Basic,
    /// Tier 1, escalating to Tier 2 when the result looks weak
    #[default]
    Auto,
    /// Tier 2 if available
    Deep,
}

impl std::fmt::Display for RequestedDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Auto => write!(f, "auto"),
            Self::Deep => write!(f, "deep"),
        }
    }
}

impl std::str::FromStr for RequestedDepth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "auto" => Ok(Self::Auto),
            "deep" => Ok(Self::Deep),
            other => Err(Error::config(format!("unknown research depth '{}'", other))),
        }
    }
}

/// A historical time span the query is constrained to. BCE years are negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalPeriod {
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Name of the era (e.g. "Napoleonic Wars")
    pub era_name: Option<String>,
    /// Century (e.g. "19th century")
    pub century: Option<String>,
}

impl HistoricalPeriod {
    /// A named era with no year bounds.
    pub fn era(name: impl Into<String>) -> Self {
        Self {
            era_name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A span of years.
    pub fn years(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year: Some(start_year),
            end_year: Some(end_year),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        if let (Some(start), Some(end)) = (self.start_year, self.end_year) {
            if start > end {
                return Err(Error::config(format!(
                    "historical period starts after it ends ({} > {})",
                    start, end
                )));
            }
        }
        Ok(())
    }
}

/// A user's research request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchQuery {
    #[serde(default)]
    pub id: QueryId,
    /// Research question or topic
    pub query: String,
    #[serde(default)]
    pub depth: RequestedDepth,
    /// Citation style; unset means the engine's configured style
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation_format: Option<CitationStyle>,
    /// Access dates in citations; unset means the configured default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_access_dates: Option<bool>,
    #[serde(default)]
    pub historical_period: Option<HistoricalPeriod>,
    /// Per-request cap on sources per tier
    #[serde(default)]
    pub max_sources: Option<usize>,
}

impl ResearchQuery {
    /// Create a query with default preferences.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: QueryId::new(),
            query: query.into(),
            depth: RequestedDepth::Auto,
            citation_format: None,
            include_access_dates: None,
            historical_period: None,
            max_sources: None,
        }
    }

    /// Fill unset citation preferences from the config.
    pub fn with_defaults_from(mut self, config: &ResearchConfig) -> Self {
        let (style, include_access_dates) = self.citation_preferences(config);
        self.citation_format = Some(style);
        self.include_access_dates = Some(include_access_dates);
        self
    }

    /// Effective citation style and access-date flag under `config`.
    pub fn citation_preferences(&self, config: &ResearchConfig) -> (CitationStyle, bool) {
        (
            self.citation_format.unwrap_or(config.citation_format),
            self.include_access_dates.unwrap_or(config.include_access_dates),
        )
    }

    /// Set the requested depth.
    pub fn with_depth(mut self, depth: RequestedDepth) -> Self {
        self.depth = depth;
        self
    }

    /// Set the citation style.
    pub fn with_citation_format(mut self, style: CitationStyle) -> Self {
        self.citation_format = Some(style);
        self
    }

    /// Set whether citations include access dates.
    pub fn with_access_dates(mut self, include: bool) -> Self {
        self.include_access_dates = Some(include);
        self
    }

    /// Constrain the query to a historical period.
    pub fn with_period(mut self, period: HistoricalPeriod) -> Self {
        self.historical_period = Some(period);
        self
    }

    /// Cap the sources each tier may return.
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = Some(max_sources);
        self
    }

    /// Reject malformed requests before any tier runs.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(Error::config("query must not be empty"));
        }
        if let Some(max) = self.max_sources {
            if max == 0 || max > MAX_REQUESTED_SOURCES {
                return Err(Error::config(format!(
                    "max_sources must be within 1..={} (got {})",
                    MAX_REQUESTED_SOURCES, max
                )));
            }
        }
        if let Some(period) = &self.historical_period {
            period.validate()?;
        }
        Ok(())
    }
}
