//! Engine configuration.
//!
//! Configuration is validated, never clamped: a threshold of 1.5 is an
//! error, not 1.0. Only measured signals (confidence, credibility) are
//! clamped into range.

use serde::{Deserialize, Serialize};

use crate::citation::CitationStyle;
use crate::error::{Error, Result};
use crate::escalation::DEFAULT_ESCALATION_THRESHOLD;
use crate::output::OutputFormat;
use crate::quality::DEFAULT_MIN_SOURCES_TARGET;
use crate::source::Tier;
use crate::tier::TierOptions;

/// Configuration for the research orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    /// Quality below which tier 1 output triggers escalation (default: 0.7)
    pub escalation_threshold: f64,
    /// Sources needed for a full source-count signal (default: 3)
    pub min_sources_target: usize,
    /// Whether `Auto` requests may escalate to tier 2
    pub auto_escalation_enabled: bool,
    /// Default citation style for new queries
    pub citation_format: CitationStyle,
    /// Whether citations include access dates by default
    pub include_access_dates: bool,
    /// Default output rendering
    pub output_format: OutputFormat,
    /// Options handed to the fast tier
    pub tier1: TierOptions,
    /// Options handed to the thorough tier
    pub tier2: TierOptions,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            min_sources_target: DEFAULT_MIN_SOURCES_TARGET,
            auto_escalation_enabled: true,
            citation_format: CitationStyle::Mla,
            include_access_dates: true,
            output_format: OutputFormat::Json,
            tier1: TierOptions::tier_one_defaults(),
            tier2: TierOptions::tier_two_defaults(),
        }
    }
}

impl ResearchConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> ResearchConfigBuilder {
        ResearchConfigBuilder::new()
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    ///
    /// Malformed JSON and unknown enum names are configuration errors.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Options for the given tier.
    pub fn tier_options(&self, tier: Tier) -> &TierOptions {
        match tier {
            Tier::TierOne => &self.tier1,
            Tier::TierTwo => &self.tier2,
        }
    }

    /// Reject malformed numeric configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.escalation_threshold) {
            // NaN fails the range check too
            return Err(Error::config(format!(
                "escalation_threshold must be within [0, 1] (got {})",
                self.escalation_threshold
            )));
        }
        if self.min_sources_target == 0 {
            return Err(Error::config("min_sources_target must be at least 1"));
        }
        for tier in [Tier::TierOne, Tier::TierTwo] {
            let options = self.tier_options(tier);
            if options.max_sources == 0 {
                return Err(Error::config(format!(
                    "{} max_sources must be at least 1",
                    tier.label()
                )));
            }
            if options.timeout_ms == 0 {
                return Err(Error::config(format!(
                    "{} timeout_ms must be positive",
                    tier.label()
                )));
            }
        }
        Ok(())
    }
}

/// Builder for [`ResearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct ResearchConfigBuilder {
    config: ResearchConfig,
}

impl ResearchConfigBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the escalation threshold.
    pub fn escalation_threshold(mut self, threshold: f64) -> Self {
        self.config.escalation_threshold = threshold;
        self
    }

    /// Set the minimum source target.
    pub fn min_sources_target(mut self, target: usize) -> Self {
        self.config.min_sources_target = target;
        self
    }

    /// Enable or disable automatic escalation.
    pub fn auto_escalation(mut self, enabled: bool) -> Self {
        self.config.auto_escalation_enabled = enabled;
        self
    }

    pub fn citation_format(mut self, style: CitationStyle) -> Self {
        self.config.citation_format = style;
        self
    }

    pub fn include_access_dates(mut self, include: bool) -> Self {
        self.config.include_access_dates = include;
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// Replace the tier 1 options.
    pub fn tier1(mut self, options: TierOptions) -> Self {
        self.config.tier1 = options;
        self
    }

    /// Replace the tier 2 options.
    pub fn tier2(mut self, options: TierOptions) -> Self {
        self.config.tier2 = options;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ResearchConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
