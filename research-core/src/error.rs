//! Error types for research-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::source::Tier;
use crate::tier::TierError;

/// Result type alias using research-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Config or query validation at request start
    Configuration,
    /// Tier 1 execution
    TierOne,
    /// Tier 2 execution
    TierTwo,
    /// Merging attempts into a result
    Merge,
    /// Rendering the result for output
    Format,
}

impl Stage {
    /// The execution stage belonging to a tier.
    pub fn for_tier(tier: Tier) -> Self {
        match tier {
            Tier::TierOne => Self::TierOne,
            Tier::TierTwo => Self::TierTwo,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::TierOne => write!(f, "tier 1 execution"),
            Self::TierTwo => write!(f, "tier 2 execution"),
            Self::Merge => write!(f, "merge"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// Errors that can occur while answering a research request.
#[derive(Error, Debug)]
pub enum Error {
    /// A tier was requested but its collaborator is not configured
    #[error("{tier} unavailable: {reason}")]
    TierUnavailable { tier: Tier, reason: String },

    /// A tier collaborator failed and there was no attempt to fall back on
    #[error("{tier} failed during {stage}: {message}")]
    TierExecution {
        tier: Tier,
        stage: Stage,
        message: String,
        #[source]
        source: Option<TierError>,
    },

    /// Configuration or request validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A source record could not be turned into a citable source
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid source error.
    pub fn invalid_source(message: impl Into<String>) -> Self {
        Self::InvalidSource(message.into())
    }

    /// Create a tier unavailable error.
    pub fn tier_unavailable(tier: Tier, reason: impl Into<String>) -> Self {
        Self::TierUnavailable {
            tier,
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator failure as a fatal tier execution error.
    pub fn tier_execution(tier: Tier, source: TierError) -> Self {
        Self::TierExecution {
            tier,
            stage: Stage::for_tier(tier),
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// The stage this error was raised in.
    pub fn stage(&self) -> Stage {
        match self {
            Self::TierUnavailable { tier, .. } => Stage::for_tier(*tier),
            Self::TierExecution { stage, .. } => *stage,
            Self::Config(_) => Stage::Configuration,
            Self::InvalidSource(_) => Stage::Merge,
            Self::Serialization(_) => Stage::Format,
        }
    }

    /// The tier involved, if any.
    pub fn tier(&self) -> Option<Tier> {
        match self {
            Self::TierUnavailable { tier, .. } | Self::TierExecution { tier, .. } => Some(*tier),
            _ => None,
        }
    }
}
