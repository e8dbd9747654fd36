//! # research-core
//!
//! Tiered research orchestration: run a fast research tier, score what it
//! found, escalate to a thorough tier when the answer is too thin, and merge
//! everything into one deduplicated, cited result.
//!
//! ## Core Components
//!
//! - **Quality**: scores a tier attempt from source count, domain diversity and confidence
//! - **Escalation**: decides whether the thorough tier should run
//! - **Merge**: deduplicates sources by normalized URL and builds the result
//! - **Citation**: MLA and APA formatting
//! - **Tier**: the contract tier collaborators implement
//! - **Orchestrator**: drives a request end to end
//!
//! The engine never searches, fetches or calls a model itself; tier
//! collaborators do, behind [`TierResearcher`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use research_core::{CitationStyle, RequestedDepth, ResearchConfig, ResearchOrchestrator};
//!
//! let orchestrator = ResearchOrchestrator::new(ResearchConfig::default(), quick, deep)?;
//! let result = orchestrator
//!     .research("Battle of Waterloo", RequestedDepth::Auto, CitationStyle::Mla, true)
//!     .await?;
//!
//! for citation in result.citations() {
//!     println!("{}", citation.text);
//! }
//! ```

pub mod attempt;
pub mod citation;
pub mod config;
pub mod error;
pub mod escalation;
pub mod merge;
pub mod orchestrator;
pub mod output;
pub mod quality;
pub mod query;
pub mod repository;
pub mod result;
pub mod source;
pub mod tier;
pub mod validation;

#[cfg(test)]
mod proptest;

// Re-exports for convenience
pub use attempt::{detect_gaps, ResearchAttempt};
pub use citation::{Citation, CitationFormatter, CitationStyle};
pub use config::{ResearchConfig, ResearchConfigBuilder};
pub use error::{Error, Result, Stage};
pub use escalation::{decide, EscalationDecision, EscalationPolicy, EscalationVerdict};
pub use merge::ResultMerger;
pub use orchestrator::{HealthStatus, ResearchOrchestrator};
pub use output::{render, OutputFormat};
pub use quality::{QualityAssessor, QualitySignals, QualityWeights};
pub use query::{HistoricalPeriod, QueryId, RequestedDepth, ResearchQuery};
pub use repository::{InMemoryRepository, RepositoryStats, ResearchRepository, ResultKey};
pub use result::{Advisory, AdvisoryKind, ResearchResult, TierUsed};
pub use source::{NormalizedUrl, Source, Tier};
pub use tier::{SearchDepth, TierError, TierOptions, TierResearcher, UnavailableTier};
pub use validation::{assess_credibility, validate_historical_date};
