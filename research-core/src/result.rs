//! The final answer returned to the caller.

use serde::{Deserialize, Serialize};

use crate::citation::Citation;
use crate::source::{Source, Tier};

/// Which tier(s) contributed to a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierUsed {
    #[serde(rename = "tier1")]
    TierOne,
    #[serde(rename = "tier2")]
    TierTwo,
    #[serde(rename = "both")]
    Both,
}

impl From<Tier> for TierUsed {
    fn from(tier: Tier) -> Self {
        match tier {
            Tier::TierOne => Self::TierOne,
            Tier::TierTwo => Self::TierTwo,
        }
    }
}

impl std::fmt::Display for TierUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TierOne => write!(f, "tier1"),
            Self::TierTwo => write!(f, "tier2"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Kind of degraded path a result went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    /// Tier 2 was requested but is not configured
    TierUnavailable,
    /// Tier 1 failed; its attempt was replaced by an empty one
    TierOneFailed,
    /// Tier 2 failed during escalation; the result holds tier 1 data only
    TierTwoFailed,
    /// Tier 1 fell short but tier 2 could not be used to escalate
    EscalationSkipped,
    /// Some APA years come from access dates, not publication dates
    ApproximateCitationYear,
}

impl AdvisoryKind {
    /// Whether the result came from a narrower path than the request asked
    /// for, because a tier failed or was missing.
    pub fn is_degradation(&self) -> bool {
        !matches!(self, Self::ApproximateCitationYear)
    }
}

impl std::fmt::Display for AdvisoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TierUnavailable => write!(f, "tier_unavailable"),
            Self::TierOneFailed => write!(f, "tier_one_failed"),
            Self::TierTwoFailed => write!(f, "tier_two_failed"),
            Self::EscalationSkipped => write!(f, "escalation_skipped"),
            Self::ApproximateCitationYear => write!(f, "approximate_citation_year"),
        }
    }
}

/// A non-fatal note attached to an otherwise successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl Advisory {
    pub fn new(kind: AdvisoryKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Merged, cited research findings.
///
/// Built only by [`crate::merge::ResultMerger`], which keeps one citation per
/// source (same order) and derives the confidence from the merged attempts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchResult {
    pub(crate) findings_text: String,
    pub(crate) sources: Vec<Source>,
    pub(crate) citations: Vec<Citation>,
    pub(crate) tier_used: TierUsed,
    pub(crate) overall_confidence: f64,
    pub(crate) total_elapsed_ms: u64,
    pub(crate) gaps: Vec<String>,
    pub(crate) advisories: Vec<Advisory>,
}

impl ResearchResult {
    pub fn findings_text(&self) -> &str {
        &self.findings_text
    }

    /// Deduplicated sources.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    /// Citations, one per source in the same order.
    pub fn citations(&self) -> &[Citation] {
        &self.citations
    }

    pub fn tier_used(&self) -> TierUsed {
        self.tier_used
    }

    pub fn overall_confidence(&self) -> f64 {
        self.overall_confidence
    }

    pub fn total_elapsed_ms(&self) -> u64 {
        self.total_elapsed_ms
    }

    /// Information gaps from all contributing attempts.
    pub fn gaps(&self) -> &[String] {
        &self.gaps
    }

    pub fn advisories(&self) -> &[Advisory] {
        &self.advisories
    }

    /// Number of sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Confidence at or above 0.8.
    pub fn is_high_confidence(&self) -> bool {
        self.overall_confidence >= 0.8
    }

    /// Confidence below 0.6.
    pub fn is_low_confidence(&self) -> bool {
        self.overall_confidence < 0.6
    }

    /// Whether an advisory of the given kind is attached.
    pub fn has_advisory(&self, kind: AdvisoryKind) -> bool {
        self.advisories.iter().any(|a| a.kind == kind)
    }

    /// Tier 2 was requested but unavailable, so the answer is tier 1 only.
    pub fn tier_unavailable(&self) -> bool {
        self.has_advisory(AdvisoryKind::TierUnavailable)
    }

    /// Whether any advisory marks this result as degraded.
    pub fn is_degraded(&self) -> bool {
        self.advisories.iter().any(|a| a.kind.is_degradation())
    }

    /// Attach an advisory, ignoring exact duplicates.
    pub(crate) fn push_advisory(&mut self, advisory: Advisory) {
        if !self.advisories.contains(&advisory) {
            self.advisories.push(advisory);
        }
    }
}
