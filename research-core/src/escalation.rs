//! Escalation policy: whether the thorough tier should run.
//!
//! The decision is a pure table over (quality, requested depth, tier 2
//! availability, threshold, auto-escalation flag). Rules are evaluated in
//! order and the first match wins:
//!
//! 1. `Basic` -> [`EscalationDecision::ForceTierOne`]
//! 2. `Deep` with tier 2 available -> [`EscalationDecision::ForceTierTwo`]
//! 3. `Deep` without tier 2 -> [`EscalationDecision::ForceTierOne`]
//! 4. `Auto` with auto-escalation off or tier 2 unavailable -> [`EscalationDecision::UseTierOneOnly`]
//! 5. `Auto` with quality below threshold -> [`EscalationDecision::Escalate`]
//! 6. otherwise -> [`EscalationDecision::UseTierOneOnly`]

use serde::{Deserialize, Serialize};

use crate::attempt::ResearchAttempt;
use crate::config::ResearchConfig;
use crate::query::RequestedDepth;

/// Default quality below which tier 1 output is considered insufficient.
pub const DEFAULT_ESCALATION_THRESHOLD: f64 = 0.7;

/// What the orchestrator should do about tier 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationDecision {
    /// Tier 1 output is good enough (or tier 2 cannot be used)
    UseTierOneOnly,
    /// Tier 1 output is insufficient; run tier 2 and merge
    Escalate,
    /// The user asked for tier 2 directly
    ForceTierTwo,
    /// The user asked for tier 1 only, or tier 2 was requested but is unavailable
    ForceTierOne,
}

impl EscalationDecision {
    /// Whether tier 2 will run under this decision.
    pub fn runs_tier_two(&self) -> bool {
        matches!(self, Self::Escalate | Self::ForceTierTwo)
    }

    /// Whether the decision overrides the quality assessment.
    pub fn is_forced(&self) -> bool {
        matches!(self, Self::ForceTierOne | Self::ForceTierTwo)
    }
}

impl std::fmt::Display for EscalationDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UseTierOneOnly => write!(f, "use_tier_one_only"),
            Self::Escalate => write!(f, "escalate"),
            Self::ForceTierTwo => write!(f, "force_tier_two"),
            Self::ForceTierOne => write!(f, "force_tier_one"),
        }
    }
}

/// Decide whether to escalate. Pure; no state between calls.
///
/// `quality` only matters for [`RequestedDepth::Auto`].
pub fn decide(
    quality: f64,
    requested_depth: RequestedDepth,
    tier2_available: bool,
    escalation_threshold: f64,
    auto_escalation_enabled: bool,
) -> EscalationDecision {
    match requested_depth {
        RequestedDepth::Basic => EscalationDecision::ForceTierOne,
        RequestedDepth::Deep if tier2_available => EscalationDecision::ForceTierTwo,
        RequestedDepth::Deep => EscalationDecision::ForceTierOne,
        RequestedDepth::Auto if !auto_escalation_enabled || !tier2_available => {
            EscalationDecision::UseTierOneOnly
        }
        RequestedDepth::Auto if quality < escalation_threshold => EscalationDecision::Escalate,
        RequestedDepth::Auto => EscalationDecision::UseTierOneOnly,
    }
}

/// A decision together with the shortfalls that explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationVerdict {
    /// The decision from the rule table
    pub decision: EscalationDecision,
    /// Quality of the tier 1 attempt
    pub quality: f64,
    /// Human-readable shortfalls found in the tier 1 attempt
    pub reasons: Vec<String>,
    /// Tier 1 fell short but tier 2 could not be used
    pub escalation_blocked: bool,
}

impl EscalationVerdict {
    /// Reasons joined for logging.
    pub fn reason(&self) -> String {
        if self.reasons.is_empty() {
            "Tier 1 results sufficient".to_string()
        } else {
            self.reasons.join("; ")
        }
    }
}

/// Escalation policy configured with a threshold and enable flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    pub escalation_threshold: f64,
    pub auto_escalation_enabled: bool,
    /// Used only to phrase the insufficient-sources reason
    pub min_sources_target: usize,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            escalation_threshold: DEFAULT_ESCALATION_THRESHOLD,
            auto_escalation_enabled: true,
            min_sources_target: crate::quality::DEFAULT_MIN_SOURCES_TARGET,
        }
    }
}

impl EscalationPolicy {
    /// Create a policy from the research config.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self {
            escalation_threshold: config.escalation_threshold,
            auto_escalation_enabled: config.auto_escalation_enabled,
            min_sources_target: config.min_sources_target,
        }
    }

    /// Apply the rule table.
    pub fn decide(
        &self,
        quality: f64,
        requested_depth: RequestedDepth,
        tier2_available: bool,
    ) -> EscalationDecision {
        decide(
            quality,
            requested_depth,
            tier2_available,
            self.escalation_threshold,
            self.auto_escalation_enabled,
        )
    }

    /// The decision for depths that never look at tier 1 quality.
    ///
    /// Returns `None` for [`RequestedDepth::Auto`], which needs a tier 1 attempt.
    pub fn preflight(
        &self,
        requested_depth: RequestedDepth,
        tier2_available: bool,
    ) -> Option<EscalationDecision> {
        match requested_depth {
            RequestedDepth::Auto => None,
            // quality is ignored outside Auto
            depth => Some(self.decide(0.0, depth, tier2_available)),
        }
    }

    /// Decide for a completed tier 1 attempt and explain the shortfalls.
    pub fn evaluate(
        &self,
        tier1: &ResearchAttempt,
        quality: f64,
        requested_depth: RequestedDepth,
        tier2_available: bool,
    ) -> EscalationVerdict {
        let decision = self.decide(quality, requested_depth, tier2_available);
        let mut reasons = Vec::new();

        if tier1.source_count() < self.min_sources_target {
            reasons.push(format!(
                "Insufficient sources ({} < {})",
                tier1.source_count(),
                self.min_sources_target
            ));
        }
        if tier1.confidence() < self.escalation_threshold {
            reasons.push(format!(
                "Low confidence ({:.2} < {:.2})",
                tier1.confidence(),
                self.escalation_threshold
            ));
        }
        if !tier1.gaps.is_empty() {
            reasons.push(format!(
                "Information gaps identified: {} items",
                tier1.gaps.len()
            ));
        }
        if quality < self.escalation_threshold {
            reasons.push(format!(
                "Overall quality score below threshold ({:.2} < {:.2})",
                quality, self.escalation_threshold
            ));
        }

        let escalation_blocked = requested_depth == RequestedDepth::Auto
            && self.auto_escalation_enabled
            && !tier2_available
            && quality < self.escalation_threshold;

        EscalationVerdict {
            decision,
            quality,
            reasons,
            escalation_blocked,
        }
    }
}
