//! Raw output of one tier invocation.

use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::source::{clamp_unit, Source, Tier};

/// Gap recorded on an attempt whose tier failed outright.
pub const FAILED_ATTEMPT_GAP: &str = "Complete research failure - all information unavailable";

/// Phrases in findings text that signal the tier was unsure.
const UNCERTAINTY_PHRASES: &[&str] = &[
    "unclear",
    "uncertain",
    "unknown",
    "not enough information",
    "limited sources",
    "contradictory",
];

static UNCERTAINTY_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(
        UNCERTAINTY_PHRASES
            .iter()
            .map(|phrase| format!("(?i){}", phrase.replace(' ', r"\s+"))),
    )
    .expect("invalid regex")
});

/// Scan findings text for uncertainty phrases.
///
/// Returns one `"Uncertainty detected: <phrase>"` entry per phrase found, in
/// a fixed phrase order.
pub fn detect_gaps(findings: &str) -> Vec<String> {
    UNCERTAINTY_PATTERNS
        .matches(findings)
        .iter()
        .map(|idx| format!("Uncertainty detected: {}", UNCERTAINTY_PHRASES[idx]))
        .collect()
}

/// The output of one tier's execution for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAttempt {
    /// Tier that produced this attempt
    pub tier: Tier,
    /// Findings text
    pub findings_text: String,
    /// Sources in discovery order
    #[serde(default)]
    pub sources: Vec<Source>,
    /// Confidence reported by the tier itself (0.0-1.0)
    pub self_reported_confidence: f64,
    /// Wall time spent by the tier
    #[serde(default)]
    pub elapsed_ms: u64,
    /// Information gaps identified in the findings
    #[serde(default)]
    pub gaps: Vec<String>,
}

impl ResearchAttempt {
    /// Create an attempt with no sources and zero confidence.
    pub fn new(tier: Tier, findings_text: impl Into<String>) -> Self {
        Self {
            tier,
            findings_text: findings_text.into(),
            sources: Vec::new(),
            self_reported_confidence: 0.0,
            elapsed_ms: 0,
            gaps: Vec::new(),
        }
    }

    /// The stand-in for a tier that failed: no sources, zero confidence.
    pub fn failed(tier: Tier, reason: impl std::fmt::Display, elapsed_ms: u64) -> Self {
        Self {
            tier,
            findings_text: format!("Research failed: {}", reason),
            sources: Vec::new(),
            self_reported_confidence: 0.0,
            elapsed_ms,
            gaps: vec![FAILED_ATTEMPT_GAP.to_string()],
        }
    }

    /// Set the sources.
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Append a source.
    pub fn with_source(mut self, source: Source) -> Self {
        self.sources.push(source);
        self
    }

    /// Set the self-reported confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.self_reported_confidence = confidence;
        self
    }

    /// Set the elapsed time.
    pub fn with_elapsed_ms(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    /// Set the gaps explicitly.
    pub fn with_gaps(mut self, gaps: Vec<String>) -> Self {
        self.gaps = gaps;
        self
    }

    /// Add gaps detected in the findings text, skipping ones already present.
    pub fn with_detected_gaps(mut self) -> Self {
        for gap in detect_gaps(&self.findings_text) {
            if !self.gaps.contains(&gap) {
                self.gaps.push(gap);
            }
        }
        self
    }

    /// Self-reported confidence clamped into [0, 1].
    pub fn confidence(&self) -> f64 {
        clamp_unit(self.self_reported_confidence)
    }

    /// Whether the attempt found nothing.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Number of sources.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }
}
