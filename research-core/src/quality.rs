//! Quality assessment of a single research attempt.
//!
//! Quality is a weighted combination of three 0..1 signals:
//! - **source count**: saturates once the attempt reaches the minimum source target
//! - **diversity**: fraction of sources coming from distinct domains
//! - **confidence**: the tier's own confidence
//!
//! With no sources both evidence signals are zero, so self-reported
//! confidence alone can contribute at most its weight (0.4) to the score.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::attempt::ResearchAttempt;
use crate::config::ResearchConfig;
use crate::source::{clamp_unit, Source};

/// Default number of sources an attempt needs for a full source-count signal.
pub const DEFAULT_MIN_SOURCES_TARGET: usize = 3;

/// Weights of the three quality signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityWeights {
    pub source_count: f64,
    pub diversity: f64,
    pub confidence: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            source_count: 0.4,
            diversity: 0.2,
            confidence: 0.4,
        }
    }
}

/// Normalized signals extracted from an attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualitySignals {
    /// `min(n, target) / target`
    pub source_count: f64,
    /// `distinct_domains / max(n, 1)`
    pub diversity: f64,
    /// Clamped self-reported confidence
    pub confidence: f64,
}

impl QualitySignals {
    /// Weighted score clamped into [0, 1].
    pub fn score(&self, weights: &QualityWeights) -> f64 {
        clamp_unit(
            weights.source_count * self.source_count
                + weights.diversity * self.diversity
                + weights.confidence * self.confidence,
        )
    }
}

/// Count distinct domains among sources.
///
/// Sources without a host count by their normalized URL.
pub fn distinct_domains(sources: &[Source]) -> usize {
    sources
        .iter()
        .map(|s| s.domain().unwrap_or_else(|| s.key().as_str()))
        .collect::<HashSet<_>>()
        .len()
}

/// Scores research attempts on a 0..1 scale.
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    min_sources_target: usize,
    weights: QualityWeights,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SOURCES_TARGET)
    }
}

impl QualityAssessor {
    /// Create an assessor with the given source target and default weights.
    pub fn new(min_sources_target: usize) -> Self {
        Self {
            min_sources_target: min_sources_target.max(1),
            weights: QualityWeights::default(),
        }
    }

    /// Create an assessor from the research config.
    pub fn from_config(config: &ResearchConfig) -> Self {
        Self::new(config.min_sources_target)
    }

    /// Override the signal weights.
    pub fn with_weights(mut self, weights: QualityWeights) -> Self {
        self.weights = weights;
        self
    }

    /// The source target in use.
    pub fn min_sources_target(&self) -> usize {
        self.min_sources_target
    }

    /// Extract the normalized signals for an attempt.
    pub fn signals(&self, attempt: &ResearchAttempt) -> QualitySignals {
        let count = attempt.sources.len();
        let target = self.min_sources_target;

        QualitySignals {
            source_count: count.min(target) as f64 / target as f64,
            diversity: distinct_domains(&attempt.sources) as f64 / count.max(1) as f64,
            confidence: attempt.confidence(),
        }
    }

    /// Score an attempt. Pure and deterministic.
    pub fn assess(&self, attempt: &ResearchAttempt) -> f64 {
        self.signals(attempt).score(&self.weights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Tier;

    fn attempt_with(urls: &[&str], confidence: f64) -> ResearchAttempt {
        let sources = urls
            .iter()
            .map(|u| Source::new(u, "T", Tier::TierOne).unwrap())
            .collect();
        ResearchAttempt::new(Tier::TierOne, "findings")
            .with_sources(sources)
            .with_confidence(confidence)
    }

    #[test]
    fn test_empty_attempt_capped_by_confidence_weight() {
        let assessor = QualityAssessor::default();
        let attempt = attempt_with(&[], 1.0);

        let signals = assessor.signals(&attempt);
        assert_eq!(signals.source_count, 0.0);
        assert_eq!(signals.diversity, 0.0);
        assert!((assessor.assess(&attempt) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_full_marks() {
        let assessor = QualityAssessor::default();
        let attempt = attempt_with(
            &["https://a.com/1", "https://b.org/2", "https://c.edu/3"],
            1.0,
        );
        assert!((assessor.assess(&attempt) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_count_saturates() {
        let assessor = QualityAssessor::default();
        let attempt = attempt_with(
            &[
                "https://a.com/1",
                "https://b.com/2",
                "https://c.com/3",
                "https://d.com/4",
                "https://e.com/5",
            ],
            0.5,
        );
        assert_eq!(assessor.signals(&attempt).source_count, 1.0);
    }

    #[test]
    fn test_single_domain_penalized() {
        let assessor = QualityAssessor::default();
        let diverse = attempt_with(
            &["https://a.com/1", "https://b.com/2", "https://c.com/3"],
            0.8,
        );
        let same_site = attempt_with(
            &[
                "https://a.com/1",
                "https://www.a.com/2",
                "https://a.com/3",
            ],
            0.8,
        );

        let signals = assessor.signals(&same_site);
        assert!((signals.diversity - 1.0 / 3.0).abs() < 1e-9);
        assert!(assessor.assess(&same_site) < assessor.assess(&diverse));
    }

    #[test]
    fn test_two_sources_half_confidence() {
        let assessor = QualityAssessor::default();
        let attempt = attempt_with(&["https://a.com/1", "https://b.com/2"], 0.5);
        // 0.4 * 2/3 + 0.2 * 1.0 + 0.4 * 0.5
        let expected = 0.4 * (2.0 / 3.0) + 0.2 + 0.2;
        assert!((assessor.assess(&attempt) - expected).abs() < 1e-9);
        assert!(assessor.assess(&attempt) < 0.7);
    }

    #[test]
    fn test_out_of_range_confidence_is_clamped() {
        let assessor = QualityAssessor::default();
        let attempt = attempt_with(&["https://a.com/1"], 7.5);
        assert_eq!(assessor.signals(&attempt).confidence, 1.0);
        assert!(assessor.assess(&attempt) <= 1.0);

        let attempt = attempt_with(&["https://a.com/1"], f64::NAN);
        assert_eq!(assessor.signals(&attempt).confidence, 0.0);
    }

    #[test]
    fn test_zero_target_treated_as_one() {
        let assessor = QualityAssessor::new(0);
        assert_eq!(assessor.min_sources_target(), 1);
    }
}
