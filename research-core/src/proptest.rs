//! Property-based tests for the scoring, escalation and merge invariants.
//!
//! - Quality is always within [0, 1], and an attempt with no sources can
//!   never score above the confidence weight
//! - The escalation table is total and threshold-monotone
//! - Merging never duplicates a normalized URL and keeps the best credibility
//! - URL normalization is idempotent

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::HashMap;

    use crate::attempt::ResearchAttempt;
    use crate::citation::{CitationFormatter, CitationStyle};
    use crate::escalation::{decide, EscalationDecision};
    use crate::merge::{ResultMerger, FINDINGS_SEPARATOR};
    use crate::quality::QualityAssessor;
    use crate::query::RequestedDepth;
    use crate::result::TierUsed;
    use crate::source::{NormalizedUrl, Source, Tier};

    fn url() -> impl Strategy<Value = String> {
        (
            "[a-z]{1,6}",
            prop_oneof![Just("com"), Just("org"), Just("edu")],
            "[a-z]{0,5}",
            prop_oneof![Just(""), Just("/"), Just("?utm_source=x"), Just("#top")],
        )
            .prop_map(|(host, tld, path, suffix)| {
                format!("https://{}.{}/{}{}", host, tld, path, suffix)
            })
    }

    fn source(tier: Tier) -> impl Strategy<Value = Source> {
        (url(), 0.0f64..=1.0).prop_map(move |(u, credibility)| {
            Source::new(&u, "Title", tier)
                .unwrap()
                .with_credibility(credibility)
        })
    }

    fn attempt(tier: Tier) -> impl Strategy<Value = ResearchAttempt> {
        (prop::collection::vec(source(tier), 0..12), -0.5f64..1.5).prop_map(
            move |(sources, confidence)| {
                ResearchAttempt::new(tier, "findings")
                    .with_sources(sources)
                    .with_confidence(confidence)
            },
        )
    }

    fn depth() -> impl Strategy<Value = RequestedDepth> {
        prop_oneof![
            Just(RequestedDepth::Basic),
            Just(RequestedDepth::Auto),
            Just(RequestedDepth::Deep),
        ]
    }

    // =========================================================================
    // Quality
    // =========================================================================

    proptest! {
        #[test]
        fn quality_is_in_unit_range(a in attempt(Tier::TierOne), target in 1usize..10) {
            let q = QualityAssessor::new(target).assess(&a);
            prop_assert!((0.0..=1.0).contains(&q), "quality {} out of range", q);
        }

        #[test]
        fn empty_attempt_capped_at_confidence_weight(confidence in -10.0f64..10.0) {
            let a = ResearchAttempt::new(Tier::TierOne, "nothing").with_confidence(confidence);
            let q = QualityAssessor::default().assess(&a);
            prop_assert!(q <= 0.4 + 1e-12, "empty attempt scored {}", q);
        }
    }

    // =========================================================================
    // Escalation
    // =========================================================================

    proptest! {
        #[test]
        fn basic_always_forces_tier_one(
            q in 0.0f64..=1.0,
            available: bool,
            threshold in 0.0f64..=1.0,
            enabled: bool,
        ) {
            prop_assert_eq!(
                decide(q, RequestedDepth::Basic, available, threshold, enabled),
                EscalationDecision::ForceTierOne
            );
        }

        #[test]
        fn deep_with_tier_two_forces_tier_two(
            q in 0.0f64..=1.0,
            threshold in 0.0f64..=1.0,
            enabled: bool,
        ) {
            prop_assert_eq!(
                decide(q, RequestedDepth::Deep, true, threshold, enabled),
                EscalationDecision::ForceTierTwo
            );
        }

        #[test]
        fn auto_escalates_iff_below_threshold(q in 0.0f64..=1.0, threshold in 0.0f64..=1.0) {
            let decision = decide(q, RequestedDepth::Auto, true, threshold, true);
            if q < threshold {
                prop_assert_eq!(decision, EscalationDecision::Escalate);
            } else {
                prop_assert_eq!(decision, EscalationDecision::UseTierOneOnly);
            }
        }

        #[test]
        fn tier_two_never_runs_when_unavailable(
            q in 0.0f64..=1.0,
            d in depth(),
            threshold in 0.0f64..=1.0,
            enabled: bool,
        ) {
            prop_assert!(!decide(q, d, false, threshold, enabled).runs_tier_two());
        }
    }

    // =========================================================================
    // Merge
    // =========================================================================

    proptest! {
        #[test]
        fn merge_dedups_and_keeps_best_credibility(
            t1 in attempt(Tier::TierOne),
            t2 in attempt(Tier::TierTwo),
        ) {
            let mut best: HashMap<NormalizedUrl, f64> = HashMap::new();
            for s in t1.sources.iter().chain(&t2.sources) {
                let entry = best.entry(s.key().clone()).or_insert(0.0);
                *entry = entry.max(s.credibility_score);
            }
            let tier1_keys: Vec<NormalizedUrl> =
                t1.sources.iter().map(|s| s.key().clone()).collect();
            let expected_confidence = t1.confidence().max(t2.confidence());

            let result = ResultMerger::default().merge(t1, Some(t2));

            prop_assert_eq!(result.source_count(), best.len());
            prop_assert_eq!(result.citations().len(), result.source_count());
            prop_assert_eq!(result.tier_used(), TierUsed::Both);
            prop_assert_eq!(result.overall_confidence(), expected_confidence);
            prop_assert!(result.findings_text().contains(FINDINGS_SEPARATOR));

            for s in result.sources() {
                prop_assert_eq!(s.credibility_score, best[s.key()]);
                if tier1_keys.contains(s.key()) {
                    prop_assert_eq!(s.origin_tier, Tier::TierOne);
                }
            }
        }

        #[test]
        fn merge_without_tier_two_preserves_distinct_sources(t1 in attempt(Tier::TierOne)) {
            let mut seen = std::collections::HashSet::new();
            let distinct: Vec<Source> = t1
                .sources
                .iter()
                .filter(|s| seen.insert(s.key().clone()))
                .cloned()
                .collect();
            let t1 = t1.with_sources(distinct.clone());

            let result = ResultMerger::default().merge(t1, None);
            prop_assert_eq!(result.sources(), distinct.as_slice());
            prop_assert_eq!(result.tier_used(), TierUsed::TierOne);
        }
    }

    // =========================================================================
    // Sources and citations
    // =========================================================================

    proptest! {
        #[test]
        fn normalization_is_idempotent(u in url()) {
            let once = NormalizedUrl::parse(&u).unwrap();
            let twice = NormalizedUrl::parse(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn citations_are_deterministic(s in source(Tier::TierOne), apa: bool, dates: bool) {
            let style = if apa { CitationStyle::Apa } else { CitationStyle::Mla };
            let formatter = CitationFormatter::new(style, dates);
            prop_assert_eq!(formatter.format(&s), formatter.format(&s.clone()));
        }
    }
}
