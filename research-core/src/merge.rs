//! Merging tier attempts into one cited result.
//!
//! Sources are deduplicated by normalized URL. Tier 1 sources come first in
//! their discovery order, then new tier 2 sources. When both tiers report the
//! same source, the entry keeps its first-insertion provenance (tier 1) but
//! takes the higher credibility score. Provenance is the tier whose attempt
//! carried the source, whatever the collaborator stamped on it.

use std::collections::HashMap;
use tracing::debug;

use crate::attempt::ResearchAttempt;
use crate::citation::{Citation, CitationFormatter};
use crate::result::{Advisory, AdvisoryKind, ResearchResult, TierUsed};
use crate::source::{NormalizedUrl, Source, Tier};

/// Separator placed between tier 1 and tier 2 findings.
pub const FINDINGS_SEPARATOR: &str = "\n\n--- Tier 2 (deep research) ---\n\n";

/// Deduplicate sources by normalized URL, keeping first-insertion order and
/// provenance and the highest credibility score seen.
pub fn dedup_sources(sources: impl IntoIterator<Item = Source>) -> Vec<Source> {
    let mut merged: Vec<Source> = Vec::new();
    let mut index: HashMap<NormalizedUrl, usize> = HashMap::new();

    for source in sources {
        match index.get(source.key()) {
            Some(&pos) => {
                let kept = &mut merged[pos];
                if source.credibility_score > kept.credibility_score {
                    debug!(
                        url = %source.key(),
                        from = kept.credibility_score,
                        to = source.credibility_score,
                        "Duplicate source raised credibility"
                    );
                    kept.credibility_score = source.credibility_score;
                }
            }
            None => {
                index.insert(source.key().clone(), merged.len());
                merged.push(source);
            }
        }
    }

    merged
}

/// Credit every source to the tier that returned it.
fn attributed(tier: Tier, sources: Vec<Source>) -> impl Iterator<Item = Source> {
    sources.into_iter().map(move |mut source| {
        source.origin_tier = tier;
        source
    })
}

fn union_gaps(first: Vec<String>, second: Vec<String>) -> Vec<String> {
    let mut gaps = Vec::with_capacity(first.len() + second.len());
    for gap in first.into_iter().chain(second) {
        if !gaps.contains(&gap) {
            gaps.push(gap);
        }
    }
    gaps
}

/// Builds [`ResearchResult`]s from tier attempts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultMerger {
    formatter: CitationFormatter,
}

impl ResultMerger {
    /// Create a merger that cites with the given formatter.
    pub fn new(formatter: CitationFormatter) -> Self {
        Self { formatter }
    }

    /// Merge a tier 1 attempt with an optional tier 2 attempt.
    ///
    /// Deterministic; the inputs are consumed and nothing else is touched.
    pub fn merge(&self, tier1: ResearchAttempt, tier2: Option<ResearchAttempt>) -> ResearchResult {
        let Some(tier2) = tier2 else {
            let confidence = tier1.confidence();
            return self.build(
                tier1.findings_text,
                dedup_sources(attributed(Tier::TierOne, tier1.sources)),
                TierUsed::TierOne,
                confidence,
                tier1.elapsed_ms,
                tier1.gaps,
            );
        };

        let confidence = tier1.confidence().max(tier2.confidence());
        let findings = format!(
            "{}{}{}",
            tier1.findings_text, FINDINGS_SEPARATOR, tier2.findings_text
        );
        let elapsed = tier1.elapsed_ms.saturating_add(tier2.elapsed_ms);
        let sources = dedup_sources(
            attributed(Tier::TierOne, tier1.sources)
                .chain(attributed(Tier::TierTwo, tier2.sources)),
        );

        self.build(
            findings,
            sources,
            TierUsed::Both,
            confidence,
            elapsed,
            union_gaps(tier1.gaps, tier2.gaps),
        )
    }

    /// Turn a lone attempt from either tier into a result.
    pub fn from_single(&self, attempt: ResearchAttempt) -> ResearchResult {
        let confidence = attempt.confidence();
        self.build(
            attempt.findings_text,
            dedup_sources(attributed(attempt.tier, attempt.sources)),
            attempt.tier.into(),
            confidence,
            attempt.elapsed_ms,
            attempt.gaps,
        )
    }

    fn build(
        &self,
        findings_text: String,
        sources: Vec<Source>,
        tier_used: TierUsed,
        overall_confidence: f64,
        total_elapsed_ms: u64,
        gaps: Vec<String>,
    ) -> ResearchResult {
        let citations: Vec<Citation> = self.formatter.format_all(&sources);

        let mut result = ResearchResult {
            findings_text,
            sources,
            citations,
            tier_used,
            overall_confidence,
            total_elapsed_ms,
            gaps,
            advisories: Vec::new(),
        };

        let approximate = result
            .citations
            .iter()
            .filter(|c| c.year_is_approximate)
            .count();
        if approximate > 0 {
            result.push_advisory(Advisory::new(
                AdvisoryKind::ApproximateCitationYear,
                format!(
                    "{} citation(s) use the access year in place of an unknown publication year",
                    approximate
                ),
            ));
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::citation::CitationStyle;
    use crate::source::Tier;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn source(url: &str, tier: Tier, credibility: f64) -> Source {
        Source::new(url, "T", tier).unwrap().with_credibility(credibility)
    }

    fn tier1_attempt() -> ResearchAttempt {
        ResearchAttempt::new(Tier::TierOne, "Quick findings")
            .with_sources(vec![
                source("https://x.com/a", Tier::TierOne, 0.5),
                source("https://y.com/b", Tier::TierOne, 0.6),
            ])
            .with_confidence(0.5)
            .with_elapsed_ms(1_000)
    }

    #[test]
    fn test_merge_without_tier_two_is_identity_on_sources() {
        let attempt = tier1_attempt();
        let result = ResultMerger::default().merge(attempt.clone(), None);

        assert_eq!(result.sources(), attempt.sources.as_slice());
        assert_eq!(result.findings_text(), "Quick findings");
        assert_eq!(result.tier_used(), TierUsed::TierOne);
        assert_eq!(result.overall_confidence(), 0.5);
        assert_eq!(result.total_elapsed_ms(), 1_000);
        assert_eq!(result.citations().len(), result.sources().len());
    }

    #[test]
    fn test_trailing_slash_duplicate_takes_higher_score_keeps_provenance() {
        let tier1 = ResearchAttempt::new(Tier::TierOne, "t1")
            .with_source(source("https://x.com/a", Tier::TierOne, 0.5));
        let tier2 = ResearchAttempt::new(Tier::TierTwo, "t2")
            .with_source(source("https://x.com/a/", Tier::TierTwo, 0.9));

        let result = ResultMerger::default().merge(tier1, Some(tier2));

        assert_eq!(result.source_count(), 1);
        let merged = &result.sources()[0];
        assert_eq!(merged.credibility_score, 0.9);
        assert_eq!(merged.origin_tier, Tier::TierOne);
        assert_eq!(merged.url(), "https://x.com/a");
    }

    #[test]
    fn test_provenance_follows_the_returning_tier() {
        // collaborators that build sources from records get the default tier
        let mislabeled: Source =
            serde_json::from_str(r#"{"url":"https://deep.org/x","title":"X"}"#).unwrap();
        assert_eq!(mislabeled.origin_tier, Tier::TierOne);

        let tier2 = ResearchAttempt::new(Tier::TierTwo, "t2").with_source(mislabeled.clone());
        let result = ResultMerger::default().merge(tier1_attempt(), Some(tier2.clone()));
        let deep = result
            .sources()
            .iter()
            .find(|s| s.url() == "https://deep.org/x")
            .unwrap();
        assert_eq!(deep.origin_tier, Tier::TierTwo);

        let single = ResultMerger::default().from_single(tier2);
        assert_eq!(single.sources()[0].origin_tier, Tier::TierTwo);
    }

    #[test]
    fn test_lower_tier_two_score_ignored() {
        let tier1 = ResearchAttempt::new(Tier::TierOne, "t1")
            .with_source(source("https://x.com/a", Tier::TierOne, 0.8));
        let tier2 = ResearchAttempt::new(Tier::TierTwo, "t2")
            .with_source(source("https://X.com/a?utm_source=rss", Tier::TierTwo, 0.3));

        let result = ResultMerger::default().merge(tier1, Some(tier2));
        assert_eq!(result.source_count(), 1);
        assert_eq!(result.sources()[0].credibility_score, 0.8);
    }

    #[test]
    fn test_merge_order_tier_one_first() {
        let tier2 = ResearchAttempt::new(Tier::TierTwo, "Deep findings")
            .with_sources(vec![
                source("https://z.com/c", Tier::TierTwo, 0.7),
                source("https://y.com/b", Tier::TierTwo, 0.9),
                source("https://w.com/d", Tier::TierTwo, 0.7),
            ])
            .with_confidence(0.9)
            .with_elapsed_ms(4_000);

        let result = ResultMerger::default().merge(tier1_attempt(), Some(tier2));

        let urls: Vec<&str> = result.sources().iter().map(|s| s.url()).collect();
        assert_eq!(
            urls,
            vec![
                "https://x.com/a",
                "https://y.com/b",
                "https://z.com/c",
                "https://w.com/d"
            ]
        );
        assert_eq!(result.sources()[1].credibility_score, 0.9);
        assert_eq!(result.sources()[1].origin_tier, Tier::TierOne);
        assert_eq!(result.tier_used(), TierUsed::Both);
        assert_eq!(result.overall_confidence(), 0.9);
        assert_eq!(result.total_elapsed_ms(), 5_000);
        assert_eq!(result.citations().len(), 4);
    }

    #[test]
    fn test_findings_concatenated_tier_one_first() {
        let tier2 = ResearchAttempt::new(Tier::TierTwo, "Deep findings").with_confidence(0.2);
        let result = ResultMerger::default().merge(tier1_attempt(), Some(tier2));

        assert_eq!(
            result.findings_text(),
            format!("Quick findings{}Deep findings", FINDINGS_SEPARATOR)
        );
        // max, even when tier 2 is weaker
        assert_eq!(result.overall_confidence(), 0.5);
    }

    #[test]
    fn test_gaps_unioned() {
        let tier1 = tier1_attempt().with_gaps(vec!["a".to_string(), "b".to_string()]);
        let tier2 = ResearchAttempt::new(Tier::TierTwo, "t2")
            .with_gaps(vec!["b".to_string(), "c".to_string()]);

        let result = ResultMerger::default().merge(tier1, Some(tier2));
        assert_eq!(result.gaps(), ["a", "b", "c"]);
    }

    #[test]
    fn test_duplicates_within_one_tier_collapse() {
        let tier1 = ResearchAttempt::new(Tier::TierOne, "t1").with_sources(vec![
            source("https://x.com/a", Tier::TierOne, 0.4),
            source("https://x.com/a/#intro", Tier::TierOne, 0.6),
        ]);
        let result = ResultMerger::default().merge(tier1, None);
        assert_eq!(result.source_count(), 1);
        assert_eq!(result.sources()[0].credibility_score, 0.6);
    }

    #[test]
    fn test_from_single_tier_two() {
        let attempt = ResearchAttempt::new(Tier::TierTwo, "Deep only")
            .with_source(source("https://z.com/c", Tier::TierTwo, 0.7))
            .with_confidence(0.85)
            .with_elapsed_ms(3_000);

        let result = ResultMerger::default().from_single(attempt);
        assert_eq!(result.tier_used(), TierUsed::TierTwo);
        assert_eq!(result.findings_text(), "Deep only");
        assert_eq!(result.overall_confidence(), 0.85);
        assert!(result.is_high_confidence());
    }

    #[test]
    fn test_apa_access_year_adds_advisory() {
        let accessed = NaiveDate::from_ymd_opt(2025, 12, 23).unwrap();
        let tier1 = ResearchAttempt::new(Tier::TierOne, "t1").with_sources(vec![
            source("https://x.com/a", Tier::TierOne, 0.5).with_accessed_date(accessed),
            source("https://y.com/b", Tier::TierOne, 0.5).with_accessed_date(accessed),
        ]);

        let merger = ResultMerger::new(CitationFormatter::new(CitationStyle::Apa, true));
        let result = merger.merge(tier1.clone(), None);
        assert!(result.has_advisory(AdvisoryKind::ApproximateCitationYear));
        assert_eq!(result.advisories().len(), 1);

        let mla = ResultMerger::default().merge(tier1, None);
        assert!(mla.advisories().is_empty());
    }

    #[test]
    fn test_confidence_bands() {
        let result = ResultMerger::default().merge(tier1_attempt(), None);
        assert!(result.is_low_confidence());
        assert!(!result.is_high_confidence());
    }
}
