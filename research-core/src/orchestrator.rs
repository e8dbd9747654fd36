//! Research orchestration across the two tiers.
//!
//! The orchestrator drives one request end to end:
//! 1. VALIDATE: check config and query before any tier runs, filling unset
//!    citation preferences from the config
//! 2. PREFLIGHT: `Basic` and `Deep` requests pick their tier up front
//! 3. TIER 1: run the fast tier (under `Auto`, a failure becomes an empty attempt)
//! 4. ASSESS: score the tier 1 attempt and ask the escalation policy
//! 5. TIER 2: run the thorough tier when escalating
//! 6. MERGE: deduplicate sources, cite them, attach advisories

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

use crate::attempt::ResearchAttempt;
use crate::citation::{CitationFormatter, CitationStyle};
use crate::config::ResearchConfig;
use crate::error::{Error, Result};
use crate::escalation::{EscalationDecision, EscalationPolicy};
use crate::merge::ResultMerger;
use crate::output::{self, OutputFormat};
use crate::quality::QualityAssessor;
use crate::query::{RequestedDepth, ResearchQuery};
use crate::repository::{ResearchRepository, ResultKey};
use crate::result::{Advisory, AdvisoryKind, ResearchResult};
use crate::source::Tier;
use crate::tier::{TierError, TierResearcher, UnavailableTier};

/// Service health, as reported to monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub tier1_available: bool,
    pub tier2_available: bool,
    pub escalation_threshold: f64,
    pub auto_escalation_enabled: bool,
    pub citation_format: CitationStyle,
    pub output_format: OutputFormat,
    pub version: String,
}

/// Coordinates the tier collaborators, the quality assessor, the escalation
/// policy and the merger.
///
/// Holds no per-request state; one orchestrator can serve many concurrent
/// requests.
pub struct ResearchOrchestrator {
    config: ResearchConfig,
    tier_one: Arc<dyn TierResearcher>,
    tier_two: Arc<dyn TierResearcher>,
    repository: Option<Arc<dyn ResearchRepository>>,
    assessor: QualityAssessor,
    policy: EscalationPolicy,
}

impl ResearchOrchestrator {
    /// Create an orchestrator over both tiers. The config is validated here.
    pub fn new(
        config: ResearchConfig,
        tier_one: Arc<dyn TierResearcher>,
        tier_two: Arc<dyn TierResearcher>,
    ) -> Result<Self> {
        config.validate()?;

        if tier_one.tier() != Tier::TierOne {
            return Err(Error::config(format!(
                "tier 1 slot holds a {} collaborator",
                tier_one.tier()
            )));
        }
        if tier_two.tier() != Tier::TierTwo {
            return Err(Error::config(format!(
                "tier 2 slot holds a {} collaborator",
                tier_two.tier()
            )));
        }

        Ok(Self {
            assessor: QualityAssessor::from_config(&config),
            policy: EscalationPolicy::from_config(&config),
            config,
            tier_one,
            tier_two,
            repository: None,
        })
    }

    /// Create an orchestrator for a deployment without a thorough tier.
    pub fn tier_one_only(config: ResearchConfig, tier_one: Arc<dyn TierResearcher>) -> Result<Self> {
        let tier_two = Arc::new(UnavailableTier::new(
            Tier::TierTwo,
            "no tier 2 collaborator configured",
        ));
        Self::new(config, tier_one, tier_two)
    }

    /// Serve repeated requests from a repository.
    pub fn with_repository(mut self, repository: Arc<dyn ResearchRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Whether the thorough tier can be used.
    pub fn tier2_available(&self) -> bool {
        self.tier_two.is_available()
    }

    /// Current health and configuration summary.
    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            tier1_available: self.tier_one.is_available(),
            tier2_available: self.tier2_available(),
            escalation_threshold: self.config.escalation_threshold,
            auto_escalation_enabled: self.config.auto_escalation_enabled,
            citation_format: self.config.citation_format,
            output_format: self.config.output_format,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Answer a research question.
    pub async fn research(
        &self,
        query: &str,
        requested_depth: RequestedDepth,
        citation_format: CitationStyle,
        include_access_dates: bool,
    ) -> Result<ResearchResult> {
        let query = ResearchQuery::new(query)
            .with_depth(requested_depth)
            .with_citation_format(citation_format)
            .with_access_dates(include_access_dates);
        self.research_query(&query).await
    }

    /// Answer a research request. Citation preferences the query leaves
    /// unset come from the config.
    #[instrument(skip(self, query), fields(query_id = %query.id, depth = %query.depth))]
    pub async fn research_query(&self, query: &ResearchQuery) -> Result<ResearchResult> {
        self.config.validate()?;
        query.validate()?;
        let query = &query.clone().with_defaults_from(&self.config);

        info!(query_length = query.query.len(), "Research request received");
        let started = Instant::now();

        let key = ResultKey::for_query(query);
        if let Some(cached) = self.lookup(&key).await {
            info!(key = %key, "Serving research result from repository");
            return Ok(cached);
        }

        let (style, include_access_dates) = query.citation_preferences(&self.config);
        let merger = ResultMerger::new(CitationFormatter::new(style, include_access_dates));
        let tier2_available = self.tier2_available();

        let result = match self.policy.preflight(query.depth, tier2_available) {
            Some(EscalationDecision::ForceTierTwo) => {
                let (outcome, _) = self.run_tier(self.tier_two.as_ref(), query).await;
                let attempt = outcome.map_err(|e| Error::tier_execution(Tier::TierTwo, e))?;
                merger.from_single(attempt)
            }
            Some(_) => {
                let (outcome, _) = self.run_tier(self.tier_one.as_ref(), query).await;
                let attempt = outcome.map_err(|e| Error::tier_execution(Tier::TierOne, e))?;
                let mut result = merger.merge(attempt, None);

                if query.depth == RequestedDepth::Deep {
                    let unavailable = Error::tier_unavailable(
                        Tier::TierTwo,
                        "deep research requested; answered with tier 1 only",
                    );
                    warn!("{}", unavailable);
                    result.push_advisory(Advisory::new(
                        AdvisoryKind::TierUnavailable,
                        unavailable.to_string(),
                    ));
                }
                result
            }
            None => self.research_auto(query, &merger, tier2_available).await,
        };

        info!(
            tier_used = %result.tier_used(),
            source_count = result.source_count(),
            confidence = result.overall_confidence(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Research completed"
        );

        self.store(query, &result).await;
        Ok(result)
    }

    /// Research and render with the configured output format.
    pub async fn research_rendered(&self, query: &ResearchQuery) -> Result<String> {
        let result = self.research_query(query).await?;
        output::render(&result, self.config.output_format)
    }

    async fn research_auto(
        &self,
        query: &ResearchQuery,
        merger: &ResultMerger,
        tier2_available: bool,
    ) -> ResearchResult {
        let (outcome, elapsed_ms) = self.run_tier(self.tier_one.as_ref(), query).await;
        let (tier1, tier1_error) = match outcome {
            Ok(attempt) => (attempt, None),
            Err(e) => {
                warn!(error = %e, "Tier 1 failed; continuing with an empty attempt");
                (ResearchAttempt::failed(Tier::TierOne, &e, elapsed_ms), Some(e))
            }
        };

        let quality = self.assessor.assess(&tier1);
        let verdict = self
            .policy
            .evaluate(&tier1, quality, RequestedDepth::Auto, tier2_available);
        debug!(
            quality,
            decision = %verdict.decision,
            reason = %verdict.reason(),
            "Assessed tier 1 attempt"
        );

        let mut result = match verdict.decision {
            EscalationDecision::Escalate => {
                warn!(
                    from_tier = %Tier::TierOne,
                    to_tier = %Tier::TierTwo,
                    reason = %verdict.reason(),
                    "Escalating from tier 1 to tier 2"
                );
                let (outcome, _) = self.run_tier(self.tier_two.as_ref(), query).await;
                match outcome {
                    Ok(tier2) => merger.merge(tier1, Some(tier2)),
                    Err(e) => {
                        warn!(error = %e, "Tier 2 failed during escalation; keeping tier 1 data");
                        let mut result = merger.merge(tier1, None);
                        result.push_advisory(Advisory::new(
                            AdvisoryKind::TierTwoFailed,
                            format!("Escalation to tier 2 failed ({}); result holds tier 1 data only", e),
                        ));
                        result
                    }
                }
            }
            _ => {
                let mut result = merger.merge(tier1, None);
                if verdict.escalation_blocked {
                    warn!(reason = %verdict.reason(), "Tier 1 fell short but tier 2 is unavailable");
                    result.push_advisory(Advisory::new(
                        AdvisoryKind::EscalationSkipped,
                        format!(
                            "Tier 1 results fell short ({}) and tier 2 is unavailable",
                            verdict.reason()
                        ),
                    ));
                }
                result
            }
        };

        if let Some(e) = tier1_error {
            result.push_advisory(Advisory::new(
                AdvisoryKind::TierOneFailed,
                format!("Tier 1 failed ({}); treated as an empty attempt", e),
            ));
        }

        result
    }

    /// Run one tier under its time budget, domain allow-list and source cap.
    ///
    /// Also returns the measured wall time, which failed attempts need.
    async fn run_tier(
        &self,
        researcher: &dyn TierResearcher,
        query: &ResearchQuery,
    ) -> (std::result::Result<ResearchAttempt, TierError>, u64) {
        let tier = researcher.tier();
        let mut options = self.config.tier_options(tier).clone();
        if let Some(max) = query.max_sources {
            options.max_sources = options.max_sources.min(max);
        }

        debug!(tier = %tier, max_sources = options.max_sources, "Running tier");
        let started = Instant::now();
        let budget = Duration::from_millis(options.timeout_ms);
        let outcome = match tokio::time::timeout(budget, researcher.research(query, &options)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(TierError::timeout(options.timeout_ms)),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let outcome = outcome.map(|mut attempt| {
            attempt.tier = tier;
            let returned = attempt.sources.len();
            attempt.sources.retain(|source| options.allows(source));
            if attempt.sources.len() < returned {
                debug!(
                    tier = %tier,
                    dropped = returned - attempt.sources.len(),
                    "Dropped sources outside the allowed domains"
                );
            }
            if attempt.sources.len() > options.max_sources {
                debug!(
                    tier = %tier,
                    returned = attempt.sources.len(),
                    kept = options.max_sources,
                    "Truncating sources to cap"
                );
                attempt.sources.truncate(options.max_sources);
            }
            if attempt.elapsed_ms == 0 {
                attempt.elapsed_ms = elapsed_ms;
            }
            attempt.with_detected_gaps()
        });

        (outcome, elapsed_ms)
    }

    async fn lookup(&self, key: &ResultKey) -> Option<ResearchResult> {
        let repository = self.repository.as_ref()?;
        match repository.get(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!(error = %e, "Repository lookup failed");
                None
            }
        }
    }

    /// Store a result unless a failed or missing tier degraded it.
    async fn store(&self, query: &ResearchQuery, result: &ResearchResult) {
        let Some(repository) = &self.repository else {
            return;
        };
        if result.is_degraded() {
            debug!("Not storing a degraded result");
            return;
        }
        if let Err(e) = repository.save(query, result).await {
            warn!(error = %e, "Failed to store research result");
        }
    }
}
