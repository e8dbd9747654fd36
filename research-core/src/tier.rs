//! Tier collaborator contract.
//!
//! The engine never searches or fetches anything itself. Each tier is an
//! external collaborator that, given a query and its [`TierOptions`], returns
//! exactly one [`ResearchAttempt`] or fails with a [`TierError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attempt::ResearchAttempt;
use crate::query::ResearchQuery;
use crate::source::{Source, Tier};

/// How hard a tier should search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    /// Quick search
    Basic,
    /// Deep search with content extraction
    Advanced,
}

impl std::fmt::Display for SearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// Options handed to a tier collaborator for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierOptions {
    /// Domains the tier may fetch from (empty = unrestricted)
    pub allowed_domains: Vec<String>,
    /// Maximum number of sources to return
    pub max_sources: usize,
    /// Search depth
    pub search_depth: SearchDepth,
    /// Time budget for the invocation in milliseconds
    pub timeout_ms: u64,
}

impl TierOptions {
    /// Defaults for the fast tier.
    pub fn tier_one_defaults() -> Self {
        Self {
            allowed_domains: vec![
                "wikipedia.org".to_string(),
                "britannica.com".to_string(),
                "history.com".to_string(),
                "edu".to_string(),
            ],
            max_sources: 10,
            search_depth: SearchDepth::Basic,
            timeout_ms: 30_000,
        }
    }

    /// Defaults for the thorough tier.
    pub fn tier_two_defaults() -> Self {
        Self {
            allowed_domains: Vec::new(),
            max_sources: 20,
            search_depth: SearchDepth::Advanced,
            timeout_ms: 60_000,
        }
    }

    /// Set the source cap.
    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Set the time budget.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the allowed domains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = domains;
        self
    }

    /// Whether a source falls inside the allowed domains.
    ///
    /// An entry matches the domain itself, any subdomain of it, or (for bare
    /// suffixes like `edu`) any host under that suffix.
    pub fn allows(&self, source: &Source) -> bool {
        if self.allowed_domains.is_empty() {
            return true;
        }
        let Some(domain) = source.domain() else {
            return false;
        };
        self.allowed_domains.iter().any(|allowed| {
            let allowed = allowed.trim_start_matches('.').to_ascii_lowercase();
            domain == allowed || domain.ends_with(&format!(".{}", allowed))
        })
    }
}

/// Failure reported by a tier collaborator.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TierError {
    /// Transport-level failure
    #[error("network failure: {0}")]
    Network(String),

    /// The provider refused the request
    #[error("provider '{provider}' rejected the request: {message}")]
    ProviderRejected { provider: String, message: String },

    /// Nothing came back within the time budget
    #[error("no result within {timeout_ms}ms")]
    EmptyResultTimeout { timeout_ms: u64 },

    /// Credentials or configuration for the tier are missing
    #[error("tier not configured: {0}")]
    Unavailable(String),
}

impl TierError {
    /// Create a network failure.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a provider rejection.
    pub fn provider_rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a timeout failure.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::EmptyResultTimeout { timeout_ms }
    }
}

/// A research strategy the orchestrator can invoke.
///
/// Implementations must be thread-safe (`Send + Sync`); the orchestrator may
/// serve many queries concurrently through the same collaborator.
#[async_trait]
pub trait TierResearcher: Send + Sync {
    /// Which tier this collaborator implements.
    fn tier(&self) -> Tier;

    /// Whether the credentials/config this tier needs are present.
    fn is_available(&self) -> bool {
        true
    }

    /// Run the query once and return the attempt.
    async fn research(
        &self,
        query: &ResearchQuery,
        options: &TierOptions,
    ) -> std::result::Result<ResearchAttempt, TierError>;
}

/// Placeholder for a tier that is not configured in this deployment.
#[derive(Debug, Clone)]
pub struct UnavailableTier {
    tier: Tier,
    reason: String,
}

impl UnavailableTier {
    /// Create a placeholder for `tier`.
    pub fn new(tier: Tier, reason: impl Into<String>) -> Self {
        Self {
            tier,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl TierResearcher for UnavailableTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn research(
        &self,
        _query: &ResearchQuery,
        _options: &TierOptions,
    ) -> std::result::Result<ResearchAttempt, TierError> {
        Err(TierError::Unavailable(self.reason.clone()))
    }
}

/// Scripted tier collaborator for tests.
#[cfg(test)]
pub(crate) struct MockTier {
    tier: Tier,
    available: std::sync::atomic::AtomicBool,
    response: std::result::Result<ResearchAttempt, TierError>,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
    last_options: std::sync::Mutex<Option<TierOptions>>,
}

#[cfg(test)]
impl MockTier {
    pub fn returning(attempt: ResearchAttempt) -> Self {
        Self {
            tier: attempt.tier,
            available: std::sync::atomic::AtomicBool::new(true),
            response: Ok(attempt),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_options: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(tier: Tier, error: TierError) -> Self {
        Self {
            response: Err(error),
            ..Self::returning(ResearchAttempt::new(tier, ""))
        }
    }

    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn last_options(&self) -> Option<TierOptions> {
        self.last_options.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl TierResearcher for MockTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn is_available(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }

    async fn research(
        &self,
        _query: &ResearchQuery,
        options: &TierOptions,
    ) -> std::result::Result<ResearchAttempt, TierError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        *self.last_options.lock().unwrap() = Some(options.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> Source {
        Source::new(url, "T", Tier::TierOne).unwrap()
    }

    #[test]
    fn test_allowed_domains() {
        let options = TierOptions::tier_one_defaults();

        assert!(options.allows(&source("https://en.wikipedia.org/wiki/Waterloo")));
        assert!(options.allows(&source("https://www.britannica.com/event/x")));
        assert!(options.allows(&source("https://history.stanford.edu/napoleon")));
        assert!(!options.allows(&source("https://example.com/napoleon")));
        assert!(!options.allows(&source("https://notwikipedia.org/x")));
    }

    #[test]
    fn test_unrestricted_domains() {
        let options = TierOptions::tier_two_defaults();
        assert!(options.allows(&source("https://example.com/anything")));
    }

    #[test]
    fn test_defaults_differ_by_tier() {
        let one = TierOptions::tier_one_defaults();
        let two = TierOptions::tier_two_defaults();
        assert!(one.max_sources < two.max_sources);
        assert_eq!(one.search_depth, SearchDepth::Basic);
        assert_eq!(two.search_depth, SearchDepth::Advanced);
    }

    #[tokio::test]
    async fn test_unavailable_tier() {
        let tier = UnavailableTier::new(Tier::TierTwo, "missing API key");
        assert!(!tier.is_available());
        assert_eq!(tier.tier(), Tier::TierTwo);

        let query = ResearchQuery::new("Battle of Waterloo");
        let err = tier
            .research(&query, &TierOptions::tier_two_defaults())
            .await
            .unwrap_err();
        assert_eq!(err, TierError::Unavailable("missing API key".to_string()));
    }
}
