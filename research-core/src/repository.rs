//! Storage for completed research results.
//!
//! The orchestrator consults a repository before running any tier and stores
//! successful results afterwards. Keys hash the normalized query text with
//! every preference that changes the output, so an MLA result is never served
//! for an APA request.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::query::ResearchQuery;
use crate::result::ResearchResult;

/// Key of a stored result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultKey(pub String);

impl ResultKey {
    /// Derive the key for a query and its output preferences.
    pub fn for_query(query: &ResearchQuery) -> Self {
        let mut hasher = Sha256::new();

        hasher.update(b"query:");
        hasher.update(normalize_query(&query.query).as_bytes());
        hasher.update(b"\ndepth:");
        hasher.update(query.depth.to_string().as_bytes());
        if let Some(style) = query.citation_format {
            hasher.update(format!("\nstyle:{}", style).as_bytes());
        }
        if let Some(include) = query.include_access_dates {
            hasher.update(if include { b"\naccess_dates:1" } else { b"\naccess_dates:0" });
        }
        if let Some(max) = query.max_sources {
            hasher.update(format!("\nmax_sources:{}", max).as_bytes());
        }

        ResultKey(format!("{:x}", hasher.finalize()))
    }
}

impl std::fmt::Display for ResultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let short: String = self.0.chars().take(16).collect();
        write!(f, "{}", short)
    }
}

/// Lowercase and collapse whitespace.
fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Persistence port for research results.
#[async_trait]
pub trait ResearchRepository: Send + Sync {
    /// Store a result for a query; returns its key.
    async fn save(&self, query: &ResearchQuery, result: &ResearchResult) -> Result<ResultKey>;

    /// Fetch a live result by key.
    async fn get(&self, key: &ResultKey) -> Result<Option<ResearchResult>>;

    /// Find live results whose query text contains `needle` (case-insensitive).
    async fn search_by_query(&self, needle: &str, limit: usize) -> Result<Vec<ResearchResult>>;
}

#[derive(Debug, Clone)]
struct StoredResult {
    query: String,
    result: ResearchResult,
    created_at: DateTime<Utc>,
}

impl StoredResult {
    fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }
}

/// Repository statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: u64,
}

impl RepositoryStats {
    /// Fraction of lookups that hit.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-local repository with TTL expiry.
pub struct InMemoryRepository {
    entries: Arc<RwLock<HashMap<ResultKey, StoredResult>>>,
    stats: Arc<RwLock<RepositoryStats>>,
    ttl: Duration,
}

impl InMemoryRepository {
    /// Create a repository whose entries live for one hour.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(RwLock::new(RepositoryStats::default())),
            ttl: Duration::hours(1),
        }
    }

    /// Use a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub async fn stats(&self) -> RepositoryStats {
        self.stats.read().await.clone()
    }

    /// Drop expired entries.
    pub async fn cleanup(&self) {
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| !e.is_expired(self.ttl));

        let mut stats = self.stats.write().await;
        stats.entry_count = entries.len() as u64;
    }

    /// Remove everything and reset statistics.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
        *self.stats.write().await = RepositoryStats::default();
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResearchRepository for InMemoryRepository {
    async fn save(&self, query: &ResearchQuery, result: &ResearchResult) -> Result<ResultKey> {
        let key = ResultKey::for_query(query);

        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            StoredResult {
                query: query.query.clone(),
                result: result.clone(),
                created_at: Utc::now(),
            },
        );

        let mut stats = self.stats.write().await;
        stats.entry_count = entries.len() as u64;

        Ok(key)
    }

    async fn get(&self, key: &ResultKey) -> Result<Option<ResearchResult>> {
        let found = {
            let entries = self.entries.read().await;
            entries
                .get(key)
                .filter(|e| !e.is_expired(self.ttl))
                .map(|e| e.result.clone())
        };

        let mut stats = self.stats.write().await;
        if found.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }

        Ok(found)
    }

    async fn search_by_query(&self, needle: &str, limit: usize) -> Result<Vec<ResearchResult>> {
        let needle = normalize_query(needle);
        let entries = self.entries.read().await;

        let mut matches: Vec<&StoredResult> = entries
            .values()
            .filter(|e| !e.is_expired(self.ttl))
            .filter(|e| normalize_query(&e.query).contains(&needle))
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(matches
            .into_iter()
            .take(limit)
            .map(|e| e.result.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::ResearchAttempt;
    use crate::citation::CitationStyle;
    use crate::merge::ResultMerger;
    use crate::query::RequestedDepth;
    use crate::source::Tier;

    fn result(text: &str) -> ResearchResult {
        ResultMerger::default().merge(
            ResearchAttempt::new(Tier::TierOne, text).with_confidence(0.8),
            None,
        )
    }

    #[test]
    fn test_key_normalizes_query_text() {
        let a = ResearchQuery::new("Battle of  Waterloo");
        let b = ResearchQuery::new("  battle of waterloo ");
        assert_eq!(ResultKey::for_query(&a), ResultKey::for_query(&b));
    }

    #[test]
    fn test_key_covers_preferences() {
        let base = ResearchQuery::new("Waterloo");
        let keys = [
            ResultKey::for_query(&base),
            ResultKey::for_query(&base.clone().with_depth(RequestedDepth::Deep)),
            ResultKey::for_query(&base.clone().with_citation_format(CitationStyle::Apa)),
            ResultKey::for_query(&base.clone().with_access_dates(false)),
            ResultKey::for_query(&base.clone().with_max_sources(5)),
        ];
        for i in 0..keys.len() {
            for j in (i + 1)..keys.len() {
                assert_ne!(keys[i], keys[j]);
            }
        }
    }

    #[test]
    fn test_key_display_is_char_safe() {
        let key = ResultKey("ключ-для-проверки-отображения".to_string());
        assert_eq!(key.to_string(), "ключ-для-проверк");
        assert_eq!(ResultKey("abc".to_string()).to_string(), "abc");
    }

    #[tokio::test]
    async fn test_save_and_get() {
        let repo = InMemoryRepository::new();
        let query = ResearchQuery::new("Waterloo");

        let key = repo.save(&query, &result("Napoleon lost")).await.unwrap();
        let found = repo.get(&key).await.unwrap().unwrap();
        assert_eq!(found.findings_text(), "Napoleon lost");

        let missing = ResultKey::for_query(&ResearchQuery::new("Austerlitz"));
        assert!(repo.get(&missing).await.unwrap().is_none());

        let stats = repo.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert!((stats.hit_rate() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_expired_entries_are_misses() {
        let repo = InMemoryRepository::new().with_ttl(Duration::milliseconds(-1));
        let query = ResearchQuery::new("Waterloo");

        let key = repo.save(&query, &result("old")).await.unwrap();
        assert!(repo.get(&key).await.unwrap().is_none());

        repo.cleanup().await;
        assert_eq!(repo.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_search_by_query() {
        let repo = InMemoryRepository::new();
        repo.save(&ResearchQuery::new("Battle of Waterloo"), &result("a"))
            .await
            .unwrap();
        repo.save(&ResearchQuery::new("Waterloo station history"), &result("b"))
            .await
            .unwrap();
        repo.save(&ResearchQuery::new("Fall of Rome"), &result("c"))
            .await
            .unwrap();

        let found = repo.search_by_query("WATERLOO", 10).await.unwrap();
        assert_eq!(found.len(), 2);

        let limited = repo.search_by_query("waterloo", 1).await.unwrap();
        assert_eq!(limited.len(), 1);

        repo.clear().await;
        assert!(repo.search_by_query("rome", 10).await.unwrap().is_empty());
    }
}
