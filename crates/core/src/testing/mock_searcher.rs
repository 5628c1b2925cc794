//! Mock searcher for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::searcher::{SearchResult, Searcher};

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable search results (truncated to the limit, like a real provider client)
/// - Track search queries for assertions
/// - Simulate slow providers
///
/// # Example
///
/// ```rust,ignore
/// use torrentbot_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher.set_results(fixtures::search_results("Naruto", 7)).await;
///
/// let results = searcher.search("naruto").await;
/// assert_eq!(results.len(), 5);
/// assert_eq!(searcher.recorded_queries().await, vec!["naruto"]);
/// ```
#[derive(Debug)]
pub struct MockSearcher {
    /// Configured results to return.
    results: Arc<RwLock<Vec<SearchResult>>>,
    /// Recorded search queries.
    queries: Arc<RwLock<Vec<String>>>,
    /// Maximum number of results returned per search.
    limit: usize,
    /// Simulated provider latency.
    delay: Arc<RwLock<Option<Duration>>>,
    calls: AtomicUsize,
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher with the default limit of 5.
    pub fn new() -> Self {
        Self::with_limit(5)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            results: Arc::new(RwLock::new(Vec::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            limit,
            delay: Arc::new(RwLock::new(None)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set results returned by every subsequent search.
    pub async fn set_results(&self, results: Vec<SearchResult>) {
        *self.results.write().await = results;
    }

    /// Make every search wait before answering.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    /// Number of searches performed.
    pub fn search_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.write().await.push(query.to_string());

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.results
            .read()
            .await
            .iter()
            .take(self.limit)
            .cloned()
            .collect()
    }
}
