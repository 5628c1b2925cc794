//! Types for the torrent search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display name used when the provider omits a title.
pub const FALLBACK_NAME: &str = "no name";

/// Identifier used when the provider supplies neither a magnet nor a torrent link.
pub const FALLBACK_IDENTIFIER: &str = "#";

/// A single search hit, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title shown to the user.
    pub display_name: String,
    /// Magnet URI, torrent link, or [`FALLBACK_IDENTIFIER`].
    pub identifier: String,
}

impl SearchResult {
    pub fn new(display_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.into(),
        }
    }

    /// Whether the provider gave us nothing to download.
    pub fn is_placeholder(&self) -> bool {
        self.identifier == FALLBACK_IDENTIFIER
    }
}

/// Errors that can occur while talking to the search provider.
///
/// These never reach users: [`Searcher::search`] degrades them to an empty list.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search provider connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search provider returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Search provider response could not be parsed: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for torrent search providers.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Search the provider. Failures are logged and reported as no results.
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_placeholder() {
        assert!(SearchResult::new("x", FALLBACK_IDENTIFIER).is_placeholder());
        assert!(!SearchResult::new("x", "magnet:?xt=urn:btih:abc").is_placeholder());
    }

    #[test]
    fn test_search_result_serialization() {
        let result = SearchResult::new("Naruto - 01", "magnet:?xt=urn:btih:abc");
        let json = serde_json::to_string(&result).unwrap();
        let parsed: SearchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::HttpStatus { status: 503 };
        assert_eq!(err.to_string(), "Search provider returned HTTP 503");
    }
}
