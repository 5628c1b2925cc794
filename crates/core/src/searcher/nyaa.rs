//! Nyaa JSON API search provider.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::SearchProviderConfig;
use crate::metrics::{EXTERNAL_SERVICE_DURATION, SEARCHES_TOTAL, SEARCH_RESULTS};

use super::{SearchError, SearchResult, Searcher, FALLBACK_IDENTIFIER, FALLBACK_NAME};

/// Search provider speaking the nyaaapi JSON format.
pub struct NyaaSearcher {
    client: Client,
    config: SearchProviderConfig,
}

impl NyaaSearcher {
    /// Create a new searcher with the given configuration.
    pub fn new(config: SearchProviderConfig) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Build the provider URL for a query, best-seeded first.
    fn build_search_url(&self, query: &str) -> String {
        format!(
            "{}?q={}&page=1&sort=seeders&order=desc",
            self.config.url.trim_end_matches('/'),
            urlencoding::encode(query)
        )
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.build_search_url(query);
        debug!(url = %url, "Searching provider");

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout
            } else if e.is_connect() {
                SearchError::ConnectionFailed(e.to_string())
            } else {
                SearchError::Internal(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parse_results(body, self.config.max_results))
    }
}

#[async_trait]
impl Searcher for NyaaSearcher {
    fn name(&self) -> &str {
        "nyaa"
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        let start = Instant::now();
        let outcome = self.try_search(query).await;
        EXTERNAL_SERVICE_DURATION
            .with_label_values(&["search", "query"])
            .observe(start.elapsed().as_secs_f64());

        match outcome {
            Ok(results) => {
                info!(query = query, count = results.len(), "Search complete");
                SEARCHES_TOTAL
                    .with_label_values(&[if results.is_empty() { "empty" } else { "results" }])
                    .inc();
                SEARCH_RESULTS.observe(results.len() as f64);
                results
            }
            Err(e) => {
                error!(query = query, error = %e, "Search provider request failed");
                SEARCHES_TOTAL.with_label_values(&["failed"]).inc();
                Vec::new()
            }
        }
    }
}

/// Normalize a provider response into at most `limit` results.
///
/// Accepts `{"data": [...]}`, `{"results": [...]}` or a bare array. Anything
/// else yields no results.
pub fn parse_results(body: Value, limit: usize) -> Vec<SearchResult> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut map) => {
            let chosen = match map.remove("data") {
                Some(data) if is_truthy(&data) => data,
                _ => map.remove("results").unwrap_or(Value::Null),
            };
            match chosen {
                Value::Array(entries) => entries,
                Value::Null => Vec::new(),
                other => {
                    warn!(kind = json_kind(&other), "Search results are not a list");
                    return Vec::new();
                }
            }
        }
        other => {
            warn!(kind = json_kind(&other), "Unexpected search response format");
            return Vec::new();
        }
    };

    entries
        .iter()
        .take(limit)
        .map(|entry| {
            let result = SearchResult {
                display_name: string_field(entry, "title")
                    .unwrap_or(FALLBACK_NAME)
                    .to_string(),
                identifier: non_empty_field(entry, "magnet")
                    .or_else(|| non_empty_field(entry, "torrent"))
                    .unwrap_or(FALLBACK_IDENTIFIER)
                    .to_string(),
            };
            debug!(
                name = %result.display_name,
                identifier = %result.identifier,
                "Search result"
            );
            result
        })
        .collect()
}

fn string_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

fn non_empty_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    string_field(entry, key).filter(|value| !value.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
