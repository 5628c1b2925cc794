//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Inbound chat events and access denials
//! - Searches and result counts
//! - Dispatches to the torrent client and backend logins
//! - External service latency

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Chat Metrics
// =============================================================================

/// Inbound events by kind.
pub static EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentbot_events_total", "Total inbound chat events"),
        &["kind"], // "start", "search", "download", "active", "button", "ignored"
    )
    .unwrap()
});

/// Events rejected by the access guard.
pub static ACCESS_DENIED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "torrentbot_access_denied_total",
        "Total events from users outside the allow-list",
    )
    .unwrap()
});

/// Chat transport failures by operation.
pub static TRANSPORT_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentbot_transport_errors_total", "Total chat transport errors"),
        &["operation"], // "poll", "reply"
    )
    .unwrap()
});

// =============================================================================
// Search Metrics
// =============================================================================

/// Searches by outcome.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentbot_searches_total", "Total searches"),
        &["result"], // "results", "empty", "failed"
    )
    .unwrap()
});

/// Results kept per successful search.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "torrentbot_search_results",
            "Number of search results returned per query",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 10.0]),
    )
    .unwrap()
});

/// Stale or unknown button presses.
pub static HANDLES_NOT_FOUND: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "torrentbot_handles_not_found_total",
        "Button presses whose handle did not resolve",
    )
    .unwrap()
});

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Dispatches by outcome.
pub static DISPATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentbot_dispatches_total", "Total torrent submissions"),
        &["outcome"], // "success", "invalid_identifier", "connection_failed", ...
    )
    .unwrap()
});

/// Backend login attempts by result.
pub static BACKEND_LOGINS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("torrentbot_backend_logins_total", "Total torrent client logins"),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "torrentbot_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(EVENTS_TOTAL.clone()),
        Box::new(ACCESS_DENIED_TOTAL.clone()),
        Box::new(TRANSPORT_ERRORS.clone()),
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(HANDLES_NOT_FOUND.clone()),
        Box::new(DISPATCHES_TOTAL.clone()),
        Box::new(BACKEND_LOGINS.clone()),
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
    ]
}
