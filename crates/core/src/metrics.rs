//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - IGDB requests (counts and latency)
//! - Import runs (games created, skipped, failed)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// IGDB Metrics
// =============================================================================

/// IGDB requests total by endpoint and result.
pub static IGDB_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ludex_igdb_requests_total", "Total requests sent to IGDB"),
        &["endpoint", "result"], // result: "success", "rate_limited", "error"
    )
    .unwrap()
});

/// IGDB request duration in seconds.
pub static IGDB_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ludex_igdb_request_duration_seconds",
            "Duration of IGDB requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Import Metrics
// =============================================================================

/// Games processed by the importer, by outcome.
pub static IMPORTED_GAMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ludex_imported_games_total",
            "Games processed by the importer",
        ),
        &["result"], // "created", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(IGDB_REQUESTS.clone()),
        Box::new(IGDB_REQUEST_DURATION.clone()),
        Box::new(IMPORTED_GAMES.clone()),
    ]
}
