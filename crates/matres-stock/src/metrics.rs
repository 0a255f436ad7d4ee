//! Stock provider metrics collection.
//!
//! Provides standardized metrics for monitoring provider searches:
//! - Search counters by provider and outcome
//! - Candidate counters by provider
//! - Search latency histograms

use metrics::{counter, histogram};

use matres_models::Provider;

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Total searches by provider and outcome.
    pub const SEARCHES_TOTAL: &str = "stock_searches_total";

    /// Total candidates returned by provider.
    pub const CANDIDATES_TOTAL: &str = "stock_candidates_total";

    /// Search latency in seconds by provider.
    pub const LATENCY_SECONDS: &str = "stock_search_latency_seconds";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed search.
pub fn record_search(provider: Provider, outcome: &'static str, latency_ms: f64) {
    counter!(
        names::SEARCHES_TOTAL,
        "provider" => provider.as_str(),
        "outcome" => outcome
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "provider" => provider.as_str()
    )
    .record(latency_ms / 1000.0);
}

/// Record the number of candidates a search produced.
pub fn record_candidates(provider: Provider, count: usize) {
    counter!(
        names::CANDIDATES_TOTAL,
        "provider" => provider.as_str()
    )
    .increment(count as u64);
}

// =============================================================================
// Tests
// =============================================================================
