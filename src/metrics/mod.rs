//! Prometheus metrics for the template engine.
//!
//! This module provides metrics for monitoring template rendering:
//! - Render outcomes and latency
//! - Placeholders resolved by directive kind
//! - Option label cache efficiency

mod helpers;

pub use helpers::{encode_metrics, CacheMetrics, RenderMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter,
    IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "templator";

lazy_static! {
    // ============================================================================
    // Render Metrics
    // ============================================================================

    /// Template renders by outcome (success, failed)
    pub static ref RENDERS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_renders_total", METRIC_PREFIX),
        "Total number of template renders",
        &["outcome"]
    ).unwrap();

    /// Render latency
    pub static ref RENDER_DURATION: Histogram = register_histogram!(
        format!("{}_render_duration_seconds", METRIC_PREFIX),
        "Template render duration in seconds",
        vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]
    ).unwrap();

    /// Placeholders substituted, by directive kind
    pub static ref PLACEHOLDERS_RESOLVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_placeholders_resolved_total", METRIC_PREFIX),
        "Total number of placeholders resolved",
        &["directive"]
    ).unwrap();

    /// Placeholders left in the output because their reference was unset
    pub static ref PLACEHOLDERS_UNRESOLVED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_placeholders_unresolved_total", METRIC_PREFIX),
        "Total number of placeholders left unresolved"
    ).unwrap();

    // ============================================================================
    // Option Label Cache Metrics
    // ============================================================================

    pub static ref OPTION_CACHE_HITS_TOTAL: IntCounter = register_int_counter!(
        format!("{}_option_cache_hits_total", METRIC_PREFIX),
        "Option label lookups served from cache"
    ).unwrap();

    pub static ref OPTION_CACHE_MISSES_TOTAL: IntCounter = register_int_counter!(
        format!("{}_option_cache_misses_total", METRIC_PREFIX),
        "Option label lookups that required a metadata fetch"
    ).unwrap();
}
