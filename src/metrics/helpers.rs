//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    OPTION_CACHE_HITS_TOTAL, OPTION_CACHE_MISSES_TOTAL, PLACEHOLDERS_RESOLVED_TOTAL,
    PLACEHOLDERS_UNRESOLVED_TOTAL, RENDERS_TOTAL, RENDER_DURATION,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording render metrics
pub struct RenderMetrics;

impl RenderMetrics {
    pub fn record_success(elapsed: Duration) {
        RENDERS_TOTAL.with_label_values(&["success"]).inc();
        RENDER_DURATION.observe(elapsed.as_secs_f64());
    }

    pub fn record_failure() {
        RENDERS_TOTAL.with_label_values(&["failed"]).inc();
    }

    /// Record a substituted placeholder (field, record_url, ref_record_url, related)
    pub fn record_placeholder(directive: &str) {
        PLACEHOLDERS_RESOLVED_TOTAL
            .with_label_values(&[directive])
            .inc();
    }

    pub fn record_unresolved() {
        PLACEHOLDERS_UNRESOLVED_TOTAL.inc();
    }
}

/// Helper struct for recording option label cache metrics
pub struct CacheMetrics;

impl CacheMetrics {
    pub fn record_hit() {
        OPTION_CACHE_HITS_TOTAL.inc();
    }

    pub fn record_miss() {
        OPTION_CACHE_MISSES_TOTAL.inc();
    }
}
