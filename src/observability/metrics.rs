//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gate metrics (requests, compile timing, cache traffic)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `dustgate_requests_total` (counter): proxied requests by method, status
//! - `dustgate_compile_duration_seconds` (histogram): compile latency
//! - `dustgate_template_cache_hits_total` / `_misses_total` (counters)
//! - `dustgate_compile_fallbacks_total` (counter): failed compiles served
//!   as the fallback artifact

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to start metrics endpoint"),
    }
}

/// Record one proxied request.
pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dustgate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!("dustgate_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one compile and its duration.
pub fn record_compile(template: &str, duration: Duration) {
    histogram!(
        "dustgate_compile_duration_seconds",
        "template" => template.to_string(),
    )
    .record(duration.as_secs_f64());
}

pub fn record_cache_hit() {
    counter!("dustgate_template_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("dustgate_template_cache_misses_total").increment(1);
}

/// Record a compile failure recovered by serving the fallback artifact.
pub fn record_fallback() {
    counter!("dustgate_compile_fallbacks_total").increment(1);
}
