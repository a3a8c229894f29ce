//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dispatch_routes_total` (counter): routed requests by source (filter, tree) and outcome
//! - `dispatch_cache_lookups_total` (counter): cache lookups by cache and hit/miss
//! - `dispatch_tree_walks_total` (counter): tree resolver invocations
//! - `dispatch_requests_total` (counter): HTTP responses by method and status
//! - `dispatch_request_duration_seconds` (histogram): HTTP handling latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_route(source: &'static str, found: bool) {
    let outcome = if found { "found" } else { "not_found" };
    counter!("dispatch_routes_total", "source" => source, "outcome" => outcome).increment(1);
}

pub fn record_cache_lookup(cache: &'static str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!("dispatch_cache_lookups_total", "cache" => cache, "result" => result).increment(1);
}

pub fn record_tree_walk() {
    counter!("dispatch_tree_walks_total").increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "dispatch_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("dispatch_request_duration_seconds").record(start.elapsed().as_secs_f64());
}
