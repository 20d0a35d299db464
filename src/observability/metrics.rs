//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_redirects_total` (counter): legacy and canonical redirects by reason
//! - `router_rejections_total` (counter): 400 responses by reason
//! - `slug_cache_lookups_total` (counter): slug lookups by tier (request, external, computed)
//! - `slug_cache_entries` (gauge): entries held by the in-process cache
//! - `router_requests_total` (counter): HTTP responses by method and status
//! - `router_request_duration_seconds` (histogram): HTTP latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Starts the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_redirect(reason: &'static str) {
    ::metrics::counter!("router_redirects_total", "reason" => reason).increment(1);
}

pub fn record_rejection(reason: &'static str) {
    ::metrics::counter!("router_rejections_total", "reason" => reason).increment(1);
}

pub fn record_slug_lookup(tier: &'static str) {
    ::metrics::counter!("slug_cache_lookups_total", "tier" => tier).increment(1);
}

pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("slug_cache_entries").set(entries as f64);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "router_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "router_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
