//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): handled requests by outcome
//! - `proxy_cache_hits_total` (counter): 304 revalidations served from cache
//! - `proxy_cache_entries` (gauge): entries held by the cache store
//! - `proxy_cache_snapshots_total` (counter): snapshot attempts by result
//! - `proxy_journal_failures_total` (counter): journal lines that failed to write
//! - `proxy_active_sessions` (gauge): open client connections
//!
//! The `metrics` facade is a no-op until a recorder is installed, so these
//! helpers are safe to call from tests.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request and how it was resolved.
pub fn record_request(outcome: &'static str) {
    metrics::counter!("proxy_requests_total", "outcome" => outcome).increment(1);
}

pub fn record_cache_hit() {
    metrics::counter!("proxy_cache_hits_total").increment(1);
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("proxy_cache_entries").set(entries as f64);
}

pub fn record_snapshot(success: bool) {
    let result = if success { "ok" } else { "error" };
    metrics::counter!("proxy_cache_snapshots_total", "result" => result).increment(1);
}

pub fn record_journal_failure() {
    metrics::counter!("proxy_journal_failures_total").increment(1);
}

pub fn record_active_sessions(count: u64) {
    metrics::gauge!("proxy_active_sessions").set(count as f64);
}
