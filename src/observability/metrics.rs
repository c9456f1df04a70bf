//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): time to response headers
//! - `proxy_upstream_errors_total` (counter): upstream failures by kind, route
//! - `proxy_inflight_relays` (gauge): relays still streaming
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a finished request. `route` is the matched prefix or `"none"`.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// Record an upstream failure (`timeout`, `unavailable`, `invalid_request`).
pub fn record_upstream_error(kind: &'static str, route: &str) {
    ::metrics::counter!("proxy_upstream_errors_total", "kind" => kind, "route" => route.to_string())
        .increment(1);
}

pub fn record_inflight(active: u64) {
    ::metrics::gauge!("proxy_inflight_relays").set(active as f64);
}
