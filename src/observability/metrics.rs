//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by content kind and status
//! - `proxy_request_duration_seconds` (histogram): handler latency by kind
//! - `proxy_links_rewritten_total` (counter): attributes pointed at the proxy

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one finished proxy request.
///
/// `kind` is `html`, `passthrough`, or `error`.
pub fn record_request(kind: &'static str, status: u16, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}
