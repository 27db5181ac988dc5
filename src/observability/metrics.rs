//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by route, method, status.
//!   Methods outside GET/POST/OPTIONS are labelled `other`.
//! - `proxy_request_duration_seconds` (histogram): latency by route
//! - `proxy_upstream_failures_total` (counter): transport failures by route
//! - `proxy_forbidden_total` (counter): allowlist rejections
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Bounded label for a request method; clients may send any token.
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::OPTIONS => "OPTIONS",
        _ => "other",
    }
}

pub fn record_request(route: &'static str, method: &Method, status: u16, start: Instant) {
    ::metrics::counter!(
        "proxy_requests_total",
        "route" => route,
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("proxy_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_upstream_failure(route: &'static str) {
    ::metrics::counter!("proxy_upstream_failures_total", "route" => route).increment(1);
}

pub fn record_forbidden() {
    ::metrics::counter!("proxy_forbidden_total").increment(1);
}
