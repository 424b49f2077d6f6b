//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): completed requests by method,
//!   status, service ("none" when no service was reached)
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_service_health` (gauge): 1=healthy, 0=unhealthy
//!
//! # Design Decisions
//! - Low-overhead updates; recording is a no-op until an exporter installs
//! - Labels for method, status code, and target service

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request, whatever its outcome.
pub fn record_request(method: &str, status: u16, service: &str, started: Instant) {
    counter!(
        "gateway_requests_total",
        "method" => method.to_owned(),
        "status" => status.to_string(),
        "service" => service.to_owned()
    )
    .increment(1);

    histogram!(
        "gateway_request_duration_seconds",
        "service" => service.to_owned()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record the latest health probe result for a service.
pub fn record_service_health(service: &str, healthy: bool) {
    gauge!(
        "gateway_service_health",
        "service" => service.to_owned()
    )
    .set(if healthy { 1.0 } else { 0.0 });
}
