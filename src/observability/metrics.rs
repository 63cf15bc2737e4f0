//! Metrics collection and exposition.
//!
//! # Metrics
//! - `swap_stage_total` (counter): workflow stage outcomes by stage, outcome
//! - `swap_aggregator_request_duration_seconds` (histogram): latency by endpoint
//! - `swap_rpc_healthy` (gauge): 1=reachable, 0=unreachable
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Count one workflow stage outcome.
pub fn record_stage(stage: &'static str, outcome: &'static str) {
    counter!("swap_stage_total", "stage" => stage, "outcome" => outcome).increment(1);
}

/// Record the latency of one aggregator request.
pub fn record_aggregator_request(endpoint: &'static str, start: Instant) {
    histogram!("swap_aggregator_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// Record RPC reachability.
pub fn record_rpc_health(healthy: bool) {
    gauge!("swap_rpc_healthy").set(if healthy { 1.0 } else { 0.0 });
}
