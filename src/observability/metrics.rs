//! Metrics collection and exposition.
//!
//! # Metrics
//! - `upload_tracer_links_total` (counter): link attempts by channel, outcome
//! - `upload_tracer_uploads_total` (counter): producer uploads by mode, status
//! - `upload_tracer_handshakes_total` (counter): webhook handshakes answered
//! - `upload_tracer_request_duration_seconds` (histogram): latency by route, status

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one link attempt on a delivery channel.
pub fn record_link(channel: &'static str, outcome: &'static str) {
    counter!(
        "upload_tracer_links_total",
        "channel" => channel,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record one producer upload.
pub fn record_upload(mode: &'static str, status: &'static str) {
    counter!(
        "upload_tracer_uploads_total",
        "mode" => mode,
        "status" => status
    )
    .increment(1);
}

pub fn record_handshake() {
    counter!("upload_tracer_handshakes_total").increment(1);
}

/// Record a finished HTTP request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    histogram!(
        "upload_tracer_request_duration_seconds",
        "route" => route,
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
