//! Metrics collection and exposition.
//!
//! # Metrics
//! - `capture_connections_accepted_total` (counter)
//! - `capture_accept_errors_total` (counter)
//! - `capture_records_total` (counter): one per successful read
//! - `capture_bytes_total` (counter): bytes handed to the record sink
//! - `capture_sessions_closed_total{outcome}` (counter): timeout, eof, error
//! - `capture_active_sessions` (gauge): current live-set size
//!
//! Without an installed recorder every call here is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const CONNECTIONS_ACCEPTED: &str = "capture_connections_accepted_total";
pub const ACCEPT_ERRORS: &str = "capture_accept_errors_total";
pub const RECORDS: &str = "capture_records_total";
pub const BYTES: &str = "capture_bytes_total";
pub const SESSIONS_CLOSED: &str = "capture_sessions_closed_total";
pub const ACTIVE_SESSIONS: &str = "capture_active_sessions";

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_accept() {
    metrics::counter!(CONNECTIONS_ACCEPTED).increment(1);
}

pub fn record_accept_error() {
    metrics::counter!(ACCEPT_ERRORS).increment(1);
}

pub fn record_capture(bytes: usize) {
    metrics::counter!(RECORDS).increment(1);
    metrics::counter!(BYTES).increment(bytes as u64);
}

pub fn session_opened() {
    metrics::gauge!(ACTIVE_SESSIONS).increment(1.0);
}

pub fn session_released() {
    metrics::gauge!(ACTIVE_SESSIONS).decrement(1.0);
}

pub fn session_closed(outcome: &'static str) {
    metrics::counter!(SESSIONS_CLOSED, "outcome" => outcome).increment(1);
}
