//! Prometheus metrics for the execution core.
//!
//! Exposed series: attempts placed, fills, cancels, taker fallbacks,
//! throttle events and utilization per channel, and acquire wait times.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

use crate::admission::Channel;
use crate::models::OrderKind;

/// Metrics initialization errors.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Failed to install the Prometheus recorder/listener.
    #[error("failed to install metrics exporter: {0}")]
    Installation(String),
}

/// Install the Prometheus exporter with an HTTP listener.
///
/// # Errors
///
/// Returns [`MetricsError::Installation`] if the listener cannot bind or
/// a recorder is already installed.
pub fn init_metrics(listen_addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %listen_addr, "Prometheus metrics exporter started");
    Ok(())
}

/// Record an order attempt placement.
pub fn record_attempt(kind: OrderKind) {
    counter!("execution_attempts_total", "kind" => kind.to_string()).increment(1);
}

/// Record a fill (full or partial) against an attempt.
pub fn record_fill(notional_usd: Decimal) {
    counter!("execution_fills_total").increment(1);
    histogram!("execution_fill_notional_usd").record(notional_usd.to_f64().unwrap_or(0.0));
}

/// Record an order cancel.
pub fn record_cancel() {
    counter!("execution_cancels_total").increment(1);
}

/// Record a taker fallback escalation.
pub fn record_taker_fallback() {
    counter!("execution_taker_fallbacks_total").increment(1);
}

/// Record a terminal target outcome.
pub fn record_target_outcome(status: &str) {
    counter!("execution_targets_total", "status" => status.to_string()).increment(1);
}

/// Record an admission acquire that had to wait.
pub fn record_throttle(channel: Channel) {
    counter!("admission_throttle_events_total", "channel" => channel.as_str()).increment(1);
}

/// Record the wait time of an admission acquire.
pub fn record_acquire_wait(channel: Channel, waited: Duration) {
    histogram!("admission_acquire_wait_seconds", "channel" => channel.as_str())
        .record(waited.as_secs_f64());
}

/// Record bucket utilization after an acquire.
pub fn record_channel_utilization(channel: Channel, utilization: f64) {
    gauge!("admission_channel_utilization", "channel" => channel.as_str()).set(utilization);
}
