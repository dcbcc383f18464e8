//! Prometheus metrics registration and recording.
//!
//! The `metrics` facade is installed once at startup with a Prometheus
//! recorder; `GET /metrics` renders the handle. `SenderMetrics` and
//! `ReceiverMetrics` are thin recording façades so the generator and the
//! fault pipeline never touch metric names directly.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::outcome::Outcome;
use crate::{Error, Result};

/// Install the global Prometheus recorder and return the exposition handle.
///
/// # Errors
///
/// Fails if a global recorder is already installed.
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::Telemetry(e.to_string()))
}

/// Sender-side metrics: outcome counts, response latency, in-flight gauge.
#[derive(Debug, Clone, Copy, Default)]
pub struct SenderMetrics;

impl SenderMetrics {
    /// Register help text for all sender metrics.
    pub fn describe() {
        describe_counter!(
            "faultline_sender_requests_total",
            "Completed sender requests by outcome"
        );
        describe_histogram!(
            "faultline_sender_response_seconds",
            "HTTP request latency distribution"
        );
        describe_gauge!(
            "faultline_sender_inflight",
            "Number of currently in-flight requests"
        );
    }

    /// Count one completed request under its outcome label.
    pub fn record_outcome(self, outcome: Outcome) {
        counter!("faultline_sender_requests_total", "outcome" => outcome.as_str()).increment(1);
    }

    /// Observe one request latency in seconds.
    pub fn observe_response_time(self, seconds: f64) {
        histogram!("faultline_sender_response_seconds").record(seconds);
    }

    /// Mark one more request in flight. Observability only, never flow control.
    pub fn inflight_inc(self) {
        gauge!("faultline_sender_inflight").increment(1.0);
    }

    /// Mark one request as completed, success or failure.
    pub fn inflight_dec(self) {
        gauge!("faultline_sender_inflight").decrement(1.0);
    }
}

/// Receiver-side metrics: outcome counts, handler time, outage state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReceiverMetrics;

impl ReceiverMetrics {
    /// Register help text for all receiver metrics.
    pub fn describe() {
        describe_counter!(
            "faultline_receiver_requests_total",
            "Received requests by outcome"
        );
        describe_histogram!(
            "faultline_receiver_handler_seconds",
            "Handler execution time distribution"
        );
        describe_gauge!(
            "faultline_receiver_outage_state",
            "Current outage state (0=normal, 1=outage)"
        );
    }

    /// Count one inbound request under its outcome label.
    pub fn record_outcome(self, outcome: Outcome) {
        counter!("faultline_receiver_requests_total", "outcome" => outcome.as_str()).increment(1);
    }

    /// Observe handler time in seconds, measured from pipeline entry.
    ///
    /// Only responding branches observe this; blocked requests never complete.
    pub fn observe_handler_time(self, seconds: f64) {
        histogram!("faultline_receiver_handler_seconds").record(seconds);
    }

    /// Set the outage-state gauge. Written by the outage controller only.
    pub fn set_outage_state(self, active: bool) {
        gauge!("faultline_receiver_outage_state").set(if active { 1.0 } else { 0.0 });
    }
}
