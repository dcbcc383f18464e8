//! The fault-injecting inbox endpoint.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use tokio::time::sleep;
use tracing::debug;

use crate::config::ReceiverConfig;
use crate::fault::{FaultDecision, OutageFlag, decide};
use crate::outcome::Outcome;
use crate::telemetry::ReceiverMetrics;

/// Shared state for the inbox handler.
#[derive(Debug, Clone)]
pub struct InboxState {
    /// Fault injection parameters, immutable for the process lifetime.
    pub faults: ReceiverConfig,
    /// Outage flag written by the controller.
    pub outage: OutageFlag,
    /// Receiver metrics sink.
    pub metrics: ReceiverMetrics,
}

/// `POST /inbox` — decide and execute exactly one fault outcome.
///
/// Responding branches emit one outcome observation and one handler-time
/// observation; blocking branches emit the outcome only and then never
/// return. The suspended future models a hung peer: it ignores request-local
/// cancellation and is reclaimed when the transport closes the connection or
/// the drain grace elapses at shutdown.
pub async fn inbox_handler(State(state): State<Arc<InboxState>>) -> (StatusCode, &'static str) {
    let start = Instant::now();

    let decision = {
        let mut rng = rand::rng();
        decide(&state.faults, state.outage.is_active(), &mut rng)
    };

    match decision {
        FaultDecision::Block(outcome) => {
            state.metrics.record_outcome(outcome);
            debug!(outcome = %outcome, "request blocked, never responding");
            std::future::pending::<(StatusCode, &'static str)>().await
        }
        FaultDecision::Respond { delay, outcome } => {
            if !delay.is_zero() {
                sleep(delay).await;
            }

            state.metrics.record_outcome(outcome);
            state.metrics.observe_handler_time(start.elapsed().as_secs_f64());
            debug!(outcome = %outcome, "request completed");

            match outcome {
                Outcome::ServerError => (StatusCode::INTERNAL_SERVER_ERROR, "error"),
                _ => (StatusCode::OK, "ok"),
            }
        }
    }
}
