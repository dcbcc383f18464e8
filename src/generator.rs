//! Paced request generation for sender mode.
//!
//! A fixed-interval ticker dispatches one send per tick without waiting for
//! prior dispatches to finish. Concurrency is unbounded on purpose: the timer
//! never skips a tick because older requests are still in flight, so the
//! long-run rate holds even when the receiver stalls.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::config::SenderConfig;
use crate::outcome::Outcome;
use crate::telemetry::SenderMetrics;
use crate::{Error, Result};

/// Fixed inter-request interval for a given rate.
#[must_use]
pub fn request_interval(requests_per_second: f64) -> Duration {
    Duration::from_secs_f64(1.0 / requests_per_second)
}

/// Run the generation loop until the shutdown signal fires.
///
/// Waits `start_delay` first (cancellable), then ticks every
/// `1 / requests_per_second` seconds, the first tick one full interval after
/// start. In-flight dispatches are not aborted on shutdown; they run to their
/// own timeout.
///
/// # Errors
///
/// Returns an error only if the HTTP client cannot be built; per-request
/// failures are classified and counted, never escalated.
pub async fn run(
    cfg: &SenderConfig,
    metrics: SenderMetrics,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    if !cfg.start_delay.is_zero() {
        info!(delay = ?cfg.start_delay, "waiting before starting");
        tokio::select! {
            () = time::sleep(cfg.start_delay) => {}
            _ = shutdown.recv() => return Ok(()),
        }
    }

    let client = build_client(cfg)?;
    let interval = request_interval(cfg.requests_per_second);
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let target = format!("http://{}:{}/inbox", cfg.receiver_host, cfg.receiver_port);
    info!(url = %target, rps = cfg.requests_per_second, "starting request generation");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let client = client.clone();
                let target = target.clone();
                tokio::spawn(async move {
                    dispatch(&client, &target, metrics).await;
                });
            }
            _ = shutdown.recv() => {
                info!("stopping request generation");
                return Ok(());
            }
        }
    }
}

fn build_client(cfg: &SenderConfig) -> Result<Client> {
    let mut builder = Client::builder();
    // Zero means no client timeout.
    if !cfg.request_timeout.is_zero() {
        builder = builder.timeout(cfg.request_timeout);
    }
    builder.build().map_err(Error::from)
}

/// Send one request, record latency and outcome.
async fn dispatch(client: &Client, target: &str, metrics: SenderMetrics) {
    metrics.inflight_inc();

    let start = Instant::now();
    let outcome = send(client, target).await;

    metrics.observe_response_time(start.elapsed().as_secs_f64());
    metrics.record_outcome(outcome);
    metrics.inflight_dec();

    debug!(url = target, outcome = %outcome, "request completed");
}

async fn send(client: &Client, target: &str) -> Outcome {
    match client.post(target).send().await {
        Ok(resp) => {
            let status = resp.status();
            // Drain and discard the body before classifying.
            let _ = resp.bytes().await;
            classify_status(status)
        }
        Err(e) => classify_error(&e),
    }
}

/// Map a response status to its outcome.
#[must_use]
pub fn classify_status(status: StatusCode) -> Outcome {
    match status {
        StatusCode::OK => Outcome::Success,
        StatusCode::INTERNAL_SERVER_ERROR => Outcome::ServerError,
        _ => Outcome::OtherError,
    }
}

/// Map a client error to its outcome.
#[must_use]
pub fn classify_error(err: &reqwest::Error) -> Outcome {
    if err.is_timeout() {
        Outcome::Timeout
    } else if err.is_connect() {
        Outcome::ConnectionError
    } else {
        Outcome::OtherError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_is_inverse_of_rate() {
        assert_eq!(request_interval(1.0), Duration::from_secs(1));
        assert_eq!(request_interval(0.5), Duration::from_secs(2));
        assert_eq!(request_interval(20.0), Duration::from_millis(50));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(StatusCode::OK), Outcome::Success);
        assert_eq!(
            classify_status(StatusCode::INTERNAL_SERVER_ERROR),
            Outcome::ServerError
        );
        assert_eq!(classify_status(StatusCode::NOT_FOUND), Outcome::OtherError);
        assert_eq!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE),
            Outcome::OtherError
        );
        assert_eq!(classify_status(StatusCode::CREATED), Outcome::OtherError);
    }

    #[tokio::test]
    async fn test_connection_errors_classify_as_connection() {
        let client = Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .expect("client");
        // Nothing listens on this port.
        let err = client
            .post("http://127.0.0.1:9/inbox")
            .send()
            .await
            .expect_err("connect must fail");
        assert_eq!(classify_error(&err), Outcome::ConnectionError);
    }
}
