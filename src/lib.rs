//! Faultline Library
//!
//! Two-sided HTTP traffic tool for resilience testing.
//!
//! One binary, two modes:
//!
//! - **Sender**: dispatches synthetic `POST /inbox` traffic at a fixed rate
//!   and classifies every outcome (success, server error, timeout,
//!   connection error, other).
//! - **Receiver**: serves `/inbox` behind a fault-injection pipeline —
//!   scheduled outages, probabilistic hangs, delay plus jitter, and
//!   probabilistic server errors — to exercise a client's failure handling.
//!
//! Both modes expose `/healthz`, `/readyz`, and Prometheus `/metrics`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fault;
pub mod generator;
pub mod outcome;
pub mod server;
pub mod telemetry;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
