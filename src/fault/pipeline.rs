//! Per-request fault decision.

use std::time::Duration;

use rand::{Rng, RngExt};

use crate::config::ReceiverConfig;
use crate::outcome::Outcome;

/// The fate of one inbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultDecision {
    /// Suspend the handler forever; no response is ever written.
    Block(Outcome),
    /// Respond with `outcome` after sleeping `delay`.
    Respond {
        /// Sleep before responding; zero means respond immediately.
        delay: Duration,
        /// `Success` (200 "ok") or `ServerError` (500 "error").
        outcome: Outcome,
    },
}

/// Decide the fate of one inbound request.
///
/// Deterministic priority order, first match wins:
/// outage, hang, delay application, error, success. The hang and error draws
/// are independent; hang is checked first and is terminal, so a request can
/// hang or error but never both. An active outage wins over everything.
pub fn decide<R: Rng + ?Sized>(
    cfg: &ReceiverConfig,
    outage_active: bool,
    rng: &mut R,
) -> FaultDecision {
    if outage_active {
        return FaultDecision::Block(Outcome::Outage);
    }

    if rng.random::<f64>() < cfg.hang_rate {
        return FaultDecision::Block(Outcome::Hang);
    }

    let mut delay = cfg.response_delay;
    if !cfg.response_jitter.is_zero() {
        let jitter_ns = rng.random_range(0..duration_nanos(cfg.response_jitter));
        delay += Duration::from_nanos(jitter_ns);
    }

    let outcome = if rng.random::<f64>() < cfg.error_rate {
        Outcome::ServerError
    } else {
        Outcome::Success
    };

    FaultDecision::Respond { delay, outcome }
}

fn duration_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
