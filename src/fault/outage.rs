//! Outage lifecycle: a time-driven Normal/Outage state machine behind a
//! shared flag.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::info;

use crate::config::ReceiverConfig;
use crate::telemetry::ReceiverMetrics;

/// Shared outage flag: one periodic writer (the controller), concurrent
/// readers (one per inbound request).
#[derive(Debug, Clone, Default)]
pub struct OutageFlag {
    inner: Arc<RwLock<bool>>,
}

impl OutageFlag {
    /// Create a flag in the Normal (inactive) state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an outage is currently active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        *self.inner.read()
    }

    fn set(&self, active: bool) {
        *self.inner.write() = active;
    }
}

/// Two-state lifecycle loop: Normal for `outage_after`, Outage for
/// `outage_for`, once or repeating. Transitions are strictly time-driven and
/// totally ordered; the request path never writes the flag.
#[derive(Debug)]
pub struct OutageController {
    flag: OutageFlag,
    outage_after: Duration,
    outage_for: Duration,
    repeat: bool,
    metrics: ReceiverMetrics,
}

impl OutageController {
    /// Build a controller over `flag` from the receiver configuration.
    #[must_use]
    pub fn new(cfg: &ReceiverConfig, flag: OutageFlag, metrics: ReceiverMetrics) -> Self {
        Self {
            flag,
            outage_after: cfg.outage_after,
            outage_for: cfg.outage_for,
            repeat: cfg.outage_repeat,
            metrics,
        }
    }

    /// The schedule only runs when both phases have positive duration.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.outage_after.is_zero() && !self.outage_for.is_zero()
    }

    /// Run the lifecycle until the cycle completes (non-repeating) or the
    /// shutdown signal fires. The flag is never left set on exit.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.is_enabled() {
            return;
        }

        self.metrics.set_outage_state(false);

        loop {
            tokio::select! {
                () = sleep(self.outage_after) => {}
                _ = shutdown.recv() => return,
            }

            info!(duration = ?self.outage_for, "outage started");
            self.flag.set(true);
            self.metrics.set_outage_state(true);

            let interrupted = tokio::select! {
                () = sleep(self.outage_for) => false,
                _ = shutdown.recv() => true,
            };

            self.flag.set(false);
            self.metrics.set_outage_state(false);
            info!("outage ended");

            if interrupted || !self.repeat {
                return;
            }
        }
    }
}
