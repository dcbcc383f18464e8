//! Fault injection: the per-request decision pipeline and the outage
//! lifecycle.
//!
//! The pipeline decides the fate of each inbound request in a fixed priority
//! order (outage, hang, delay, error, success). The outage controller is an
//! isolated time-driven task that flips a shared flag the pipeline reads; the
//! two communicate through that flag and nothing else.

mod outage;
mod pipeline;

pub use outage::{OutageController, OutageFlag};
pub use pipeline::{FaultDecision, decide};
