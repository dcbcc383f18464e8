//! Error types for Faultline

use std::io;

use thiserror::Error;

/// Result type alias for Faultline
pub type Result<T> = std::result::Result<T, Error>;

/// Faultline errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telemetry setup error
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Server transport error (bind failure, listener failure)
    #[error("Transport error: {0}")]
    Transport(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
