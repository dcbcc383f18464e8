//! Configuration management

use std::{fmt, path::Path, time::Duration};

use clap::ValueEnum;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Operating mode: one binary, two roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Generate paced load against the receiver.
    Sender,
    /// Accept load and inject faults.
    Receiver,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sender => f.write_str("sender"),
            Self::Receiver => f.write_str("receiver"),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Operating mode; required, no default.
    pub mode: Option<Mode>,
    /// Host to bind the HTTP server to
    pub host: String,
    /// Sender configuration
    pub sender: SenderConfig,
    /// Receiver configuration
    pub receiver: ReceiverConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: None,
            host: "0.0.0.0".to_string(),
            sender: SenderConfig::default(),
            receiver: ReceiverConfig::default(),
        }
    }
}

/// Sender (load generation) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Port the sender's observability server listens on
    pub port: u16,
    /// Hostname of the receiver to send traffic to
    pub receiver_host: String,
    /// Port of the receiver to send traffic to
    pub receiver_port: u16,
    /// Long-run request rate; the dispatch interval is its inverse
    pub requests_per_second: f64,
    /// Wait before the first tick; cancellable by shutdown
    #[serde(with = "humantime_serde")]
    pub start_delay: Duration,
    /// Upper bound per request; zero means no client timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            receiver_host: "localhost".to_string(),
            receiver_port: 8080,
            requests_per_second: 1.0,
            start_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(2),
        }
    }
}

/// Receiver (fault injection) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Port the receiver listens on
    pub port: u16,
    /// Base delay applied before responding
    #[serde(with = "humantime_serde")]
    pub response_delay: Duration,
    /// Upper bound of additional uniform random delay
    #[serde(with = "humantime_serde")]
    pub response_jitter: Duration,
    /// Probability in [0,1] that a request is left unanswered
    pub hang_rate: f64,
    /// Probability in [0,1] that a request is answered with HTTP 500
    pub error_rate: f64,
    /// Time from controller start (and between cycles) until an outage begins;
    /// zero disables the outage schedule
    #[serde(with = "humantime_serde")]
    pub outage_after: Duration,
    /// Outage duration; zero disables the outage schedule
    #[serde(with = "humantime_serde")]
    pub outage_for: Duration,
    /// Repeat the outage cycle indefinitely
    pub outage_repeat: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            response_delay: Duration::ZERO,
            response_jitter: Duration::ZERO,
            hang_rate: 0.0,
            error_rate: 0.0,
            outage_after: Duration::ZERO,
            outage_for: Duration::ZERO,
            outage_repeat: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Environment variables use the `FAULTLINE_` prefix with `__` as the
    /// section separator, e.g. `FAULTLINE_RECEIVER__ERROR_RATE=0.25`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("FAULTLINE_").split("__"));

        figment.extract().map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate the configuration and resolve the operating mode.
    ///
    /// Fatal at startup: the process must not open any socket with an invalid
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns a `Config` error naming the first invalid value.
    pub fn validate(&self) -> Result<Mode> {
        let Some(mode) = self.mode else {
            return Err(Error::Config(
                "mode is required (sender or receiver)".to_string(),
            ));
        };

        if self.host.trim().is_empty() {
            return Err(Error::Config("host must not be empty".to_string()));
        }

        match mode {
            Mode::Sender => {
                if self.sender.requests_per_second <= 0.0
                    || !self.sender.requests_per_second.is_finite()
                {
                    return Err(Error::Config(format!(
                        "requests_per_second must be a positive finite number, got {}",
                        self.sender.requests_per_second
                    )));
                }
                if self.sender.port == 0 {
                    return Err(Error::Config("sender.port must be nonzero".to_string()));
                }
                if self.sender.receiver_port == 0 {
                    return Err(Error::Config(
                        "sender.receiver_port must be nonzero".to_string(),
                    ));
                }
            }
            Mode::Receiver => {
                if self.receiver.port == 0 {
                    return Err(Error::Config("receiver.port must be nonzero".to_string()));
                }
                validate_rate("hang_rate", self.receiver.hang_rate)?;
                validate_rate("error_rate", self.receiver.error_rate)?;
            }
        }

        Ok(mode)
    }
}

fn validate_rate(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}
