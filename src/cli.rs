//! Command-line interface

use std::path::PathBuf;

use clap::Parser;

use crate::config::Mode;

/// Two-sided HTTP traffic tool for resilience testing
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "FAULTLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Operating mode (sender, receiver); overrides the config file
    #[arg(short, long, env = "FAULTLINE_MODE", value_enum)]
    pub mode: Option<Mode>,

    /// Host to bind to
    #[arg(long, env = "FAULTLINE_HOST")]
    pub host: Option<String>,

    /// Port to listen on (overrides the active mode's configured port)
    #[arg(short, long, env = "FAULTLINE_PORT")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "FAULTLINE_LOG_LEVEL")]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "FAULTLINE_LOG_FORMAT")]
    pub log_format: Option<String>,
}
