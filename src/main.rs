//! Faultline - two-sided HTTP traffic tool for resilience testing.
//!
//! Sender mode generates paced synthetic load; receiver mode injects faults.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::broadcast;
use tokio::task::JoinError;
use tracing::{error, info};

use faultline::{
    Error,
    cli::Cli,
    config::{Config, Mode},
    fault::{OutageController, OutageFlag},
    generator,
    server::{self, InboxState},
    telemetry::{self, ReceiverMetrics, SenderMetrics},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing
    if let Err(e) = faultline::setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    // Load configuration and apply CLI overrides
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mode = match config.validate() {
        Ok(mode) => mode,
        Err(e) => {
            error!("Invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        mode = %mode,
        "starting faultline"
    );

    let handle = match telemetry::install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            error!("Failed to install metrics recorder: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Process-wide shutdown fan-out
    let (shutdown_tx, _) = broadcast::channel(1);
    tokio::spawn(signal_listener(shutdown_tx.clone()));

    let result = match mode {
        Mode::Sender => run_sender(&config, handle, &shutdown_tx).await,
        Mode::Receiver => run_receiver(&config, handle, &shutdown_tx).await,
    };

    match result {
        Ok(()) => {
            info!("shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("runtime error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load configuration and fold in CLI overrides.
fn load_config(cli: &Cli) -> faultline::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;

    if let Some(mode) = cli.mode {
        config.mode = Some(mode);
    }
    if let Some(ref host) = cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        match config.mode {
            Some(Mode::Sender) => config.sender.port = port,
            Some(Mode::Receiver) => config.receiver.port = port,
            None => {}
        }
    }

    Ok(config)
}

/// Run sender mode: observability server plus the request generator.
/// Terminates when either finishes or the shutdown signal fires.
async fn run_sender(
    config: &Config,
    handle: PrometheusHandle,
    shutdown: &broadcast::Sender<()>,
) -> faultline::Result<()> {
    SenderMetrics::describe();
    let metrics = SenderMetrics;

    let addr = bind_addr(&config.host, config.sender.port)?;
    let router = server::sender_router(handle);

    let mut server_task = tokio::spawn(server::serve(addr, router, shutdown.subscribe()));

    let gen_cfg = config.sender.clone();
    let gen_shutdown = shutdown.subscribe();
    let mut generator_task =
        tokio::spawn(async move { generator::run(&gen_cfg, metrics, gen_shutdown).await });

    tokio::select! {
        result = &mut server_task => flatten_join(result),
        result = &mut generator_task => flatten_join(result),
    }
}

/// Run receiver mode: outage controller plus the fault-injecting server.
async fn run_receiver(
    config: &Config,
    handle: PrometheusHandle,
    shutdown: &broadcast::Sender<()>,
) -> faultline::Result<()> {
    ReceiverMetrics::describe();
    let metrics = ReceiverMetrics;

    let outage = OutageFlag::new();
    let controller = OutageController::new(&config.receiver, outage.clone(), metrics);
    if controller.is_enabled() {
        info!(
            after = ?config.receiver.outage_after,
            duration = ?config.receiver.outage_for,
            repeat = config.receiver.outage_repeat,
            "outage schedule enabled"
        );
        tokio::spawn(controller.run(shutdown.subscribe()));
    }

    let state = Arc::new(InboxState {
        faults: config.receiver.clone(),
        outage,
        metrics,
    });

    let addr = bind_addr(&config.host, config.receiver.port)?;
    let router = server::receiver_router(handle, state);

    server::serve(addr, router, shutdown.subscribe()).await
}

fn bind_addr(host: &str, port: u16) -> faultline::Result<SocketAddr> {
    let ip = host
        .parse()
        .map_err(|e| Error::Config(format!("invalid host {host:?}: {e}")))?;
    Ok(SocketAddr::new(ip, port))
}

fn flatten_join(result: Result<faultline::Result<()>, JoinError>) -> faultline::Result<()> {
    result.map_err(|e| Error::Internal(e.to_string()))?
}

/// Wait for SIGINT or SIGTERM, then broadcast shutdown.
async fn signal_listener(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}
