//! HTTP server: routing, health endpoints, graceful shutdown.

mod inbox;

pub use inbox::{InboxState, inbox_handler};

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::State,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::time;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::{Error, Result};

/// How long after the shutdown signal open connections may keep draining.
/// Hung inbox handlers never finish on their own; they are aborted when this
/// elapses.
const DRAIN_GRACE: Duration = Duration::from_secs(5);

/// Router for sender mode: observability endpoints only.
pub fn sender_router(handle: PrometheusHandle) -> Router {
    common_router(handle)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Router for receiver mode: the fault-injecting inbox plus observability.
pub fn receiver_router(handle: PrometheusHandle, state: Arc<InboxState>) -> Router {
    Router::new()
        .route("/inbox", post(inbox_handler))
        .with_state(state)
        .merge(common_router(handle))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
}

/// Routes present in every mode: liveness, readiness, metrics exposition.
/// Unaffected by simulated outages, hangs, and delays.
fn common_router(handle: PrometheusHandle) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(handle)
}

async fn healthz_handler() -> &'static str {
    "ok"
}

async fn readyz_handler() -> &'static str {
    "ready"
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// Bind `addr` and serve `router` until the shutdown signal fires.
///
/// On shutdown the listener stops accepting and existing connections drain;
/// after [`DRAIN_GRACE`] any still-open connections (deliberately hung
/// handlers included) are dropped.
///
/// # Errors
///
/// Bind and listener failures are fatal and propagate to process exit.
pub async fn serve(
    addr: SocketAddr,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Transport(format!("bind {addr}: {e}")))?;

    info!(%addr, "server listening");

    let graceful = {
        let mut rx = shutdown.resubscribe();
        async move {
            let _ = rx.recv().await;
            info!("shutting down server");
        }
    };

    let serve_fut = axum::serve(listener, router)
        .with_graceful_shutdown(graceful)
        .into_future();

    tokio::select! {
        result = serve_fut => {
            result.map_err(|e| Error::Transport(e.to_string()))?;
        }
        () = async {
            let _ = shutdown.recv().await;
            time::sleep(DRAIN_GRACE).await;
        } => {
            info!("drain grace period elapsed, dropping open connections");
        }
    }

    info!("server stopped");
    Ok(())
}
