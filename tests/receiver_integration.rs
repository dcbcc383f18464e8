//! End-to-end tests for receiver mode: the fault pipeline and the outage
//! lifecycle observed through a real HTTP client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::PrometheusBuilder;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use faultline::config::ReceiverConfig;
use faultline::fault::{OutageController, OutageFlag};
use faultline::server::{self, InboxState};
use faultline::telemetry::ReceiverMetrics;

/// Bind a receiver on an ephemeral port and return its address.
async fn spawn_receiver(cfg: ReceiverConfig) -> (SocketAddr, broadcast::Sender<()>) {
    let handle = PrometheusBuilder::new().build_recorder().handle();
    let metrics = ReceiverMetrics;
    let outage = OutageFlag::new();

    let (shutdown_tx, _) = broadcast::channel(1);

    let controller = OutageController::new(&cfg, outage.clone(), metrics);
    if controller.is_enabled() {
        tokio::spawn(controller.run(shutdown_tx.subscribe()));
    }

    let state = Arc::new(InboxState {
        faults: cfg,
        outage,
        metrics,
    });
    let router = server::receiver_router(handle, state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");

    let mut rx = shutdown_tx.subscribe();
    tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await
    });

    (addr, shutdown_tx)
}

fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("client")
}

#[tokio::test]
async fn certain_error_rate_always_responds_500() {
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        error_rate: 1.0,
        ..ReceiverConfig::default()
    })
    .await;
    let client = client(Duration::from_secs(2));

    for _ in 0..10 {
        let resp = client
            .post(format!("http://{addr}/inbox"))
            .send()
            .await
            .expect("response");
        assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.text().await.expect("body"), "error");
    }
}

#[tokio::test]
async fn no_faults_always_responds_200() {
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig::default()).await;
    let client = client(Duration::from_secs(2));

    for _ in 0..10 {
        let resp = client
            .post(format!("http://{addr}/inbox"))
            .send()
            .await
            .expect("response");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "ok");
    }
}

#[tokio::test]
async fn response_waits_at_least_the_base_delay() {
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        response_delay: Duration::from_millis(150),
        response_jitter: Duration::from_millis(100),
        ..ReceiverConfig::default()
    })
    .await;
    let client = client(Duration::from_secs(5));

    for _ in 0..5 {
        let start = Instant::now();
        let resp = client
            .post(format!("http://{addr}/inbox"))
            .send()
            .await
            .expect("response");
        let elapsed = start.elapsed();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(
            elapsed >= Duration::from_millis(150),
            "responded after {elapsed:?}, before the base delay"
        );
        // Delay + jitter upper bound, with scheduling slack.
        assert!(
            elapsed < Duration::from_millis(1000),
            "responded after {elapsed:?}, far beyond delay + jitter"
        );
    }
}

#[tokio::test]
async fn certain_hang_rate_never_responds() {
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        hang_rate: 1.0,
        ..ReceiverConfig::default()
    })
    .await;
    let client = client(Duration::from_millis(300));

    for _ in 0..3 {
        let err = client
            .post(format!("http://{addr}/inbox"))
            .send()
            .await
            .expect_err("hung request must time out client-side");
        assert!(err.is_timeout(), "expected timeout, got {err}");
    }
}

#[tokio::test]
async fn health_endpoints_are_unaffected_by_hangs() {
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        hang_rate: 1.0,
        response_delay: Duration::from_secs(10),
        ..ReceiverConfig::default()
    })
    .await;
    let client = client(Duration::from_millis(500));

    let resp = client
        .get(format!("http://{addr}/healthz"))
        .send()
        .await
        .expect("healthz");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ok");

    let resp = client
        .get(format!("http://{addr}/readyz"))
        .send()
        .await
        .expect("readyz");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(resp.text().await.expect("body"), "ready");

    let resp = client
        .get(format!("http://{addr}/metrics"))
        .send()
        .await
        .expect("metrics");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn single_outage_window_blocks_then_recovers_permanently() {
    let started = Instant::now();
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        outage_after: Duration::from_millis(500),
        outage_for: Duration::from_millis(800),
        outage_repeat: false,
        ..ReceiverConfig::default()
    })
    .await;
    let url = format!("http://{addr}/inbox");

    // Before the outage begins: normal rules apply.
    let resp = client(Duration::from_millis(300))
        .post(&url)
        .send()
        .await
        .expect("pre-outage response");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "probe landed after the outage began; timing too tight"
    );

    // Inside the outage window: no response, ever.
    tokio::time::sleep(Duration::from_millis(700).saturating_sub(started.elapsed())).await;
    let err = client(Duration::from_millis(250))
        .post(&url)
        .send()
        .await
        .expect_err("request during outage must never get a response");
    assert!(err.is_timeout(), "expected timeout, got {err}");

    // After the window: recovered, and permanently so (repeat is off).
    tokio::time::sleep(Duration::from_millis(1600).saturating_sub(started.elapsed())).await;
    for _ in 0..3 {
        let resp = client(Duration::from_millis(500))
            .post(&url)
            .send()
            .await
            .expect("post-outage response");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[tokio::test]
async fn repeating_outage_cycles_with_stable_period() {
    let started = Instant::now();
    let (addr, _shutdown) = spawn_receiver(ReceiverConfig {
        outage_after: Duration::from_millis(400),
        outage_for: Duration::from_millis(400),
        outage_repeat: true,
        ..ReceiverConfig::default()
    })
    .await;
    let url = format!("http://{addr}/inbox");

    // Period is 800ms: normal [0,400), outage [400,800), normal [800,1200), ...
    // Second cycle's normal phase.
    tokio::time::sleep(Duration::from_millis(900).saturating_sub(started.elapsed())).await;
    let resp = client(Duration::from_millis(200))
        .post(&url)
        .send()
        .await
        .expect("second normal phase");
    assert_eq!(resp.status(), reqwest::StatusCode::OK);

    // Second cycle's outage phase.
    tokio::time::sleep(Duration::from_millis(1450).saturating_sub(started.elapsed())).await;
    let err = client(Duration::from_millis(200))
        .post(&url)
        .send()
        .await
        .expect_err("second outage window must block");
    assert!(err.is_timeout(), "expected timeout, got {err}");
}
