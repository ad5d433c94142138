//! Metrics and health endpoint.
//!
//! Runs as an independently lifecycled background task with explicit
//! start/stop and its own error channel, outside the reconciliation
//! loop's concurrency domain.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::ControllerError;

/// Operator metrics registered on a private registry.
pub struct Metrics {
    registry: Registry,
    /// 1 when the last reconcile pass fully succeeded, 0 otherwise
    ready: IntGauge,
    /// Total reconcile passes started
    reconcile_total: IntCounter,
    /// Total reconcile passes that hit a blocking failure
    reconcile_failures_total: IntCounter,
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates and registers the operator metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let ready = IntGauge::new(
            "network_addons_ready",
            "Whether the last reconcile pass fully succeeded",
        )?;
        let reconcile_total = IntCounter::new(
            "network_addons_reconcile_total",
            "Total number of reconcile passes started",
        )?;
        let reconcile_failures_total = IntCounter::new(
            "network_addons_reconcile_failures_total",
            "Total number of reconcile passes that hit a blocking failure",
        )?;

        registry.register(Box::new(ready.clone()))?;
        registry.register(Box::new(reconcile_total.clone()))?;
        registry.register(Box::new(reconcile_failures_total.clone()))?;

        Ok(Self {
            registry,
            ready,
            reconcile_total,
            reconcile_failures_total,
        })
    }

    /// Counts one reconcile pass.
    pub fn reconcile_started(&self) {
        self.reconcile_total.inc();
    }

    /// Records a blocking reconcile failure.
    pub fn reconcile_failed(&self) {
        self.ready.set(0);
        self.reconcile_failures_total.inc();
    }

    /// Records a fully successful reconcile pass.
    pub fn reconcile_succeeded(&self) {
        self.ready.set(1);
    }

    /// Renders the registry in the prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer)
            .map_err(|e| prometheus::Error::Msg(format!("metrics are not valid UTF-8: {e}")))
    }
}

/// Serves `/metrics` and `/healthz` until stopped.
#[derive(Debug)]
pub struct MonitoringServer;

/// Handle to a running monitoring task.
#[derive(Debug)]
pub struct MonitoringHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    errors: mpsc::Receiver<ControllerError>,
}

impl MonitoringServer {
    /// Starts the endpoint as a background task. Failures surface on the
    /// handle's error channel, never by tearing down the process.
    pub fn start(addr: SocketAddr, metrics: Arc<Metrics>) -> MonitoringHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (error_tx, errors) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            if let Err(e) = serve(addr, metrics, shutdown_rx).await {
                let _ = error_tx.send(e).await;
            }
        });

        MonitoringHandle {
            shutdown: Some(shutdown_tx),
            task,
            errors,
        }
    }
}

impl MonitoringHandle {
    /// Stops the endpoint and reports any failure it hit while running.
    pub async fn stop(&mut self) -> Result<(), ControllerError> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| ControllerError::Monitoring(format!("monitoring task panicked: {e}")))?;
        match self.errors.try_recv() {
            Ok(e) => Err(e),
            Err(_) => Ok(()),
        }
    }
}

async fn serve(
    addr: SocketAddr,
    metrics: Arc<Metrics>,
    shutdown: oneshot::Receiver<()>,
) -> Result<(), ControllerError> {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(metrics);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ControllerError::Monitoring(format!("failed to bind {addr}: {e}")))?;
    info!("Serving metrics on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.await;
        })
        .await
        .map_err(|e| ControllerError::Monitoring(e.to_string()))
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    match metrics.encode() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn healthz_handler() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_expose_expected_families() {
        let metrics = Metrics::new().expect("metrics should register");
        metrics.reconcile_started();
        metrics.reconcile_succeeded();

        let body = metrics.encode().expect("encode should succeed");
        assert!(body.contains("network_addons_ready 1"));
        assert!(body.contains("network_addons_reconcile_total 1"));
    }

    #[test]
    fn test_failure_clears_ready_gauge() {
        let metrics = Metrics::new().expect("metrics should register");
        metrics.reconcile_succeeded();
        metrics.reconcile_failed();

        let body = metrics.encode().expect("encode should succeed");
        assert!(body.contains("network_addons_ready 0"));
        assert!(body.contains("network_addons_reconcile_failures_total 1"));
    }

    #[tokio::test]
    async fn test_start_and_stop() {
        let metrics = Arc::new(Metrics::new().expect("metrics should register"));
        let addr: SocketAddr = "127.0.0.1:0".parse().expect("static addr");
        let mut handle = MonitoringServer::start(addr, metrics);

        // Give the listener a moment to come up, then shut down cleanly.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        handle.stop().await.expect("clean shutdown");
    }
}
