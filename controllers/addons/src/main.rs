//! Network Addons Controller
//!
//! Reconciles the cluster-scoped `NetworkAddonsConfig` resource into a set
//! of deployed networking addons (multus, linux-bridge, SR-IOV device
//! plugin, kubemacpool), keeping deployed state aligned with declared
//! desired state across operator upgrades.

mod apply;
mod cluster_info;
mod components;
mod config;
mod controller;
mod error;
mod monitoring;
mod pipeline;
mod reconciler;
mod status;
mod watcher;

#[cfg(test)]
mod status_test;

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::OperatorConfig;
use crate::controller::Controller;
use crate::error::ControllerError;
use crate::monitoring::{Metrics, MonitoringServer};

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Pin the rustls crypto provider before any TLS connection is made
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| ControllerError::InvalidConfig("failed to install rustls crypto provider".to_string()))?;

    info!("Starting Network Addons Controller");

    // Load configuration from environment variables, fixed for process lifetime
    let operator_config = OperatorConfig::from_env()?;
    info!("Configuration:");
    info!("  Operator version: {}", operator_config.operator_version);
    info!("  Operand namespace: {}", operator_config.operand_namespace);
    info!("  Manifest dir: {}", operator_config.manifest_dir.display());

    // Metrics endpoint runs as its own background task, outside the
    // reconciliation loop's concurrency domain
    let metrics = Arc::new(Metrics::new().map_err(|e| ControllerError::Monitoring(e.to_string()))?);
    let mut monitoring = MonitoringServer::start(operator_config.metrics_bind_address, Arc::clone(&metrics));

    // Initialize and run controller
    let controller = Controller::new(operator_config, Arc::clone(&metrics)).await?;
    let result = controller.run().await;

    if let Err(e) = monitoring.stop().await {
        warn!("Monitoring endpoint did not shut down cleanly: {}", e);
    }

    result
}
