//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the cluster
//! client, the reconciler and the resource watcher together for the
//! Network Addons Controller.

use std::sync::Arc;

use crds::NetworkAddonsConfig;
use kube::{Api, Client};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::OperatorConfig;
use crate::error::ControllerError;
use crate::monitoring::Metrics;
use crate::reconciler::Reconciler;
use crate::watcher::Watcher;

/// Main controller for network addons management.
pub struct Controller {
    config_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance.
    pub async fn new(
        operator_config: OperatorConfig,
        metrics: Arc<Metrics>,
    ) -> Result<Self, ControllerError> {
        info!("Initializing Network Addons Controller");

        let client = Client::try_default().await?;
        let config_api: Api<NetworkAddonsConfig> = Api::all(client.clone());

        let reconciler = Arc::new(Reconciler::new(client, operator_config, metrics));
        let watcher_instance = Arc::new(Watcher::new(Arc::clone(&reconciler), config_api));

        let config_watcher = {
            let watcher = Arc::clone(&watcher_instance);
            tokio::spawn(async move { watcher.watch_configs().await })
        };

        Ok(Self { config_watcher })
    }

    /// Runs the controller until shutdown.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Network Addons Controller running");

        tokio::select! {
            result = &mut self.config_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("NetworkAddonsConfig watcher panicked: {e}")))?
                    .map_err(|e| ControllerError::Watch(format!("NetworkAddonsConfig watcher error: {e}")))?;
            }
        }

        Ok(())
    }
}
