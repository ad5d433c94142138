//! Kubernetes resource watcher.
//!
//! Watches the cluster-scoped NetworkAddonsConfig resource and invokes
//! the reconciler via kube_runtime::Controller, which handles automatic
//! reconnection, serializes reconciles per resource, and requeues failed
//! passes with backoff through the error policy.

use std::sync::Arc;
use std::time::Duration;

use crds::NetworkAddonsConfig;
use futures::StreamExt;
use kube::Api;
use kube_runtime::controller::{Action, Config as ControllerConfig};
use kube_runtime::{watcher, Controller};
use tracing::{error, info};

use crate::error::ControllerError;
use crate::reconciler::Reconciler;

/// Watches NetworkAddonsConfig resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    config_api: Api<NetworkAddonsConfig>,
}

async fn reconcile(
    config: Arc<NetworkAddonsConfig>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ControllerError> {
    ctx.reconcile_config(config).await
}

/// Requeue with a flat delay; transient apply failures are expected to
/// clear on their own.
fn error_policy(
    config: Arc<NetworkAddonsConfig>,
    err: &ControllerError,
    _ctx: Arc<Reconciler>,
) -> Action {
    error!(
        "Reconciliation error for NetworkAddonsConfig {:?}: {}",
        config.metadata.name, err
    );
    Action::requeue(Duration::from_secs(30))
}

impl Watcher {
    /// Creates a watcher over the cluster-scoped config API.
    pub fn new(reconciler: Arc<Reconciler>, config_api: Api<NetworkAddonsConfig>) -> Self {
        Self {
            reconciler,
            config_api,
        }
    }

    /// Runs the watch loop until the stream ends.
    ///
    /// Concurrency is pinned to one: the configuration resource is a
    /// cluster singleton and the engine relies on at most one in-flight
    /// reconcile per resource.
    pub async fn watch_configs(&self) -> Result<(), ControllerError> {
        info!("Starting NetworkAddonsConfig watcher");

        let controller_config = ControllerConfig::default()
            .debounce(Duration::from_secs(1))
            .concurrency(1);

        Controller::new(self.config_api.clone(), watcher::Config::default())
            .with_config(controller_config)
            .run(reconcile, error_policy, Arc::clone(&self.reconciler))
            .for_each(|result| async move {
                if let Err(e) = result {
                    error!("Controller error for NetworkAddonsConfig: {}", e);
                }
            })
            .await;

        Ok(())
    }
}
