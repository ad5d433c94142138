//! Reconcile pass orchestration.
//!
//! One pass runs validate → default → change-safety → render → apply →
//! cleanup → status update for the configuration resource. The pass is
//! synchronous per invocation; serialization of concurrent passes for the
//! same resource is the watch loop's job, not ours.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crds::{
    DeployedContainer, NetworkAddonsConfig, NetworkAddonsConfigSpec, NetworkAddonsConfigStatus,
};
use kube::api::{Api, Patch, PatchParams};
use kube::core::DynamicObject;
use kube::{Client, ResourceExt};
use kube_runtime::controller::Action;
use tracing::{debug, error, info, warn};

use crate::apply::Applier;
use crate::cluster_info;
use crate::components::Component;
use crate::config::OperatorConfig;
use crate::error::{join_errors, ControllerError};
use crate::monitoring::Metrics;
use crate::pipeline;
use crate::status::{self, StatusManager};

/// Annotation on the config resource holding the previously applied spec
/// as JSON. Written only after a fully successful pass; seeds defaulting
/// and change-safety on the next one.
pub const APPLIED_CONFIGURATION_ANNOTATION: &str = "networkaddons.io/applied-configuration";

/// Interval between voluntary re-reconciles of a healthy config.
const RESYNC_PERIOD: Duration = Duration::from_secs(600);

/// Reconciles NetworkAddonsConfig resources into deployed addons.
pub struct Reconciler {
    client: Client,
    config_api: Api<NetworkAddonsConfig>,
    status: StatusManager,
    operator_config: OperatorConfig,
    metrics: Arc<Metrics>,
}

impl Reconciler {
    /// Creates a reconciler bound to the given cluster client.
    pub fn new(client: Client, operator_config: OperatorConfig, metrics: Arc<Metrics>) -> Self {
        Self {
            config_api: Api::all(client.clone()),
            status: StatusManager::new(client.clone()),
            client,
            operator_config,
            metrics,
        }
    }

    /// Runs one full reconcile pass for the given config.
    pub async fn reconcile_config(
        &self,
        config: Arc<NetworkAddonsConfig>,
    ) -> Result<Action, ControllerError> {
        let name = config.name_any();
        info!("Reconciling NetworkAddonsConfig {}", name);
        self.metrics.reconcile_started();

        let mut status = config.status.clone().unwrap_or_default();
        let persisted_status = status.clone();
        status.operator_version = self.operator_config.operator_version.clone();

        let previous = previous_spec(&config);
        let mut next = config.spec.clone();

        // Validate / default / change-safety across the whole registry.
        // Any error leaves the cluster untouched; these are user-caused
        // and requeueing cannot fix them.
        let errors = pipeline::run(previous.as_ref(), &mut next);
        if !errors.is_empty() {
            let message = join_errors(&errors);
            warn!("Refusing to deploy invalid configuration: {}", message);
            status::mark_degraded(&mut status, status::REASON_FAILED_VALIDATION, &message);
            self.status.persist(&name, &status).await?;
            self.metrics.reconcile_failed();
            return Ok(Action::await_change());
        }

        // A periodic resync of an already-deployed spec only repairs
        // drift; it is not a rollout, so Progressing must not flip and
        // the applied-configuration annotation needs no rewrite.
        let resync = is_periodic_resync(
            previous.as_ref(),
            &next,
            &status,
            &self.operator_config.operator_version,
        );
        if !resync {
            status::mark_progressing(&mut status, &self.operator_config.operator_version);
            self.status.persist(&name, &status).await?;
        }

        let cluster_info = cluster_info::probe(&self.client).await?;
        debug!(
            "Cluster facts: openshift4={} scc_available={}",
            cluster_info.openshift4, cluster_info.scc_available
        );

        // Render components independently so one failing template does
        // not take the remaining components down with it.
        let mut desired = Vec::new();
        let mut render_failures = Vec::new();
        for component in Component::ALL {
            match component.render(&next, &self.operator_config, &cluster_info) {
                Ok(objects) => desired.extend(objects),
                Err(e) => render_failures.push(format!("{}: {}", component.name(), e)),
            }
        }

        if let Some(duplicate) = find_duplicate_identity(&desired) {
            let message = format!("duplicate object identity rendered: {duplicate}");
            error!("{}", message);
            status::mark_degraded(&mut status, status::REASON_FAILED_RENDER, &message);
            self.status.persist(&name, &status).await?;
            self.metrics.reconcile_failed();
            return Ok(Action::await_change());
        }

        let applier = Applier::new(self.client.clone());
        match applier.apply_all(&desired).await {
            Ok(mutations) => {
                debug!("Applied {} objects, {} mutated", desired.len(), mutations);
            }
            Err(e) => {
                error!("Failed to apply rendered objects: {}", e);
                status::mark_degraded(&mut status, status::REASON_FAILED_APPLY, &e.to_string());
                self.status.persist(&name, &status).await?;
                self.metrics.reconcile_failed();
                // Transient cluster-store failure: surface it so the watch
                // loop requeues with backoff.
                return Err(e);
            }
        }

        // Cleanup is best-effort across the whole registry; nothing here
        // may block the rest of the pass.
        for component in Component::ALL {
            for e in component
                .cleanup(&self.client, &self.operator_config.operand_namespace)
                .await
            {
                warn!("Cleanup of {} left work behind: {}", component.name(), e);
            }
        }

        if !render_failures.is_empty() {
            let message = render_failures.join("; ");
            error!("Rendering failed: {}", message);
            status::mark_degraded(&mut status, status::REASON_FAILED_RENDER, &message);
            self.status.persist(&name, &status).await?;
            self.metrics.reconcile_failed();
            return Ok(Action::await_change());
        }

        // The pass went through completely; only now may the observed
        // version advance and the applied spec be remembered. Writes are
        // skipped when nothing changed, so a steady-state resync performs
        // zero mutating calls against the config resource.
        if !resync {
            self.store_applied_configuration(&name, &next).await?;
        }
        status::mark_ready(&mut status, collect_deployed_containers(&desired));
        if status != persisted_status {
            self.status.persist(&name, &status).await?;
        }
        self.metrics.reconcile_succeeded();
        info!(
            "Reconciled {} to version {}",
            name, status.observed_version
        );
        Ok(Action::requeue(RESYNC_PERIOD))
    }

    /// Remembers the applied spec on the config resource for the next pass.
    async fn store_applied_configuration(
        &self,
        name: &str,
        spec: &NetworkAddonsConfigSpec,
    ) -> Result<(), ControllerError> {
        let applied = serde_json::to_string(spec)?;
        let patch = serde_json::json!({
            "metadata": {
                "annotations": { APPLIED_CONFIGURATION_ANNOTATION: applied }
            }
        });
        self.config_api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}

/// True when a pass re-reconciles a spec that is already fully deployed:
/// the defaulted spec matches the previously applied one and the
/// operator's version has been observed. Such a pass still renders and
/// applies (drift repair) but leaves Progressing and the
/// applied-configuration annotation alone.
pub fn is_periodic_resync(
    previous: Option<&NetworkAddonsConfigSpec>,
    next: &NetworkAddonsConfigSpec,
    status: &NetworkAddonsConfigStatus,
    operator_version: &str,
) -> bool {
    previous == Some(next) && status.observed_version == operator_version
}

/// Parses the previously applied spec from the config's annotation.
///
/// A corrupt annotation is treated as "never deployed": defaulting falls
/// back to hard-coded values and change-safety is skipped, which matches
/// a fresh installation.
pub fn previous_spec(config: &NetworkAddonsConfig) -> Option<NetworkAddonsConfigSpec> {
    let applied = config
        .metadata
        .annotations
        .as_ref()?
        .get(APPLIED_CONFIGURATION_ANNOTATION)?;

    match serde_json::from_str(applied) {
        Ok(spec) => Some(spec),
        Err(e) => {
            warn!(
                "Ignoring unparseable applied-configuration annotation: {}",
                e
            );
            None
        }
    }
}

/// Returns the identity of the first object rendered more than once, if any.
pub fn find_duplicate_identity(objects: &[DynamicObject]) -> Option<String> {
    let mut seen = HashSet::new();
    for object in objects {
        let types = object
            .types
            .as_ref()
            .map(|t| format!("{}/{}", t.api_version, t.kind))
            .unwrap_or_default();
        let identity = format!(
            "{} {}/{}",
            types,
            object.metadata.namespace.as_deref().unwrap_or(""),
            object.metadata.name.as_deref().unwrap_or(""),
        );
        if !seen.insert(identity.clone()) {
            return Some(identity);
        }
    }
    None
}

/// Collects the container images deployed by the rendered workload
/// objects, reported in `status.containers`.
pub fn collect_deployed_containers(objects: &[DynamicObject]) -> Vec<DeployedContainer> {
    let mut containers = Vec::new();

    for object in objects {
        let Some(types) = object.types.as_ref() else {
            continue;
        };
        if !matches!(types.kind.as_str(), "DaemonSet" | "Deployment" | "StatefulSet") {
            continue;
        }

        let parent_name = object.metadata.name.clone().unwrap_or_default();
        let namespace = object.metadata.namespace.clone().unwrap_or_default();

        let rendered = &object.data;
        let Some(container_list) = rendered
            .get("spec")
            .and_then(|s| s.get("template"))
            .and_then(|t| t.get("spec"))
            .and_then(|s| s.get("containers"))
            .and_then(|c| c.as_array())
        else {
            continue;
        };

        for container in container_list {
            let name = container
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or_default();
            let image = container
                .get("image")
                .and_then(|i| i.as_str())
                .unwrap_or_default();
            containers.push(DeployedContainer {
                namespace: namespace.clone(),
                parent_kind: types.kind.clone(),
                parent_name: parent_name.clone(),
                name: name.to_string(),
                image: image.to_string(),
            });
        }
    }

    containers
}
