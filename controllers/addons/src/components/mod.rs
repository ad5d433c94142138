//! Component handler registry.
//!
//! Every deployable addon is one variant of the closed [`Component`] enum,
//! implementing the validate / fill-defaults / change-safety / render /
//! cleanup contract over its own slice of the configuration. The registry
//! is the fixed, ordered [`Component::ALL`] array; there is no runtime
//! handler lookup.
//!
//! The global image pull policy participates in the pipeline through the
//! [`image_pull_policy`] module but deploys nothing of its own.

pub mod image_pull_policy;
pub mod kubemacpool;
pub mod linux_bridge;
pub mod multus;
pub mod sriov;

#[cfg(test)]
mod components_test;

use crds::NetworkAddonsConfigSpec;
use kube::api::{Api, DeleteParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::Client;
use render::RenderError;
use tracing::{info, warn};

use crate::cluster_info::ClusterInfo;
use crate::config::OperatorConfig;
use crate::error::{ConfigError, ControllerError};

/// Label stamped on every object the operator renders. The operator is
/// the sole writer of objects carrying it.
pub const MANAGED_BY_LABEL: &str = "networkaddons.io/managed-by";
/// Value of [`MANAGED_BY_LABEL`].
pub const MANAGED_BY_VALUE: &str = "network-addons-operator";

/// One deployable addon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Multus meta CNI plugin
    Multus,
    /// Linux bridge CNI plugin and bridge-marker
    LinuxBridge,
    /// SR-IOV network device plugin
    SriovDevicePlugin,
    /// Kubemacpool MAC range manager
    KubeMacPool,
}

/// API identity a prior release used for one of this component's objects.
/// Consumed only by cleanup; never rendered or applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyIdentity {
    /// API group of the legacy object
    pub group: &'static str,
    /// API version of the legacy object
    pub version: &'static str,
    /// Kind of the legacy object
    pub kind: &'static str,
    /// Fixed object name used by the old release
    pub name: &'static str,
    /// Fixed namespace used by the old release; `None` means the operand
    /// namespace of the running operator
    pub namespace: Option<&'static str>,
}

impl Component {
    /// The fixed, ordered registry of all component handlers.
    pub const ALL: [Component; 4] = [
        Component::Multus,
        Component::LinuxBridge,
        Component::SriovDevicePlugin,
        Component::KubeMacPool,
    ];

    /// Component name, also the manifest template subdirectory name.
    pub fn name(self) -> &'static str {
        match self {
            Component::Multus => "multus",
            Component::LinuxBridge => "linux-bridge",
            Component::SriovDevicePlugin => "sriov-device-plugin",
            Component::KubeMacPool => "kubemacpool",
        }
    }

    /// Structural and semantic checks on this component's sub-configuration.
    /// Returns one error per distinct violation, never stopping at the first.
    pub fn validate(self, spec: &NetworkAddonsConfigSpec) -> Vec<ConfigError> {
        match self {
            Component::Multus => multus::validate(spec),
            Component::LinuxBridge => linux_bridge::validate(spec),
            Component::SriovDevicePlugin => sriov::validate(spec),
            Component::KubeMacPool => kubemacpool::validate(spec),
        }
    }

    /// Replaces unset fields in `next`, preferring the previously deployed
    /// value over the hard-coded default. Idempotent.
    pub fn fill_defaults(
        self,
        next: &mut NetworkAddonsConfigSpec,
        previous: Option<&NetworkAddonsConfigSpec>,
    ) -> Vec<ConfigError> {
        match self {
            Component::Multus => multus::fill_defaults(next, previous),
            Component::LinuxBridge => linux_bridge::fill_defaults(next, previous),
            Component::SriovDevicePlugin => sriov::fill_defaults(next, previous),
            Component::KubeMacPool => kubemacpool::fill_defaults(next, previous),
        }
    }

    /// Rejects modifications to fields that are immutable once the
    /// component has been deployed.
    pub fn change_safe(
        self,
        previous: &NetworkAddonsConfigSpec,
        next: &NetworkAddonsConfigSpec,
    ) -> Vec<ConfigError> {
        match self {
            Component::Multus => multus::change_safe(previous, next),
            Component::LinuxBridge => linux_bridge::change_safe(previous, next),
            Component::SriovDevicePlugin => sriov::change_safe(previous, next),
            Component::KubeMacPool => kubemacpool::change_safe(previous, next),
        }
    }

    /// Renders this component's manifests. An absent sub-configuration
    /// yields an empty set and no error. Every produced object carries the
    /// management label.
    pub fn render(
        self,
        spec: &NetworkAddonsConfigSpec,
        operator_config: &OperatorConfig,
        cluster_info: &ClusterInfo,
    ) -> Result<Vec<DynamicObject>, RenderError> {
        let mut objects = match self {
            Component::Multus => multus::render(spec, operator_config, cluster_info),
            Component::LinuxBridge => linux_bridge::render(spec, operator_config, cluster_info),
            Component::SriovDevicePlugin => sriov::render(spec, operator_config, cluster_info),
            Component::KubeMacPool => kubemacpool::render(spec, operator_config, cluster_info),
        }?;

        for object in &mut objects {
            object
                .metadata
                .labels
                .get_or_insert_with(Default::default)
                .insert(MANAGED_BY_LABEL.to_string(), MANAGED_BY_VALUE.to_string());
        }

        Ok(objects)
    }

    /// The API identity an older release used for this component, if any.
    pub fn legacy_identity(self) -> Option<LegacyIdentity> {
        match self {
            Component::Multus => Some(multus::LEGACY_IDENTITY),
            Component::LinuxBridge => Some(linux_bridge::LEGACY_IDENTITY),
            Component::SriovDevicePlugin => Some(sriov::LEGACY_IDENTITY),
            Component::KubeMacPool => None,
        }
    }

    /// Best-effort removal of objects created by earlier releases under an
    /// API identity this release no longer uses.
    ///
    /// NotFound and unregistered kinds count as already clean. Delete
    /// failures are logged and swallowed; transient lookup failures are
    /// returned so the caller can log them, but nothing here blocks the
    /// rest of the reconcile pass.
    pub async fn cleanup(self, client: &Client, operand_namespace: &str) -> Vec<ControllerError> {
        let Some(identity) = self.legacy_identity() else {
            return Vec::new();
        };

        let namespace = identity.namespace.unwrap_or(operand_namespace);
        let gvk = GroupVersionKind::gvk(identity.group, identity.version, identity.kind);
        let ar = ApiResource::from_gvk(&gvk);
        let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, &ar);

        match api.get(identity.name).await {
            Ok(_) => {
                info!(
                    "Found legacy {} {}/{} from an older release, deleting it",
                    identity.kind, namespace, identity.name
                );
                if let Err(e) = api.delete(identity.name, &DeleteParams::default()).await {
                    // Kept best-effort without retry: the next pass will see
                    // the object again if the delete did not stick.
                    warn!(
                        "Failed cleaning up legacy {} {}/{}: {}",
                        identity.kind, namespace, identity.name, e
                    );
                }
                Vec::new()
            }
            Err(e) if is_absent(&e) => Vec::new(),
            Err(e) => vec![ControllerError::Kube(e)],
        }
    }
}

/// Treats NotFound and unregistered-kind responses as "already clean".
fn is_absent(err: &kube::Error) -> bool {
    match err {
        kube::Error::Api(response) => response.code == 404,
        _ => false,
    }
}

/// Shared change-safety rule for components whose whole sub-configuration
/// is immutable once deployed: any difference from the previously
/// deployed value, including removal, is rejected.
fn change_safe_subconfig<T: PartialEq>(
    previous: &Option<T>,
    next: &Option<T>,
    component: &str,
) -> Vec<ConfigError> {
    match previous {
        Some(deployed) if next.as_ref() != Some(deployed) => vec![ConfigError::Immutability(
            format!("cannot modify {component} configuration once it is deployed"),
        )],
        _ => Vec::new(),
    }
}
