//! NetworkAddonsConfig CRD
//!
//! Cluster-scoped singleton resource declaring which networking addons
//! should be deployed. The operator reads `spec`, renders the matching
//! manifests and reports progress on `status`. It never writes `spec`.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::conditions::Condition;

/// Desired state of the cluster networking addons.
///
/// Every addon field is optional. `None` means "not requested"; an empty
/// sub-configuration requests the addon with defaults. Once an addon has
/// been deployed its sub-configuration becomes immutable (enforced by the
/// operator's change-safety checks, not by the schema).
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "networkaddons.io",
    version = "v1alpha1",
    kind = "NetworkAddonsConfig",
    status = "NetworkAddonsConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddonsConfigSpec {
    /// Multus meta CNI plugin (multiplexed pod networking)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multus: Option<Multus>,

    /// Linux bridge CNI plugin plus the bridge-marker node agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux_bridge: Option<LinuxBridge>,

    /// SR-IOV network device plugin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sriov_device_plugin: Option<SriovDevicePlugin>,

    /// Kubemacpool MAC address range manager
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kube_mac_pool: Option<KubeMacPool>,

    /// Image pull policy applied to every deployed container.
    /// One of `Always`, `Never`, `IfNotPresent`. Empty means "keep the
    /// previously deployed value, or IfNotPresent on first deployment".
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_pull_policy: String,
}

/// Multus sub-configuration. Carries no tunables today; presence alone
/// requests the addon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Multus {}

/// Linux bridge sub-configuration. Presence alone requests the addon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LinuxBridge {}

/// SR-IOV device plugin sub-configuration. Presence alone requests the addon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SriovDevicePlugin {}

/// Kubemacpool sub-configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeMacPool {
    /// First MAC address of the managed pool, e.g. `02:00:00:00:00:00`.
    /// Defaulted together with `rangeEnd` when both are unset.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range_start: String,

    /// Last MAC address of the managed pool.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub range_end: String,
}

/// Observed state reported by the operator. The operator is the sole
/// writer of this block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkAddonsConfigStatus {
    /// Version of the running operator binary, set once at startup.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub operator_version: String,

    /// Version whose manifests were last fully applied and cleaned up.
    /// Only advances to `target_version` after a complete successful pass.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub observed_version: String,

    /// Version the operator is currently driving the cluster towards.
    /// Set immediately when a spec change is picked up.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub target_version: String,

    /// Available / Progressing / Degraded condition records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,

    /// Container images currently deployed by the operator.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<DeployedContainer>,
}

/// One container deployed on behalf of the configuration, as reported in
/// `status.containers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeployedContainer {
    /// Namespace of the workload object owning the container
    pub namespace: String,
    /// Kind of the owning workload object (DaemonSet, Deployment, ...)
    pub parent_kind: String,
    /// Name of the owning workload object
    pub parent_name: String,
    /// Container name
    pub name: String,
    /// Container image reference
    pub image: String,
}
