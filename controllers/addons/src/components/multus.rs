//! Multus component handler.
//!
//! Multus carries no tunables; presence of the sub-configuration alone
//! requests the addon, so validation and defaulting have nothing to do.

use crds::NetworkAddonsConfigSpec;
use kube::core::DynamicObject;
use render::{RenderData, RenderError};

use super::{change_safe_subconfig, LegacyIdentity};
use crate::cluster_info::ClusterInfo;
use crate::config::OperatorConfig;
use crate::error::ConfigError;

/// Old releases deployed the multus daemon set under `extensions/v1beta1`.
pub(super) const LEGACY_IDENTITY: LegacyIdentity = LegacyIdentity {
    group: "extensions",
    version: "v1beta1",
    kind: "DaemonSet",
    name: "kube-multus-ds-amd64",
    namespace: None,
};

pub(super) fn validate(_spec: &NetworkAddonsConfigSpec) -> Vec<ConfigError> {
    Vec::new()
}

pub(super) fn fill_defaults(
    _next: &mut NetworkAddonsConfigSpec,
    _previous: Option<&NetworkAddonsConfigSpec>,
) -> Vec<ConfigError> {
    Vec::new()
}

pub(super) fn change_safe(
    previous: &NetworkAddonsConfigSpec,
    next: &NetworkAddonsConfigSpec,
) -> Vec<ConfigError> {
    change_safe_subconfig(&previous.multus, &next.multus, "Multus")
}

pub(super) fn render(
    spec: &NetworkAddonsConfigSpec,
    operator_config: &OperatorConfig,
    cluster_info: &ClusterInfo,
) -> Result<Vec<DynamicObject>, RenderError> {
    if spec.multus.is_none() {
        return Ok(Vec::new());
    }

    let mut data = RenderData::new();
    data.insert_str("namespace", &operator_config.operand_namespace);
    data.insert_str("multus_image", &operator_config.multus_image);
    data.insert_str("image_pull_policy", &spec.image_pull_policy);
    data.insert_str("cni_bin_dir", cluster_info.cni_bin_dir());
    data.insert_bool("enable_scc", cluster_info.scc_available);

    render::render_dir(&operator_config.manifest_dir.join("multus"), &data)
}
