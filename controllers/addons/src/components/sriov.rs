//! SR-IOV device plugin component handler.

use crds::NetworkAddonsConfigSpec;
use kube::core::DynamicObject;
use render::{RenderData, RenderError};

use super::{change_safe_subconfig, LegacyIdentity};
use crate::cluster_info::ClusterInfo;
use crate::config::OperatorConfig;
use crate::error::ConfigError;

/// Old releases deployed the device plugin under `extensions/v1beta1`.
pub(super) const LEGACY_IDENTITY: LegacyIdentity = LegacyIdentity {
    group: "extensions",
    version: "v1beta1",
    kind: "DaemonSet",
    name: "kube-sriov-device-plugin",
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
    change_safe_subconfig(
        &previous.sriov_device_plugin,
        &next.sriov_device_plugin,
        "SR-IOV device plugin",
    )
}

pub(super) fn render(
    spec: &NetworkAddonsConfigSpec,
    operator_config: &OperatorConfig,
    cluster_info: &ClusterInfo,
) -> Result<Vec<DynamicObject>, RenderError> {
    if spec.sriov_device_plugin.is_none() {
        return Ok(Vec::new());
    }

    let mut data = RenderData::new();
    data.insert_str("namespace", &operator_config.operand_namespace);
    data.insert_str(
        "sriov_device_plugin_image",
        &operator_config.sriov_device_plugin_image,
    );
    data.insert_str("image_pull_policy", &spec.image_pull_policy);
    data.insert_bool("enable_scc", cluster_info.scc_available);

    render::render_dir(
        &operator_config.manifest_dir.join("sriov-device-plugin"),
        &data,
    )
}
