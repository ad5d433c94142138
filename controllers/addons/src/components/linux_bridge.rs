//! Linux bridge component handler.
//!
//! Deploys the linux bridge CNI plugin installer and the bridge-marker
//! node agent. Presence of the sub-configuration alone requests the
//! addon.

use crds::NetworkAddonsConfigSpec;
use kube::core::DynamicObject;
use render::{RenderData, RenderError};

use super::{change_safe_subconfig, LegacyIdentity};
use crate::cluster_info::ClusterInfo;
use crate::config::OperatorConfig;
use crate::error::ConfigError;

/// Releases before the apps/v1 migration deployed bridge-marker as an
/// `extensions/v1beta1` daemon set in its own fixed namespace. Updates
/// cannot cross that API identity change, so the old object is deleted
/// explicitly.
pub(super) const LEGACY_IDENTITY: LegacyIdentity = LegacyIdentity {
    group: "extensions",
    version: "v1beta1",
    kind: "DaemonSet",
    name: "bridge-marker",
    namespace: Some("linux-bridge"),
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
    change_safe_subconfig(&previous.linux_bridge, &next.linux_bridge, "Linux Bridge")
}

pub(super) fn render(
    spec: &NetworkAddonsConfigSpec,
    operator_config: &OperatorConfig,
    cluster_info: &ClusterInfo,
) -> Result<Vec<DynamicObject>, RenderError> {
    if spec.linux_bridge.is_none() {
        return Ok(Vec::new());
    }

    let mut data = RenderData::new();
    data.insert_str("namespace", &operator_config.operand_namespace);
    data.insert_str("linux_bridge_cni_image", &operator_config.linux_bridge_cni_image);
    data.insert_str(
        "linux_bridge_marker_image",
        &operator_config.linux_bridge_marker_image,
    );
    data.insert_str("image_pull_policy", &spec.image_pull_policy);
    data.insert_str("cni_bin_dir", cluster_info.cni_bin_dir());
    data.insert_bool("enable_scc", cluster_info.scc_available);

    render::render_dir(&operator_config.manifest_dir.join("linux-bridge"), &data)
}
