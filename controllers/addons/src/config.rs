//! Process-wide operator configuration.
//!
//! All environment lookups happen once here at startup; the resulting
//! struct is passed by reference into rendering so the render path has no
//! hidden global state and is fully testable with injected values.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::ControllerError;

const DEFAULT_MANIFEST_DIR: &str = "data";
const DEFAULT_METRICS_BIND_ADDRESS: &str = "0.0.0.0:8383";

const DEFAULT_MULTUS_IMAGE: &str = "ghcr.io/microscaler/multus:v3.4";
const DEFAULT_LINUX_BRIDGE_CNI_IMAGE: &str = "ghcr.io/microscaler/cni-plugins:v0.8.1";
const DEFAULT_LINUX_BRIDGE_MARKER_IMAGE: &str = "ghcr.io/microscaler/bridge-marker:v0.2.0";
const DEFAULT_SRIOV_DEVICE_PLUGIN_IMAGE: &str = "ghcr.io/microscaler/sriov-device-plugin:v3.1";
const DEFAULT_KUBEMACPOOL_IMAGE: &str = "ghcr.io/microscaler/kubemacpool:v0.5.0";

/// Read-only operator configuration, fixed at process start.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    /// Version of this operator binary; becomes `status.operatorVersion`
    pub operator_version: String,
    /// Namespace the addon workloads are deployed into
    pub operand_namespace: String,
    /// Root of the manifest template tree (one subdirectory per component)
    pub manifest_dir: PathBuf,
    /// Bind address of the prometheus /metrics endpoint
    pub metrics_bind_address: SocketAddr,

    /// Multus container image reference
    pub multus_image: String,
    /// Linux bridge CNI plugins image reference
    pub linux_bridge_cni_image: String,
    /// Bridge-marker node agent image reference
    pub linux_bridge_marker_image: String,
    /// SR-IOV device plugin image reference
    pub sriov_device_plugin_image: String,
    /// Kubemacpool manager image reference
    pub kubemacpool_image: String,
}

impl OperatorConfig {
    /// Loads the configuration from environment variables.
    ///
    /// `OPERATOR_VERSION` and `OPERAND_NAMESPACE` are required; image
    /// references and paths fall back to built-in defaults.
    pub fn from_env() -> Result<Self, ControllerError> {
        let operator_version = env::var("OPERATOR_VERSION").map_err(|_| {
            ControllerError::InvalidConfig(
                "OPERATOR_VERSION environment variable is required".to_string(),
            )
        })?;
        let operand_namespace = env::var("OPERAND_NAMESPACE").map_err(|_| {
            ControllerError::InvalidConfig(
                "OPERAND_NAMESPACE environment variable is required".to_string(),
            )
        })?;

        let metrics_bind_address = env::var("METRICS_BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_METRICS_BIND_ADDRESS.to_string());
        let metrics_bind_address = metrics_bind_address.parse().map_err(|_| {
            ControllerError::InvalidConfig(format!(
                "METRICS_BIND_ADDRESS '{metrics_bind_address}' is not a valid socket address"
            ))
        })?;

        Ok(Self {
            operator_version,
            operand_namespace,
            manifest_dir: env::var("MANIFEST_DIR")
                .unwrap_or_else(|_| DEFAULT_MANIFEST_DIR.to_string())
                .into(),
            metrics_bind_address,
            multus_image: env::var("MULTUS_IMAGE")
                .unwrap_or_else(|_| DEFAULT_MULTUS_IMAGE.to_string()),
            linux_bridge_cni_image: env::var("LINUX_BRIDGE_CNI_IMAGE")
                .unwrap_or_else(|_| DEFAULT_LINUX_BRIDGE_CNI_IMAGE.to_string()),
            linux_bridge_marker_image: env::var("LINUX_BRIDGE_MARKER_IMAGE")
                .unwrap_or_else(|_| DEFAULT_LINUX_BRIDGE_MARKER_IMAGE.to_string()),
            sriov_device_plugin_image: env::var("SRIOV_DEVICE_PLUGIN_IMAGE")
                .unwrap_or_else(|_| DEFAULT_SRIOV_DEVICE_PLUGIN_IMAGE.to_string()),
            kubemacpool_image: env::var("KUBEMACPOOL_IMAGE")
                .unwrap_or_else(|_| DEFAULT_KUBEMACPOOL_IMAGE.to_string()),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> OperatorConfig {
    OperatorConfig {
        operator_version: "0.6.0".to_string(),
        operand_namespace: "network-addons".to_string(),
        manifest_dir: PathBuf::from("data"),
        metrics_bind_address: "127.0.0.1:0".parse().expect("static addr"),
        multus_image: DEFAULT_MULTUS_IMAGE.to_string(),
        linux_bridge_cni_image: DEFAULT_LINUX_BRIDGE_CNI_IMAGE.to_string(),
        linux_bridge_marker_image: DEFAULT_LINUX_BRIDGE_MARKER_IMAGE.to_string(),
        sriov_device_plugin_image: DEFAULT_SRIOV_DEVICE_PLUGIN_IMAGE.to_string(),
        kubemacpool_image: DEFAULT_KUBEMACPOOL_IMAGE.to_string(),
    }
}
