//! ClusterInfo probe.
//!
//! Inspects API discovery once per reconcile and produces a small fact
//! sheet consumed by rendering. Facts are recomputed every pass and never
//! persisted.

use kube::Client;
use kube::discovery::Discovery;

use crate::error::ControllerError;

/// Host path CNI binaries are installed into on plain Kubernetes.
pub const CNI_BIN_DIR: &str = "/opt/cni/bin";
/// Host path CNI binaries are installed into on OpenShift 4.
pub const CNI_BIN_DIR_OPENSHIFT4: &str = "/var/lib/cni/bin";

/// Derived cluster facts consumed by the renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClusterInfo {
    /// Cluster runs the OpenShift 4 platform flavor
    pub openshift4: bool,
    /// SecurityContextConstraints API is available
    pub scc_available: bool,
}

impl ClusterInfo {
    /// CNI plugin installation path for this platform flavor.
    pub fn cni_bin_dir(&self) -> &'static str {
        if self.openshift4 {
            CNI_BIN_DIR_OPENSHIFT4
        } else {
            CNI_BIN_DIR
        }
    }
}

/// Probes the cluster for platform facts via API discovery.
pub async fn probe(client: &Client) -> Result<ClusterInfo, ControllerError> {
    let discovery = Discovery::new(client.clone()).run().await?;

    let openshift4 = discovery.groups().any(|g| g.name() == "config.openshift.io");
    let scc_available = discovery
        .groups()
        .any(|g| g.name() == "security.openshift.io");

    Ok(ClusterInfo {
        openshift4,
        scc_available,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cni_bin_dir_follows_platform_flavor() {
        let plain = ClusterInfo {
            openshift4: false,
            scc_available: false,
        };
        assert_eq!(plain.cni_bin_dir(), CNI_BIN_DIR);

        let openshift = ClusterInfo {
            openshift4: true,
            scc_available: true,
        };
        assert_eq!(openshift.cni_bin_dir(), CNI_BIN_DIR_OPENSHIFT4);
    }
}
