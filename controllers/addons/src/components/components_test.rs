//! Component handler tests driven through the real manifest template tree.

use std::path::Path;

use crds::{KubeMacPool, LinuxBridge, Multus, NetworkAddonsConfigSpec, SriovDevicePlugin};
use kube::core::{DynamicObject, ErrorResponse};

use super::{is_absent, Component, MANAGED_BY_LABEL, MANAGED_BY_VALUE};
use crate::cluster_info::ClusterInfo;
use crate::components::kubemacpool::pool;
use crate::config::{self, OperatorConfig};

/// Test configuration pointed at the checked-in manifest tree.
fn manifest_config() -> OperatorConfig {
    let mut config = config::test_config();
    config.manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../data");
    config
}

fn plain_cluster() -> ClusterInfo {
    ClusterInfo {
        openshift4: false,
        scc_available: false,
    }
}

fn openshift_cluster() -> ClusterInfo {
    ClusterInfo {
        openshift4: true,
        scc_available: true,
    }
}

fn object_names(objects: &[DynamicObject]) -> Vec<String> {
    objects
        .iter()
        .filter_map(|o| o.metadata.name.clone())
        .collect()
}

fn rendered_json(objects: &[DynamicObject]) -> String {
    serde_json::to_string(objects).expect("rendered objects serialize")
}

#[test]
fn test_unrequested_component_renders_nothing() {
    let spec = NetworkAddonsConfigSpec::default();
    let config = manifest_config();
    let cluster = plain_cluster();

    for component in Component::ALL {
        let objects = component
            .render(&spec, &config, &cluster)
            .expect("render of an absent sub-configuration must succeed");
        assert!(
            objects.is_empty(),
            "{} rendered objects without being requested",
            component.name()
        );
    }
}

#[test]
fn test_linux_bridge_renders_installer_and_marker() {
    let spec = NetworkAddonsConfigSpec {
        linux_bridge: Some(LinuxBridge {}),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };

    let objects = Component::LinuxBridge
        .render(&spec, &manifest_config(), &plain_cluster())
        .expect("linux-bridge render should succeed");

    let names = object_names(&objects);
    assert!(names.contains(&"linux-bridge-plugin".to_string()));
    assert!(names.contains(&"bridge-marker".to_string()));

    for object in &objects {
        let labels = object
            .metadata
            .labels
            .as_ref()
            .expect("every rendered object carries labels");
        assert_eq!(
            labels.get(MANAGED_BY_LABEL).map(String::as_str),
            Some(MANAGED_BY_VALUE),
            "{:?} missing the management label",
            object.metadata.name
        );
    }
}

#[test]
fn test_render_substitutes_operand_namespace() {
    let spec = NetworkAddonsConfigSpec {
        multus: Some(Multus {}),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };
    let config = manifest_config();

    let objects = Component::Multus
        .render(&spec, &config, &plain_cluster())
        .expect("multus render should succeed");
    assert!(!objects.is_empty());

    let namespaced: Vec<_> = objects
        .iter()
        .filter_map(|o| o.metadata.namespace.as_deref())
        .collect();
    assert!(!namespaced.is_empty());
    assert!(namespaced.iter().all(|ns| *ns == config.operand_namespace));
}

#[test]
fn test_scc_rendered_only_when_api_available() {
    let spec = NetworkAddonsConfigSpec {
        multus: Some(Multus {}),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };
    let config = manifest_config();

    let plain = Component::Multus
        .render(&spec, &config, &plain_cluster())
        .expect("render should succeed");
    assert!(!rendered_json(&plain).contains("SecurityContextConstraints"));

    let openshift = Component::Multus
        .render(&spec, &config, &openshift_cluster())
        .expect("render should succeed");
    assert!(rendered_json(&openshift).contains("SecurityContextConstraints"));
    assert!(openshift.len() > plain.len());
}

#[test]
fn test_cni_bin_dir_follows_cluster_flavor() {
    let spec = NetworkAddonsConfigSpec {
        multus: Some(Multus {}),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };
    let config = manifest_config();

    let plain = Component::Multus
        .render(&spec, &config, &plain_cluster())
        .expect("render should succeed");
    assert!(rendered_json(&plain).contains("/opt/cni/bin"));

    let openshift = Component::Multus
        .render(&spec, &config, &openshift_cluster())
        .expect("render should succeed");
    assert!(rendered_json(&openshift).contains("/var/lib/cni/bin"));
}

#[test]
fn test_sriov_renders_config_and_daemon_set() {
    let spec = NetworkAddonsConfigSpec {
        sriov_device_plugin: Some(SriovDevicePlugin {}),
        image_pull_policy: "Always".to_string(),
        ..Default::default()
    };

    let objects = Component::SriovDevicePlugin
        .render(&spec, &manifest_config(), &plain_cluster())
        .expect("sriov render should succeed");

    let names = object_names(&objects);
    assert!(names.contains(&"sriovdp-config".to_string()));
    assert!(names.contains(&"kube-sriov-device-plugin".to_string()));
    assert!(rendered_json(&objects).contains("\"imagePullPolicy\":\"Always\""));
}

#[test]
fn test_kubemacpool_renders_range_into_config() {
    let spec = NetworkAddonsConfigSpec {
        kube_mac_pool: Some(pool("02:00:00:00:00:00", "02:00:00:00:10:00")),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };

    let objects = Component::KubeMacPool
        .render(&spec, &manifest_config(), &plain_cluster())
        .expect("kubemacpool render should succeed");

    let names = object_names(&objects);
    assert!(names.contains(&"kubemacpool-mac-range-config".to_string()));
    assert!(names.contains(&"kubemacpool-mac-controller-manager".to_string()));

    let json = rendered_json(&objects);
    assert!(json.contains("02:00:00:00:00:00"));
    assert!(json.contains("02:00:00:00:10:00"));
}

#[test]
fn test_render_is_deterministic() {
    let spec = NetworkAddonsConfigSpec {
        multus: Some(Multus {}),
        linux_bridge: Some(LinuxBridge {}),
        kube_mac_pool: Some(pool("02:00:00:00:00:00", "02:FF:FF:FF:FF:FF")),
        image_pull_policy: "IfNotPresent".to_string(),
        ..Default::default()
    };
    let config = manifest_config();
    let cluster = openshift_cluster();

    let mut first = Vec::new();
    let mut second = Vec::new();
    for component in Component::ALL {
        first.extend(component.render(&spec, &config, &cluster).expect("render"));
        second.extend(component.render(&spec, &config, &cluster).expect("render"));
    }

    assert_eq!(rendered_json(&first), rendered_json(&second));
}

#[test]
fn test_legacy_identity_table() {
    let multus = Component::Multus
        .legacy_identity()
        .expect("multus has a legacy identity");
    assert_eq!(multus.name, "kube-multus-ds-amd64");
    assert_eq!(multus.namespace, None, "lives in the operand namespace");

    let bridge = Component::LinuxBridge
        .legacy_identity()
        .expect("linux-bridge has a legacy identity");
    assert_eq!(bridge.name, "bridge-marker");
    assert_eq!(bridge.namespace, Some("linux-bridge"));

    let sriov = Component::SriovDevicePlugin
        .legacy_identity()
        .expect("sriov has a legacy identity");
    assert_eq!((sriov.group, sriov.version), ("extensions", "v1beta1"));

    assert!(Component::KubeMacPool.legacy_identity().is_none());
}

fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{reason} error"),
        reason: reason.to_string(),
        code,
    })
}

#[test]
fn test_absent_legacy_objects_count_as_clean() {
    // NotFound covers both a deleted object and a kind the cluster no
    // longer registers.
    assert!(is_absent(&api_error(404, "NotFound")));

    assert!(!is_absent(&api_error(403, "Forbidden")));
    assert!(!is_absent(&api_error(500, "InternalError")));
}

#[test]
fn test_kubemacpool_change_safe_rejects_range_edit() {
    let previous = NetworkAddonsConfigSpec {
        kube_mac_pool: Some(pool("02:00:00:00:00:00", "02:FF:FF:FF:FF:FF")),
        ..Default::default()
    };
    let next = NetworkAddonsConfigSpec {
        kube_mac_pool: Some(pool("02:00:00:00:00:01", "02:FF:FF:FF:FF:FF")),
        ..Default::default()
    };

    let errors = Component::KubeMacPool.change_safe(&previous, &next);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("rangeStart"));
}

#[test]
fn test_change_safe_rejects_sub_configuration_removal() {
    let previous = NetworkAddonsConfigSpec {
        linux_bridge: Some(LinuxBridge {}),
        ..Default::default()
    };
    let next = NetworkAddonsConfigSpec::default();

    let errors = Component::LinuxBridge.change_safe(&previous, &next);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Linux Bridge"));
}

#[test]
fn test_change_safe_accepts_newly_requested_component() {
    let previous = NetworkAddonsConfigSpec::default();
    let next = NetworkAddonsConfigSpec {
        multus: Some(Multus {}),
        kube_mac_pool: Some(KubeMacPool::default()),
        ..Default::default()
    };

    for component in Component::ALL {
        assert!(component.change_safe(&previous, &next).is_empty());
    }
}
