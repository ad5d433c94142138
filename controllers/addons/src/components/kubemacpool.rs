//! Kubemacpool component handler.
//!
//! The MAC range is the one piece of configuration that must survive the
//! lifetime of a deployment unchanged: pods keep the addresses they were
//! assigned, so the pool boundaries are immutable once deployed. The two
//! range fields are defaulted as a pair and checked field by field.

use crds::{KubeMacPool, NetworkAddonsConfigSpec};
use kube::core::DynamicObject;
use render::{RenderData, RenderError};

use crate::cluster_info::ClusterInfo;
use crate::config::OperatorConfig;
use crate::error::ConfigError;

const DEFAULT_RANGE_START: &str = "02:00:00:00:00:00";
const DEFAULT_RANGE_END: &str = "02:FF:FF:FF:FF:FF";

pub(super) fn validate(spec: &NetworkAddonsConfigSpec) -> Vec<ConfigError> {
    let Some(pool) = &spec.kube_mac_pool else {
        return Vec::new();
    };

    let mut errors = Vec::new();

    if pool.range_start.is_empty() != pool.range_end.is_empty() {
        errors.push(ConfigError::Validation(
            "kubeMacPool rangeStart and rangeEnd must be configured together".to_string(),
        ));
    }

    let start = check_mac(&pool.range_start, "rangeStart", &mut errors);
    let end = check_mac(&pool.range_end, "rangeEnd", &mut errors);

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            errors.push(ConfigError::Validation(format!(
                "kubeMacPool rangeStart '{}' must not be greater than rangeEnd '{}'",
                pool.range_start, pool.range_end
            )));
        }
    }

    errors
}

/// Parses one range boundary, pushing an error per distinct violation.
fn check_mac(value: &str, field: &str, errors: &mut Vec<ConfigError>) -> Option<u64> {
    if value.is_empty() {
        return None;
    }
    let Some(mac) = parse_mac(value) else {
        errors.push(ConfigError::Validation(format!(
            "kubeMacPool {field} '{value}' is not a valid MAC address"
        )));
        return None;
    };
    if is_multicast(mac) {
        errors.push(ConfigError::Validation(format!(
            "kubeMacPool {field} '{value}' must be a unicast MAC address"
        )));
        return None;
    }
    Some(mac)
}

pub(super) fn fill_defaults(
    next: &mut NetworkAddonsConfigSpec,
    previous: Option<&NetworkAddonsConfigSpec>,
) -> Vec<ConfigError> {
    let Some(pool) = &mut next.kube_mac_pool else {
        return Vec::new();
    };

    // The range is treated as a unit: only a fully unset pair is seeded,
    // a half-set pair is left for validation to reject.
    if pool.range_start.is_empty() && pool.range_end.is_empty() {
        if let Some(deployed) = previous.and_then(|p| p.kube_mac_pool.as_ref()) {
            if !deployed.range_start.is_empty() {
                pool.range_start = deployed.range_start.clone();
                pool.range_end = deployed.range_end.clone();
                return Vec::new();
            }
        }
        pool.range_start = DEFAULT_RANGE_START.to_string();
        pool.range_end = DEFAULT_RANGE_END.to_string();
    }

    Vec::new()
}

pub(super) fn change_safe(
    previous: &NetworkAddonsConfigSpec,
    next: &NetworkAddonsConfigSpec,
) -> Vec<ConfigError> {
    let Some(deployed) = &previous.kube_mac_pool else {
        return Vec::new();
    };

    let Some(requested) = &next.kube_mac_pool else {
        return vec![ConfigError::Immutability(
            "cannot remove KubeMacPool configuration once it is deployed".to_string(),
        )];
    };

    // Field by field, so the rules stay auditable.
    let mut errors = Vec::new();
    if !deployed.range_start.is_empty() && deployed.range_start != requested.range_start {
        errors.push(ConfigError::Immutability(
            "cannot modify KubeMacPool rangeStart once it is deployed".to_string(),
        ));
    }
    if !deployed.range_end.is_empty() && deployed.range_end != requested.range_end {
        errors.push(ConfigError::Immutability(
            "cannot modify KubeMacPool rangeEnd once it is deployed".to_string(),
        ));
    }
    errors
}

pub(super) fn render(
    spec: &NetworkAddonsConfigSpec,
    operator_config: &OperatorConfig,
    _cluster_info: &ClusterInfo,
) -> Result<Vec<DynamicObject>, RenderError> {
    let Some(pool) = &spec.kube_mac_pool else {
        return Ok(Vec::new());
    };

    let mut data = RenderData::new();
    data.insert_str("namespace", &operator_config.operand_namespace);
    data.insert_str("kubemacpool_image", &operator_config.kubemacpool_image);
    data.insert_str("image_pull_policy", &spec.image_pull_policy);
    data.insert_str("range_start", &pool.range_start);
    data.insert_str("range_end", &pool.range_end);

    render::render_dir(&operator_config.manifest_dir.join("kubemacpool"), &data)
}

/// Parses a colon-separated 48-bit MAC address.
fn parse_mac(value: &str) -> Option<u64> {
    let mut mac = 0u64;
    let mut groups = 0;
    for group in value.split(':') {
        if group.len() != 2 {
            return None;
        }
        let byte = u8::from_str_radix(group, 16).ok()?;
        mac = (mac << 8) | u64::from(byte);
        groups += 1;
    }
    if groups == 6 { Some(mac) } else { None }
}

/// The least significant bit of the first octet marks multicast addresses.
fn is_multicast(mac: u64) -> bool {
    (mac >> 40) & 0x01 == 0x01
}

/// Builds a KubeMacPool value for tests.
#[cfg(test)]
pub(crate) fn pool(range_start: &str, range_end: &str) -> KubeMacPool {
    KubeMacPool {
        range_start: range_start.to_string(),
        range_end: range_end.to_string(),
    }
}
