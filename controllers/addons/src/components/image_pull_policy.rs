//! Global image pull policy pipeline steps.
//!
//! Not a deployable component: it has no manifests and nothing to clean
//! up, but it runs through the same validate / fill-defaults /
//! change-safety pipeline as the component handlers and its effective
//! value feeds every component's render context.

use crds::NetworkAddonsConfigSpec;

use crate::error::ConfigError;

/// Policy applied when the spec and the previously deployed spec are
/// both silent.
pub const DEFAULT_IMAGE_PULL_POLICY: &str = "IfNotPresent";

const VALID_POLICIES: [&str; 3] = ["Always", "Never", "IfNotPresent"];

pub fn validate(spec: &NetworkAddonsConfigSpec) -> Vec<ConfigError> {
    if spec.image_pull_policy.is_empty() {
        return Vec::new();
    }

    if !VALID_POLICIES.contains(&spec.image_pull_policy.as_str()) {
        return vec![ConfigError::Validation(format!(
            "requested imagePullPolicy '{}' is not valid",
            spec.image_pull_policy
        ))];
    }

    Vec::new()
}

pub fn fill_defaults(
    next: &mut NetworkAddonsConfigSpec,
    previous: Option<&NetworkAddonsConfigSpec>,
) -> Vec<ConfigError> {
    if next.image_pull_policy.is_empty() {
        match previous {
            Some(deployed) if !deployed.image_pull_policy.is_empty() => {
                next.image_pull_policy = deployed.image_pull_policy.clone();
            }
            _ => next.image_pull_policy = DEFAULT_IMAGE_PULL_POLICY.to_string(),
        }
    }

    Vec::new()
}

pub fn change_safe(
    previous: &NetworkAddonsConfigSpec,
    next: &NetworkAddonsConfigSpec,
) -> Vec<ConfigError> {
    if !previous.image_pull_policy.is_empty()
        && previous.image_pull_policy != next.image_pull_policy
    {
        return vec![ConfigError::Immutability(
            "cannot modify ImagePullPolicy configuration once components were deployed".to_string(),
        )];
    }

    Vec::new()
}
