//! Config pipeline.
//!
//! Orchestrates registry-wide defaulting, validation and change-safety
//! checks across a (previous, next) spec pair before anything is
//! rendered or applied. Errors from different handlers are independent
//! and all surfaced together, so an administrator sees every violation
//! in one round-trip.

use crds::NetworkAddonsConfigSpec;

use crate::components::{image_pull_policy, Component};
use crate::error::ConfigError;

/// Runs the full pipeline, mutating `next` in place with defaults.
///
/// Order matters: defaults first so validation and change-safety see the
/// effective spec, change-safety only once validation passed and only
/// when something was previously deployed. Any returned error aborts the
/// reconcile pass before render/apply.
pub fn run(
    previous: Option<&NetworkAddonsConfigSpec>,
    next: &mut NetworkAddonsConfigSpec,
) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    errors.extend(image_pull_policy::fill_defaults(next, previous));
    for component in Component::ALL {
        errors.extend(component.fill_defaults(next, previous));
    }

    let mut validation = image_pull_policy::validate(next);
    for component in Component::ALL {
        validation.extend(component.validate(next));
    }
    let validation_failed = !validation.is_empty();
    errors.extend(validation);

    if !validation_failed {
        if let Some(previous) = previous {
            errors.extend(image_pull_policy::change_safe(previous, next));
            for component in Component::ALL {
                errors.extend(component.change_safe(previous, next));
            }
        }
    }

    errors
}
