//! Version state machine and status persistence.
//!
//! Tracks operator / observed / target version and the Available,
//! Progressing, Degraded conditions across a reconcile pass:
//!
//! - spec change picked up: target version jumps to the operator's own
//!   version, Progressing=True
//! - full successful pass: observed version catches up to target,
//!   Available=True, Progressing=False, Degraded=False
//! - blocking failure: Degraded=True with the aggregated detail, observed
//!   version untouched so it never reports a partially reached target
//!
//! The operator is the sole writer of the status block.

use crds::{
    ConditionStatus, ConditionType, DeployedContainer, NetworkAddonsConfig,
    NetworkAddonsConfigStatus,
};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;

use crate::error::ControllerError;

/// Progressing reason while a rollout is underway.
pub const REASON_PROGRESSING: &str = "DeployingComponents";
/// Degraded reason for spec validation and change-safety failures.
pub const REASON_FAILED_VALIDATION: &str = "FailedValidation";
/// Degraded reason for manifest template failures.
pub const REASON_FAILED_RENDER: &str = "FailedRender";
/// Degraded reason for cluster write failures.
pub const REASON_FAILED_APPLY: &str = "FailedApply";
/// Available reason once all requested addons are deployed.
pub const REASON_DEPLOYED: &str = "Deployed";

/// Records that a new target version is being rolled out.
pub fn mark_progressing(status: &mut NetworkAddonsConfigStatus, operator_version: &str) {
    status.operator_version = operator_version.to_string();
    status.target_version = operator_version.to_string();
    status.set_condition(
        ConditionType::Progressing,
        ConditionStatus::True,
        REASON_PROGRESSING,
        "rolling out the requested addons",
    );
}

/// Records a blocking failure. The observed version is deliberately left
/// alone.
pub fn mark_degraded(status: &mut NetworkAddonsConfigStatus, reason: &str, message: &str) {
    status.set_condition(
        ConditionType::Degraded,
        ConditionStatus::True,
        reason,
        message,
    );
}

/// Records a fully successful pass: the target version has been reached.
pub fn mark_ready(status: &mut NetworkAddonsConfigStatus, containers: Vec<DeployedContainer>) {
    status.observed_version = status.target_version.clone();
    status.containers = containers;
    status.set_condition(
        ConditionType::Progressing,
        ConditionStatus::False,
        REASON_DEPLOYED,
        "",
    );
    status.set_condition(
        ConditionType::Available,
        ConditionStatus::True,
        REASON_DEPLOYED,
        "all requested addons are deployed",
    );
    status.set_condition(ConditionType::Degraded, ConditionStatus::False, "", "");
}

/// Persists status blocks through the status subresource.
pub struct StatusManager {
    api: Api<NetworkAddonsConfig>,
}

impl StatusManager {
    /// Creates a status manager for the cluster-scoped config resource.
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }

    /// Writes the given status block for the named config.
    pub async fn persist(
        &self,
        name: &str,
        status: &NetworkAddonsConfigStatus,
    ) -> Result<(), ControllerError> {
        let patch = serde_json::json!({ "status": status });
        self.api
            .patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
