//! Status condition records
//!
//! Available / Progressing / Degraded conditions in the operator
//! convention: `lastTransitionTime` only moves when the condition status
//! actually flips, so consumers can measure how long a state has held.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::network_addons_config::NetworkAddonsConfigStatus;

/// Condition type vocabulary reported on the config status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionType {
    /// The requested addons are fully deployed at the observed version
    Available,
    /// A new target version is being rolled out
    Progressing,
    /// The last reconcile pass hit a blocking failure
    Degraded,
}

/// Condition status values, mirroring core Kubernetes conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    /// Condition holds
    True,
    /// Condition does not hold
    False,
    /// Condition state cannot be determined
    Unknown,
}

/// A single condition record on the config status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    /// True / False / Unknown
    pub status: ConditionStatus,
    /// Short machine-readable reason for the last transition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    /// Human-readable detail
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    /// When `status` last changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl NetworkAddonsConfigStatus {
    /// Sets (or inserts) a condition, updating `lastTransitionTime` only
    /// when the status value changes. Reason and message are always
    /// refreshed.
    pub fn set_condition(
        &mut self,
        condition_type: ConditionType,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) {
        let now = Utc::now();
        match self
            .conditions
            .iter_mut()
            .find(|c| c.condition_type == condition_type)
        {
            Some(existing) => {
                if existing.status != status {
                    existing.last_transition_time = Some(now);
                }
                existing.status = status;
                existing.reason = reason.to_string();
                existing.message = message.to_string();
            }
            None => self.conditions.push(Condition {
                condition_type,
                status,
                reason: reason.to_string(),
                message: message.to_string(),
                last_transition_time: Some(now),
            }),
        }
    }

    /// Returns the condition record of the given type, if present.
    pub fn condition(&self, condition_type: ConditionType) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }
}
