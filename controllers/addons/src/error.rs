//! Controller-specific error types.
//!
//! This module defines error types specific to the Network Addons
//! Controller that are not covered by upstream library errors.

use thiserror::Error;

use kube::Error as KubeError;

/// Errors that can occur in the Network Addons Controller.
///
/// Render failures are not carried here: the reconciler isolates them
/// per component and reports them through the Degraded condition.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    /// Metrics/health endpoint failed
    #[error("Monitoring endpoint failed: {0}")]
    Monitoring(String),
}

/// A single user-visible violation found by the config pipeline.
///
/// Violations from every handler are aggregated and surfaced together so
/// an administrator sees the complete list in one round-trip; neither
/// kind is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Structural or semantic violation in the requested spec
    #[error("{0}")]
    Validation(String),

    /// Attempt to modify a field that is immutable once deployed
    #[error("{0}")]
    Immutability(String),
}

/// Joins pipeline errors into one human-readable status message.
pub fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
