//! Network Addons CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for the network addons operator.

pub mod conditions;
pub mod network_addons_config;

pub use conditions::*;
pub use network_addons_config::*;
