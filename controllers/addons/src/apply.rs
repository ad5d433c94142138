//! Apply pass.
//!
//! Diffs rendered objects against the live cluster and creates or
//! updates them. Object identity for matching is always (group, version,
//! kind, namespace, name). Updates are suppressed when the rendered
//! object is already structurally contained in the live one, so a
//! reconcile over an unchanged spec performs zero mutating calls.
//!
//! No retry happens here; the first failure aborts the pass and the
//! watch loop requeues with backoff.

use kube::api::{Api, PostParams};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::discovery::ApiResource;
use kube::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ControllerError;

/// Creates and updates rendered objects in the cluster.
pub struct Applier {
    client: Client,
}

impl Applier {
    /// Creates an applier over the given client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Applies every object in order, returning the number of mutating
    /// calls performed.
    pub async fn apply_all(&self, objects: &[DynamicObject]) -> Result<usize, ControllerError> {
        let mut mutations = 0;
        for object in objects {
            if self.apply_object(object).await? {
                mutations += 1;
            }
        }
        Ok(mutations)
    }

    /// Get-or-create one object; update only on divergence. Returns
    /// whether a mutating call was made.
    async fn apply_object(&self, desired: &DynamicObject) -> Result<bool, ControllerError> {
        let name = desired.metadata.name.as_deref().ok_or_else(|| {
            ControllerError::InvalidConfig("rendered object has no name".to_string())
        })?;
        let api = self.api_for(desired)?;

        match api.get(name).await {
            Ok(live) => {
                let desired_value = serde_json::to_value(desired)?;
                let live_value = serde_json::to_value(&live)?;
                if !needs_update(&desired_value, &live_value) {
                    debug!("{} {} already up-to-date", kind_of(desired), name);
                    return Ok(false);
                }

                // Carry the live resourceVersion so the replace does not
                // race a concurrent writer.
                let mut updated = desired.clone();
                updated.metadata.resource_version = live.metadata.resource_version.clone();
                info!("Updating {} {}", kind_of(desired), name);
                api.replace(name, &PostParams::default(), &updated).await?;
                Ok(true)
            }
            Err(e) if is_not_found(&e) => {
                info!("Creating {} {}", kind_of(desired), name);
                api.create(&PostParams::default(), desired).await?;
                Ok(true)
            }
            Err(e) => Err(ControllerError::Kube(e)),
        }
    }

    /// Resolves the dynamic API endpoint for one object from its own
    /// apiVersion/kind and namespace.
    fn api_for(&self, object: &DynamicObject) -> Result<Api<DynamicObject>, ControllerError> {
        let types = object.types.as_ref().ok_or_else(|| {
            ControllerError::InvalidConfig("rendered object has no apiVersion/kind".to_string())
        })?;
        let (group, version) = split_api_version(&types.api_version);
        let gvk = GroupVersionKind::gvk(group, version, &types.kind);
        let ar = ApiResource::from_gvk(&gvk);

        Ok(match object.metadata.namespace.as_deref() {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        })
    }
}

fn kind_of(object: &DynamicObject) -> &str {
    object
        .types
        .as_ref()
        .map(|t| t.kind.as_str())
        .unwrap_or("object")
}

fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(response) if response.code == 404)
}

fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// A live object needs an update when the rendered object is not a
/// structural subset of it.
pub fn needs_update(desired: &Value, live: &Value) -> bool {
    !is_subset(desired, live)
}

/// Structural containment: every field the rendered object sets must be
/// present with the same value in the live object. Extra server-defaulted
/// fields on the live side are ignored; arrays must match element-wise in
/// both length and order.
///
/// Containment is one-directional: a field dropped from a manifest in a
/// later release still satisfies the subset check and stays on the live
/// object until the object itself is recreated.
fn is_subset(expected: &Value, actual: &Value) -> bool {
    match (expected, actual) {
        (Value::Object(expected), Value::Object(actual)) => expected
            .iter()
            .all(|(key, value)| match actual.get(key) {
                Some(actual_value) => is_subset(value, actual_value),
                None => value.is_null(),
            }),
        (Value::Array(expected), Value::Array(actual)) => {
            expected.len() == actual.len()
                && expected
                    .iter()
                    .zip(actual.iter())
                    .all(|(e, a)| is_subset(e, a))
        }
        _ => expected == actual,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identical_objects_need_no_update() {
        let desired = json!({
            "apiVersion": "apps/v1",
            "kind": "DaemonSet",
            "metadata": {"name": "bridge-marker", "namespace": "network-addons"},
            "spec": {"selector": {"matchLabels": {"app": "bridge-marker"}}}
        });

        assert!(!needs_update(&desired, &desired.clone()));
    }

    #[test]
    fn test_server_defaulted_fields_are_ignored() {
        let desired = json!({
            "metadata": {"name": "bridge-marker"},
            "spec": {"template": {"spec": {"containers": [
                {"name": "marker", "image": "ghcr.io/microscaler/bridge-marker:v0.2.0"}
            ]}}}
        });
        let live = json!({
            "metadata": {"name": "bridge-marker", "resourceVersion": "42", "uid": "abc"},
            "spec": {"template": {"spec": {"containers": [
                {
                    "name": "marker",
                    "image": "ghcr.io/microscaler/bridge-marker:v0.2.0",
                    "terminationMessagePath": "/dev/termination-log"
                }
            ]}}},
            "status": {"numberReady": 3}
        });

        assert!(!needs_update(&desired, &live));
    }

    #[test]
    fn test_changed_scalar_triggers_update() {
        let desired = json!({"spec": {"image": "cni:v2"}});
        let live = json!({"spec": {"image": "cni:v1"}});
        assert!(needs_update(&desired, &live));
    }

    #[test]
    fn test_missing_field_triggers_update() {
        let desired = json!({"spec": {"image": "cni:v2", "pullPolicy": "Always"}});
        let live = json!({"spec": {"image": "cni:v2"}});
        assert!(needs_update(&desired, &live));
    }

    #[test]
    fn test_array_length_change_triggers_update() {
        let desired = json!({"spec": {"containers": [{"name": "a"}, {"name": "b"}]}});
        let live = json!({"spec": {"containers": [{"name": "a"}]}});
        assert!(needs_update(&desired, &live));
    }

    #[test]
    fn test_split_api_version() {
        assert_eq!(split_api_version("apps/v1"), ("apps", "v1"));
        assert_eq!(split_api_version("v1"), ("", "v1"));
    }
}
