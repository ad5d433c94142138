//! Version state machine tests.

use crds::{ConditionStatus, ConditionType, DeployedContainer, NetworkAddonsConfigStatus};

use crate::status;

fn condition_status(
    state: &NetworkAddonsConfigStatus,
    condition_type: ConditionType,
) -> Option<ConditionStatus> {
    state.condition(condition_type).map(|c| c.status)
}

#[test]
fn test_progressing_sets_target_but_not_observed() {
    let mut state = NetworkAddonsConfigStatus::default();

    status::mark_progressing(&mut state, "0.6.0");

    assert_eq!(state.operator_version, "0.6.0");
    assert_eq!(state.target_version, "0.6.0");
    assert_eq!(state.observed_version, "", "nothing was deployed yet");
    assert_eq!(
        condition_status(&state, ConditionType::Progressing),
        Some(ConditionStatus::True)
    );
    assert_eq!(
        state
            .condition(ConditionType::Progressing)
            .map(|c| c.reason.as_str()),
        Some(status::REASON_PROGRESSING)
    );
}

#[test]
fn test_ready_advances_observed_to_target() {
    let mut state = NetworkAddonsConfigStatus::default();
    status::mark_progressing(&mut state, "0.6.0");

    let containers = vec![DeployedContainer {
        namespace: "network-addons".to_string(),
        parent_kind: "DaemonSet".to_string(),
        parent_name: "bridge-marker".to_string(),
        name: "bridge-marker".to_string(),
        image: "ghcr.io/microscaler/bridge-marker:v0.2.0".to_string(),
    }];
    status::mark_ready(&mut state, containers.clone());

    assert_eq!(state.observed_version, state.target_version);
    assert_eq!(state.containers, containers);
    assert_eq!(
        condition_status(&state, ConditionType::Available),
        Some(ConditionStatus::True)
    );
    assert_eq!(
        condition_status(&state, ConditionType::Progressing),
        Some(ConditionStatus::False)
    );
    assert_eq!(
        condition_status(&state, ConditionType::Degraded),
        Some(ConditionStatus::False)
    );
}

#[test]
fn test_degraded_leaves_observed_version_alone() {
    let mut state = NetworkAddonsConfigStatus::default();
    status::mark_progressing(&mut state, "0.5.0");
    status::mark_ready(&mut state, Vec::new());

    // A newer operator picks up the config but fails the pass.
    status::mark_progressing(&mut state, "0.6.0");
    status::mark_degraded(
        &mut state,
        status::REASON_FAILED_APPLY,
        "daemonsets.apps is forbidden",
    );

    assert_eq!(state.target_version, "0.6.0");
    assert_eq!(
        state.observed_version, "0.5.0",
        "a failed pass must never report a partially reached target"
    );
    let degraded = state
        .condition(ConditionType::Degraded)
        .expect("degraded condition present");
    assert_eq!(degraded.status, ConditionStatus::True);
    assert_eq!(degraded.reason, status::REASON_FAILED_APPLY);
    assert_eq!(degraded.message, "daemonsets.apps is forbidden");
}

#[test]
fn test_repeated_ready_pass_leaves_status_unchanged() {
    let mut state = NetworkAddonsConfigStatus::default();
    status::mark_progressing(&mut state, "0.6.0");
    status::mark_ready(&mut state, Vec::new());
    let settled = state.clone();

    // A steady-state pass re-marks ready with the same containers; the
    // status must compare equal so no write is needed.
    status::mark_ready(&mut state, Vec::new());
    assert_eq!(state, settled);
}

#[test]
fn test_recovery_after_degraded_pass() {
    let mut state = NetworkAddonsConfigStatus::default();
    status::mark_progressing(&mut state, "0.6.0");
    status::mark_degraded(&mut state, status::REASON_FAILED_RENDER, "bad template");

    status::mark_ready(&mut state, Vec::new());

    assert_eq!(state.observed_version, "0.6.0");
    assert_eq!(
        condition_status(&state, ConditionType::Degraded),
        Some(ConditionStatus::False)
    );
    assert_eq!(
        condition_status(&state, ConditionType::Available),
        Some(ConditionStatus::True)
    );
}
