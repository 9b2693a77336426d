//! Replay bundles: package an initial state with an action sequence and
//! verify that re-execution reproduces the expected events and hashes.
//!
//! This is the determinism contract made testable: given a seed and a
//! finite action sequence, the `(state, events)` stream is byte-for-byte
//! reproducible, and the runner proves it.

pub mod hash;
mod io;

pub use hash::state_hash;
pub use io::{
    load_bundle, load_scenario, save_bundle, save_scenario, ReplayIoError, REPLAY_SUFFIX,
    SCENARIO_SUFFIX,
};

use serde::{Deserialize, Serialize};

use crate::dispatch;
use crate::state::{EngineEvent, EventType, GameState};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayBundle {
    pub meta: ReplayMeta,
    pub initial_state: GameState,
    pub steps: Vec<ReplayStep>,
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_check: Option<FinalCheck>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMeta {
    pub id: String,
    pub created_at: String,
    pub schema_version: String,
    pub engine_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One recorded step. The action stays untyped JSON so bundles can carry
/// the `_expectReject` marker alongside the declared fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    pub action: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_events: Option<Vec<ExpectedEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_state_hash: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpectedEvent {
    #[serde(rename = "type")]
    pub kind: EventType,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_state_hash: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ReplayReport {
    pub ok: bool,
    pub steps_run: usize,
    pub failing_step: Option<usize>,
    pub errors: Vec<String>,
    pub final_state_hash: String,
    pub event_log: Vec<EngineEvent>,
}

/// Re-executes a bundle from its initial state, checking each step's
/// expectations. Stops at the first divergence.
pub fn run(bundle: &ReplayBundle) -> ReplayReport {
    let mut state = bundle.initial_state.clone();
    let mut event_log: Vec<EngineEvent> = Vec::new();

    for (index, step) in bundle.steps.iter().enumerate() {
        let expect_reject = step
            .action
            .get("_expectReject")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
            || step
                .expected_events
                .as_deref()
                .is_some_and(|events| events.iter().any(|e| e.kind == EventType::ActionRejected));

        let outcome = dispatch::apply_action_value(&state, &step.action);
        event_log.extend(outcome.events.iter().cloned());

        if !outcome.success && !expect_reject {
            let mut errors = vec![format!("step {index}: action failed unexpectedly")];
            errors.extend(outcome.errors);
            return failure(index, errors, &outcome.next_state, event_log);
        }
        if outcome.success && expect_reject {
            return failure(
                index,
                vec![format!("step {index}: expected a rejection but the action succeeded")],
                &outcome.next_state,
                event_log,
            );
        }

        if let Some(expected) = &step.expected_events {
            let actual: Vec<EventType> = outcome.events.iter().map(EngineEvent::event_type).collect();
            let wanted: Vec<EventType> = expected.iter().map(|e| e.kind).collect();
            if actual != wanted {
                return failure(
                    index,
                    vec![format!(
                        "step {index}: events {actual:?} did not match expected {wanted:?}"
                    )],
                    &outcome.next_state,
                    event_log,
                );
            }
        }

        state = outcome.next_state;

        if let Some(expected_hash) = &step.expected_state_hash {
            let actual_hash = state_hash(&state);
            if &actual_hash != expected_hash {
                return failure(
                    index,
                    vec![format!(
                        "step {index}: state hash {actual_hash} did not match expected {expected_hash}"
                    )],
                    &state,
                    event_log,
                );
            }
        }
    }

    let final_state_hash = state_hash(&state);
    if let Some(expected) = bundle
        .final_check
        .as_ref()
        .and_then(|f| f.expected_state_hash.as_ref())
    {
        if expected != &final_state_hash {
            let steps = bundle.steps.len();
            return ReplayReport {
                ok: false,
                steps_run: steps,
                failing_step: Some(steps),
                errors: vec![format!(
                    "final state hash {final_state_hash} did not match expected {expected}"
                )],
                final_state_hash,
                event_log,
            };
        }
    }

    tracing::info!(steps = bundle.steps.len(), "replay verified");
    ReplayReport {
        ok: true,
        steps_run: bundle.steps.len(),
        failing_step: None,
        errors: Vec::new(),
        final_state_hash,
        event_log,
    }
}

fn failure(
    index: usize,
    errors: Vec<String>,
    state: &GameState,
    event_log: Vec<EngineEvent>,
) -> ReplayReport {
    tracing::warn!(step = index, reasons = ?errors, "replay diverged");
    ReplayReport {
        ok: false,
        steps_run: index,
        failing_step: Some(index),
        errors,
        final_state_hash: state_hash(state),
        event_log,
    }
}
