//! The action dispatcher: single choke point for every state change.
//!
//! `apply_action` is a pure function from `(state, action)` to a fresh
//! state plus the events the dispatch emitted. Failures come in two
//! tiers: state-level (schema or pre-invariant — the previous state is
//! returned untouched and no event is emitted) and action-level (a clone
//! with exactly one `ACTION_REJECTED` event appended).

mod combat_end;
mod handlers;

use crate::action::{ActionSummary, DeclaredAction};
use crate::error::{EngineError, ErrorCode};
use crate::state::invariants;
use crate::state::schema;
use crate::state::{EngineEvent, EventBody, GameState, TurnBudget};

/// Result of one dispatch. `events` is the suffix of the new state's log
/// produced by this dispatch; `errors` render as `"[CODE] message"`.
#[derive(Clone, Debug)]
pub struct DispatchOutcome {
    pub next_state: GameState,
    pub events: Vec<EngineEvent>,
    pub success: bool,
    pub errors: Vec<String>,
}

/// Applies a declared action through the validation/commit/rollback
/// pipeline. The input state is never mutated.
pub fn apply_action(state: &GameState, action: &DeclaredAction) -> DispatchOutcome {
    // Stage 1-2: the state itself must be sound before anything runs.
    if let Some(failure) = state_level_checks(state) {
        return failure;
    }

    // Stage 3: action shape.
    let shape_errors = action.validate_shape();
    if !shape_errors.is_empty() {
        return reject(state, action.summary(), shape_errors);
    }

    // Stage 4: turn order. In combat the four entity actions belong to
    // the active entity alone.
    if state.combat.in_combat() && action.is_turn_bound() {
        if let Some(actor) = action.actor_id() {
            if !state.combat.is_active(actor) {
                return reject(
                    state,
                    action.summary(),
                    vec![EngineError::new(
                        ErrorCode::NotYourTurn,
                        format!("{actor} is not the active entity"),
                    )],
                );
            }
        }
    }

    // Stage 5: per-turn budget.
    if state.combat.in_combat() && action.is_turn_bound() {
        let budget = state.combat.turn_budget.unwrap_or_default();
        let spent = match action {
            DeclaredAction::Move { .. } => budget.movement_used >= 1,
            _ => budget.action_used >= 1,
        };
        if spent {
            let slot = match action {
                DeclaredAction::Move { .. } => "movement",
                _ => "action",
            };
            return reject(
                state,
                action.summary(),
                vec![EngineError::new(
                    ErrorCode::BudgetExhausted,
                    format!("{slot} already used this turn"),
                )],
            );
        }
    }

    // Stage 6: work on a clone; inject a zeroed budget into older combat
    // states that predate budget tracking.
    let mut next = state.clone();
    if next.combat.in_combat() && next.combat.turn_budget.is_none() {
        next.combat.turn_budget = Some(TurnBudget::default());
    }
    let log_mark = next.log.events.len();

    // Stage 7: commit. A handler failure discards the clone entirely.
    if let Err(error) = handlers::dispatch(&mut next, action) {
        return reject(state, action.summary(), vec![error]);
    }

    // Stage 8: consume the budget slot the action spent.
    if next.combat.in_combat() && action.is_turn_bound() {
        if let Some(budget) = next.combat.turn_budget.as_mut() {
            match action {
                DeclaredAction::Move { .. } => budget.movement_used = 1,
                _ => budget.action_used = 1,
            }
        }
    }

    // Stage 9: combat may have just been decided.
    combat_end::check(&mut next);

    // Stage 10: the clone must still satisfy every invariant.
    let post = invariants::check(&next);
    if !post.is_empty() {
        let errors = post
            .into_iter()
            .map(|e| EngineError::new(ErrorCode::PostInvariantFailed, e.message))
            .collect();
        return reject(state, action.summary(), errors);
    }

    let events = next.log.events[log_mark..].to_vec();
    tracing::debug!(
        action = ?action.summary().kind,
        events = events.len(),
        "action applied"
    );
    DispatchOutcome {
        next_state: next,
        events,
        success: true,
        errors: Vec::new(),
    }
}

/// Entry point for untyped JSON actions, as received from clients and
/// replay bundles. Parse failures become action-level rejections.
pub fn apply_action_value(state: &GameState, value: &serde_json::Value) -> DispatchOutcome {
    match DeclaredAction::from_value(value) {
        Ok(action) => apply_action(state, &action),
        Err(error) => {
            if let Some(failure) = state_level_checks(state) {
                return failure;
            }
            reject(state, ActionSummary::from_raw(value), vec![error])
        }
    }
}

fn state_level_checks(state: &GameState) -> Option<DispatchOutcome> {
    let schema_errors = schema::validate(state);
    if !schema_errors.is_empty() {
        return Some(state_failure(state, schema_errors));
    }
    let invariant_errors = invariants::check(state);
    if !invariant_errors.is_empty() {
        return Some(state_failure(state, invariant_errors));
    }
    None
}

/// State-level failure: the previous state comes back unchanged and no
/// event is emitted. The session should halt until the state is repaired.
fn state_failure(state: &GameState, errors: Vec<EngineError>) -> DispatchOutcome {
    let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
    tracing::warn!(reasons = ?errors, "state-level dispatch failure");
    DispatchOutcome {
        next_state: state.clone(),
        events: Vec::new(),
        success: false,
        errors,
    }
}

/// Action-level rejection: a clone of the previous state with exactly one
/// `ACTION_REJECTED` event appended.
fn reject(state: &GameState, summary: ActionSummary, errors: Vec<EngineError>) -> DispatchOutcome {
    let reasons: Vec<String> = errors.iter().map(ToString::to_string).collect();
    tracing::warn!(action = %summary.kind, reasons = ?reasons, "action rejected");
    let mut next = state.clone();
    next.push_event(EventBody::ActionRejected {
        action: summary,
        reasons: reasons.clone(),
    });
    let events: Vec<EngineEvent> = next.log.events.last().cloned().into_iter().collect();
    DispatchOutcome {
        next_state: next,
        events,
        success: false,
        errors: reasons,
    }
}
