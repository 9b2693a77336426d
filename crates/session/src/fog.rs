//! Fog-of-war filtering: per-client event visibility and state
//! redaction.
//!
//! Vision itself is computed by an injected callback; this module only
//! applies a given visible-cell set. Global events always pass, movement
//! passes if either endpoint is visible, attacks if either combatant is
//! visible, and everything else passes iff its subject stands on a
//! visible cell (or it has no subject at all).

use std::collections::BTreeSet;

use skirmish_engine::{EngineEvent, Entity, EventBody, EventType, GameState, Position};

/// Computes which cells a viewer entity can currently see. Implemented
/// by the vision module outside this crate; closures work for tests.
pub trait VisionProvider: Send + Sync {
    fn visible_cells(&self, state: &GameState, viewer: &Entity) -> BTreeSet<Position>;
}

impl<F> VisionProvider for F
where
    F: Fn(&GameState, &Entity) -> BTreeSet<Position> + Send + Sync,
{
    fn visible_cells(&self, state: &GameState, viewer: &Entity) -> BTreeSet<Position> {
        self(state, viewer)
    }
}

/// Event kinds every client receives regardless of visibility.
fn is_global(kind: EventType) -> bool {
    matches!(
        kind,
        EventType::InitiativeRolled
            | EventType::CombatEnded
            | EventType::TurnEnded
            | EventType::ActionRejected
    )
}

/// Filters one dispatch's event batch down to what a client may see.
/// Positions are resolved against the post-dispatch state.
pub fn filter_events(
    state: &GameState,
    events: &[EngineEvent],
    visible: &BTreeSet<Position>,
) -> Vec<EngineEvent> {
    events
        .iter()
        .filter(|event| event_visible(state, event, visible))
        .cloned()
        .collect()
}

fn event_visible(state: &GameState, event: &EngineEvent, visible: &BTreeSet<Position>) -> bool {
    if is_global(event.event_type()) {
        return true;
    }
    match &event.body {
        EventBody::MoveApplied {
            original_position,
            final_position,
            ..
        } => visible.contains(original_position) || visible.contains(final_position),
        body => {
            let subjects = body.subject_ids();
            if subjects.is_empty() {
                return true;
            }
            subjects.iter().any(|id| {
                state
                    .entity(id)
                    .map(|e| visible.contains(&e.position))
                    .unwrap_or(false)
            })
        }
    }
}

/// Redacts a state for a fogged client: npc positions outside the
/// visible set become `null` and gain a `_fogHidden` marker.
pub fn redact_state(state: &GameState, visible: &BTreeSet<Position>) -> serde_json::Value {
    let mut value =
        serde_json::to_value(state).expect("GameState serialization should not fail");
    let hidden: Vec<usize> = state
        .entities
        .npcs
        .iter()
        .enumerate()
        .filter(|(_, npc)| !visible.contains(&npc.position))
        .map(|(index, _)| index)
        .collect();
    if let Some(npcs) = value
        .pointer_mut("/entities/npcs")
        .and_then(serde_json::Value::as_array_mut)
    {
        for index in hidden {
            if let Some(npc) = npcs.get_mut(index).and_then(serde_json::Value::as_object_mut) {
                npc.insert("position".into(), serde_json::Value::Null);
                npc.insert("_fogHidden".into(), serde_json::Value::Bool(true));
            }
        }
    }
    value
}
