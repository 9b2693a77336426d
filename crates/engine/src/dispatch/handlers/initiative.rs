//! ROLL_INITIATIVE: seed combat with a d20 per living combatant.

use std::cmp::Reverse;

use crate::error::{EngineError, ErrorCode};
use crate::rng;
use crate::state::{CombatMode, EventBody, GameState, InitiativeEntry, TurnBudget};

pub(crate) fn apply(state: &mut GameState) -> Result<(), EngineError> {
    if state.combat.in_combat() {
        return Err(EngineError::new(
            ErrorCode::CombatAlreadyActive,
            "initiative was already rolled",
        ));
    }

    // Living players in list order, then living npcs. Objects never act.
    let participants: Vec<String> = state
        .entities
        .combatants()
        .map(|e| e.id.clone())
        .collect();
    if participants.is_empty() {
        return Err(EngineError::new(
            ErrorCode::NoParticipants,
            "no living players or npcs to fight",
        ));
    }

    let mut order: Vec<InitiativeEntry> = participants
        .into_iter()
        .map(|entity_id| {
            let roll = rng::roll_die(state, 20);
            InitiativeEntry { entity_id, roll }
        })
        .collect();
    // Highest roll first; ties break toward the lexicographically
    // smaller id.
    order.sort_by_key(|entry| (Reverse(entry.roll), entry.entity_id.clone()));

    state.combat.mode = CombatMode::Combat;
    state.combat.round = 1;
    state.combat.initiative_order = order.iter().map(|e| e.entity_id.clone()).collect();
    state.combat.active_entity_id = order.first().map(|e| e.entity_id.clone());
    state.combat.turn_budget = Some(TurnBudget::default());

    state.push_event(EventBody::InitiativeRolled { order });
    Ok(())
}
