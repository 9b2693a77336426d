//! END_TURN: tick the exiting entity, advance the pointer past dead
//! combatants, and run start-of-turn hooks for the entering one.

use crate::error::{EngineError, ErrorCode};
use crate::rules::{abilities, conditions};
use crate::state::{EventBody, GameState, TurnBudget};

pub(crate) fn apply(state: &mut GameState, entity_id: &str) -> Result<(), EngineError> {
    if !state.combat.in_combat() {
        return Err(EngineError::new(
            ErrorCode::CombatNotActive,
            "no combat in progress",
        ));
    }
    if !state.combat.is_active(entity_id) {
        return Err(EngineError::new(
            ErrorCode::NotYourTurn,
            format!("{entity_id} is not the active entity"),
        ));
    }

    if let Some(entity) = state.entity_mut(entity_id) {
        abilities::tick_cooldowns(entity);
    }
    conditions::tick_end_of_turn(state, entity_id);

    // Advance from the slot after the exiting entity, skipping the dead.
    // Passing the top of the order starts a new round.
    let order = state.combat.initiative_order.clone();
    let count = order.len();
    let index = order
        .iter()
        .position(|id| id == entity_id)
        .ok_or_else(|| {
            EngineError::new(
                ErrorCode::NotYourTurn,
                format!("{entity_id} is not in the initiative order"),
            )
        })?;

    let mut next_id = entity_id.to_string();
    let mut wrapped = false;
    for offset in 1..=count {
        let candidate = &order[(index + offset) % count];
        let living = state
            .entity(candidate)
            .map(|e| !e.is_dead())
            .unwrap_or(false);
        if living {
            next_id = candidate.clone();
            wrapped = index + offset >= count;
            break;
        }
    }
    if wrapped {
        state.combat.round += 1;
    }
    state.combat.active_entity_id = Some(next_id.clone());
    state.combat.turn_budget = Some(TurnBudget::default());

    state.push_event(EventBody::TurnEnded {
        entity_id: entity_id.to_string(),
        next_entity_id: next_id.clone(),
        round: state.combat.round,
    });

    conditions::run_start_of_turn(state, &next_id);
    Ok(())
}
