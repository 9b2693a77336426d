//! Dispatch invariants checked on entry to and exit from every dispatch.
//!
//! A violation on entry is a state-level failure (the state itself is
//! corrupt); a violation on exit rolls the dispatch back. Checks cover
//! identity, spatial occupancy, combat-mode consistency, vitals, log
//! numbering, and the turn budget.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{EngineError, ErrorCode};
use crate::state::{CombatMode, EntityIndex, GameState, Position};

fn violation(message: String) -> EngineError {
    EngineError::new(ErrorCode::InvariantFailed, message)
}

/// Checks every invariant; returns all violations found.
pub fn check(state: &GameState) -> Vec<EngineError> {
    let mut errors = Vec::new();
    check_identity(state, &mut errors);
    check_spatial(state, &mut errors);
    check_combat(state, &mut errors);
    check_vitals(state, &mut errors);
    check_log(state, &mut errors);
    check_budget(state, &mut errors);
    errors
}

/// Entity ids are globally unique and every referenced id resolves.
fn check_identity(state: &GameState, errors: &mut Vec<EngineError>) {
    let mut seen = BTreeSet::new();
    for entity in state.entities.all() {
        if !seen.insert(entity.id.as_str()) {
            errors.push(violation(format!("duplicate entity id {}", entity.id)));
        }
    }

    let index = EntityIndex::build(&state.entities);
    if let Some(active) = state.combat.active_entity_id.as_deref() {
        if !index.contains(active) {
            errors.push(violation(format!("activeEntityId {active} does not exist")));
        }
    }
    for id in &state.combat.initiative_order {
        if !index.contains(id) {
            errors.push(violation(format!("initiative entry {id} does not exist")));
        }
    }
    for event in &state.log.events {
        for id in event.body.subject_ids() {
            if !index.contains(id) {
                errors.push(violation(format!(
                    "event {} references unknown entity {id}",
                    event.id
                )));
            }
        }
    }
}

/// Positions are in bounds, living entities never stack, and nothing
/// stands on movement-blocking terrain.
fn check_spatial(state: &GameState, errors: &mut Vec<EngineError>) {
    let mut occupants: BTreeMap<Position, Vec<&crate::state::Entity>> = BTreeMap::new();
    for entity in state.entities.all() {
        if !state.map.in_bounds(entity.position) {
            errors.push(violation(format!(
                "entity {} at {} is out of bounds",
                entity.id, entity.position
            )));
        }
        if state.map.blocks_movement(entity.position) {
            errors.push(violation(format!(
                "entity {} stands on blocking terrain at {}",
                entity.id, entity.position
            )));
        }
        if !entity.is_dead() {
            occupants.entry(entity.position).or_default().push(entity);
        }
    }
    for (position, group) in occupants {
        // Objects may stack with each other but never with living
        // players or npcs.
        let has_combatant = group
            .iter()
            .any(|e| e.kind != crate::state::EntityKind::Object);
        if group.len() > 1 && has_combatant {
            let ids: Vec<&str> = group.iter().map(|e| e.id.as_str()).collect();
            errors.push(violation(format!(
                "living entities {} share cell {position}",
                ids.join(", ")
            )));
        }
    }
}

/// Combat mode fields agree: round, initiative order, and the active
/// pointer are either all combat-shaped or all exploration-shaped.
fn check_combat(state: &GameState, errors: &mut Vec<EngineError>) {
    let combat = &state.combat;
    match combat.mode {
        CombatMode::Combat => {
            let active_in_order = combat
                .active_entity_id
                .as_deref()
                .map(|id| combat.initiative_order.iter().any(|o| o == id))
                .unwrap_or(false);
            if combat.round < 1 || combat.initiative_order.is_empty() || !active_in_order {
                errors.push(violation(
                    "combat mode requires round >= 1, a non-empty initiative order, \
                     and an active entity drawn from it"
                        .into(),
                ));
            }
        }
        CombatMode::Exploration => {
            if combat.round != 0
                || !combat.initiative_order.is_empty()
                || combat.active_entity_id.is_some()
            {
                errors.push(violation(
                    "exploration mode requires round 0, no initiative order, \
                     and no active entity"
                        .into(),
                ));
            }
        }
    }
}

/// HP stays within `[0, hpMax]` and zero HP coincides with `dead`.
fn check_vitals(state: &GameState, errors: &mut Vec<EngineError>) {
    for entity in state.entities.all() {
        let stats = &entity.stats;
        if stats.hp_current < 0 || stats.hp_current > stats.hp_max {
            errors.push(violation(format!(
                "entity {} hp {} outside [0, {}]",
                entity.id, stats.hp_current, stats.hp_max
            )));
        }
        if (stats.hp_current == 0) != entity.is_dead() {
            errors.push(violation(format!(
                "entity {} has hp {} but dead={}",
                entity.id,
                stats.hp_current,
                entity.is_dead()
            )));
        }
    }
}

/// Event ids form the dense sequence `evt-0001, evt-0002, …`.
fn check_log(state: &GameState, errors: &mut Vec<EngineError>) {
    for (index, event) in state.log.events.iter().enumerate() {
        let expected = format!("evt-{:04}", index + 1);
        if event.id != expected {
            errors.push(violation(format!(
                "event id {} at position {} should be {expected}",
                event.id, index
            )));
        }
    }
}

/// Turn-budget counters are 0 or 1.
fn check_budget(state: &GameState, errors: &mut Vec<EngineError>) {
    if let Some(budget) = state.combat.turn_budget {
        for (name, used) in [
            ("movementUsed", budget.movement_used),
            ("actionUsed", budget.action_used),
            ("bonusActionUsed", budget.bonus_action_used),
        ] {
            if used > 1 {
                errors.push(violation(format!("turn budget {name} is {used}")));
            }
        }
    }
}
