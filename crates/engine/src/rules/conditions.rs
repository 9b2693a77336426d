//! Condition catalogue: mechanical hooks, durations, and turn ticks.
//!
//! Durations live in `entity.conditionDurations`; 0 means the condition
//! is sticky (or permanent, for `dead`) and only leaves by explicit
//! removal. End-of-turn ticks decrement positive durations and expire at
//! zero; start-of-turn hooks apply damage over time.

use crate::rng;
use crate::rules::apply_damage;
use crate::state::{ConditionKind, Entity, EventBody, GameState};

/// Default duration in rounds when a condition is applied without an
/// explicit one. Zero is sticky.
pub fn default_duration(kind: ConditionKind) -> u32 {
    match kind {
        ConditionKind::Dead => 0,
        ConditionKind::Stunned => 1,
        ConditionKind::Poisoned => 3,
        ConditionKind::Prone => 0,
        ConditionKind::Blessed => 3,
        ConditionKind::Burning => 3,
        ConditionKind::Dodging => 1,
    }
}

/// Net AC adjustment from active conditions: stunned -2, dodging +2.
pub fn ac_modifier(entity: &Entity) -> i64 {
    entity
        .conditions
        .iter()
        .map(|kind| match kind {
            ConditionKind::Stunned => -2,
            ConditionKind::Dodging => 2,
            _ => 0,
        })
        .sum()
}

/// Net attack-roll adjustment: blessed +2.
pub fn attack_modifier(entity: &Entity) -> i64 {
    entity
        .conditions
        .iter()
        .map(|kind| match kind {
            ConditionKind::Blessed => 2,
            _ => 0,
        })
        .sum()
}

/// Poisoned attackers roll with disadvantage.
pub fn attack_disadvantage(entity: &Entity) -> bool {
    entity.has_condition(ConditionKind::Poisoned)
}

/// Advantage contribution from attacking a prone target: +1 in melee,
/// -1 at range.
pub fn prone_target_advantage(target: &Entity, melee: bool) -> i32 {
    if !target.has_condition(ConditionKind::Prone) {
        0
    } else if melee {
        1
    } else {
        -1
    }
}

/// Dead and stunned entities skip their turn entirely.
pub fn skips_turn(entity: &Entity) -> bool {
    entity.has_condition(ConditionKind::Dead) || entity.has_condition(ConditionKind::Stunned)
}

/// Adds a condition if absent and records its duration (0 = sticky).
pub fn apply_condition(entity: &mut Entity, kind: ConditionKind, duration: u32) {
    if !entity.has_condition(kind) {
        entity.conditions.push(kind);
    }
    if duration > 0 {
        entity.condition_durations.insert(kind, duration);
    }
}

/// End-of-turn tick for the exiting entity: positive durations count
/// down; reaching zero removes the condition and logs the expiry.
pub fn tick_end_of_turn(state: &mut GameState, entity_id: &str) {
    let Some(entity) = state.entity_mut(entity_id) else {
        return;
    };
    let mut expired = Vec::new();
    for kind in entity.conditions.clone() {
        let Some(&remaining) = entity.condition_durations.get(&kind) else {
            continue;
        };
        if remaining <= 1 {
            entity.conditions.retain(|&c| c != kind);
            entity.condition_durations.remove(&kind);
            expired.push(kind);
        } else {
            entity.condition_durations.insert(kind, remaining - 1);
        }
    }
    for condition in expired {
        state.push_event(EventBody::ConditionExpired {
            entity_id: entity_id.to_string(),
            condition,
        });
    }
}

/// Start-of-turn hook for the entering entity. Burning deals 1d4 fire
/// damage, which can kill.
pub fn run_start_of_turn(state: &mut GameState, entity_id: &str) {
    let burning = state
        .entity(entity_id)
        .map(|e| e.has_condition(ConditionKind::Burning) && !e.is_dead())
        .unwrap_or(false);
    if !burning {
        return;
    }
    let damage = rng::roll_die(state, 4);
    let Some(entity) = state.entity_mut(entity_id) else {
        return;
    };
    let (hp_after, _died) = apply_damage(entity, damage);
    state.push_event(EventBody::ConditionDamage {
        entity_id: entity_id.to_string(),
        condition: ConditionKind::Burning,
        damage,
        hp_after,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntityKind, EventType, Position};
    use crate::testing;

    #[test]
    fn modifiers_stack_per_condition() {
        let mut entity = testing::fighter("pc-01", EntityKind::Player, Position::new(0, 0));
        apply_condition(&mut entity, ConditionKind::Stunned, 1);
        apply_condition(&mut entity, ConditionKind::Dodging, 1);
        assert_eq!(ac_modifier(&entity), 0);
        apply_condition(&mut entity, ConditionKind::Blessed, 3);
        assert_eq!(attack_modifier(&entity), 2);
    }

    #[test]
    fn reapplying_a_condition_does_not_duplicate_it() {
        let mut entity = testing::fighter("pc-01", EntityKind::Player, Position::new(0, 0));
        apply_condition(&mut entity, ConditionKind::Poisoned, 3);
        apply_condition(&mut entity, ConditionKind::Poisoned, 2);
        assert_eq!(entity.conditions.len(), 1);
        assert_eq!(
            entity.condition_durations.get(&ConditionKind::Poisoned),
            Some(&2)
        );
    }

    #[test]
    fn end_of_turn_expires_at_zero() {
        let mut state = testing::combat_state();
        {
            let entity = state.entity_mut("pc-01").unwrap();
            apply_condition(entity, ConditionKind::Dodging, 1);
            apply_condition(entity, ConditionKind::Poisoned, 2);
        }
        tick_end_of_turn(&mut state, "pc-01");
        let entity = state.entity("pc-01").unwrap();
        assert!(!entity.has_condition(ConditionKind::Dodging));
        assert!(entity.has_condition(ConditionKind::Poisoned));
        assert_eq!(
            entity.condition_durations.get(&ConditionKind::Poisoned),
            Some(&1)
        );
        let expirations: Vec<_> = state
            .log
            .events
            .iter()
            .filter(|e| e.event_type() == EventType::ConditionExpired)
            .collect();
        assert_eq!(expirations.len(), 1);
    }

    #[test]
    fn sticky_conditions_never_tick() {
        let mut state = testing::combat_state();
        {
            let entity = state.entity_mut("pc-01").unwrap();
            apply_condition(entity, ConditionKind::Prone, 0);
        }
        tick_end_of_turn(&mut state, "pc-01");
        assert!(state
            .entity("pc-01")
            .unwrap()
            .has_condition(ConditionKind::Prone));
    }

    #[test]
    fn burning_damages_at_start_of_turn() {
        let mut state = testing::combat_state();
        {
            let entity = state.entity_mut("pc-01").unwrap();
            apply_condition(entity, ConditionKind::Burning, 3);
        }
        run_start_of_turn(&mut state, "pc-01");
        let entity = state.entity("pc-01").unwrap();
        assert!(entity.stats.hp_current < 10);
        assert_eq!(state.rng.last_rolls.len(), 1);
        assert_eq!(
            state.log.events.last().unwrap().event_type(),
            EventType::ConditionDamage
        );
    }
}
