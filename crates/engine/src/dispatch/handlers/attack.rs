//! ATTACK: d20 to hit against effective AC, then damage dice.

use crate::error::{EngineError, ErrorCode};
use crate::rng;
use crate::rules::{apply_damage, conditions};
use crate::state::{DamageDice, EventBody, GameState};

/// Rolls a d20 honoring net advantage: positive rolls twice and keeps
/// the higher, negative keeps the lower, zero rolls once.
pub(crate) fn roll_d20_with_advantage(state: &mut GameState, advantage: i32) -> u32 {
    if advantage == 0 {
        return rng::roll_die(state, 20);
    }
    let first = rng::roll_die(state, 20);
    let second = rng::roll_die(state, 20);
    if advantage > 0 {
        first.max(second)
    } else {
        first.min(second)
    }
}

pub(crate) fn apply(
    state: &mut GameState,
    attacker_id: &str,
    target_id: &str,
) -> Result<(), EngineError> {
    if attacker_id == target_id {
        return Err(EngineError::new(
            ErrorCode::SelfAttack,
            format!("{attacker_id} cannot attack itself"),
        ));
    }

    let attacker = state.entity(attacker_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {attacker_id}"))
    })?;
    if attacker.is_dead() {
        return Err(EngineError::new(
            ErrorCode::DeadEntity,
            format!("{attacker_id} is dead and cannot attack"),
        ));
    }
    let target = state.entity(target_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {target_id}"))
    })?;
    if target.is_dead() {
        return Err(EngineError::new(
            ErrorCode::TargetDead,
            format!("{target_id} is already dead"),
        ));
    }

    let distance = attacker.position.chebyshev(target.position);
    let range = attacker.stats.attack_range();
    if distance > range {
        return Err(EngineError::new(
            ErrorCode::OutOfRange,
            format!("target at distance {distance} exceeds range {range}"),
        ));
    }

    // Gather scalars before rolling; the RNG mutates the state.
    let melee = distance <= 1;
    let mut advantage = conditions::prone_target_advantage(target, melee);
    if conditions::attack_disadvantage(attacker) {
        advantage -= 1;
    }
    let attack_bonus = attacker.stats.attack_bonus() + conditions::attack_modifier(attacker);
    let dice = attacker.stats.damage_dice.unwrap_or(DamageDice(1, 4));
    let target_ac = target.stats.ac + conditions::ac_modifier(target);
    let hp_before = target.stats.hp_current;

    let attack_roll = i64::from(roll_d20_with_advantage(state, advantage)) + attack_bonus;
    let hit = attack_roll >= target_ac;

    let mut damage = 0;
    let mut target_hp_after = hp_before;
    if hit {
        damage = rng::roll(state, dice.count(), dice.sides()).total;
        if let Some(target) = state.entity_mut(target_id) {
            (target_hp_after, _) = apply_damage(target, damage);
        }
    }

    state.push_event(EventBody::AttackResolved {
        attacker_id: attacker_id.to_string(),
        target_id: target_id.to_string(),
        attack_roll,
        target_ac,
        hit,
        damage,
        target_hp_after,
    });
    Ok(())
}
