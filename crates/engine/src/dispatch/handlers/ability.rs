//! USE_ABILITY: catalogue-driven attacks and heals with cooldowns.

use crate::error::{EngineError, ErrorCode};
use crate::rng;
use crate::rules::abilities::{self, AbilityKind, Targeting};
use crate::rules::{apply_damage, apply_healing, conditions};
use crate::state::{AbilityId, EntityKind, EventBody, GameState};

pub(crate) fn apply(
    state: &mut GameState,
    caster_id: &str,
    ability_id: AbilityId,
    target_id: &str,
) -> Result<(), EngineError> {
    let spec = abilities::spec(ability_id);

    let caster = state.entity(caster_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {caster_id}"))
    })?;
    if caster.is_dead() {
        return Err(EngineError::new(
            ErrorCode::DeadEntity,
            format!("{caster_id} is dead and cannot use abilities"),
        ));
    }
    let target = state.entity(target_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {target_id}"))
    })?;
    // Heals may target the dead (and revive them); attacks may not.
    if target.is_dead() && spec.kind != AbilityKind::Heal {
        return Err(EngineError::new(
            ErrorCode::TargetDead,
            format!("{target_id} is already dead"),
        ));
    }

    let distance = caster.position.chebyshev(target.position);
    if distance > spec.range {
        return Err(EngineError::new(
            ErrorCode::OutOfRange,
            format!("target at distance {distance} exceeds range {}", spec.range),
        ));
    }

    let sides_match = match spec.targeting {
        Targeting::Ally => caster.kind == target.kind,
        Targeting::Enemy => matches!(
            (caster.kind, target.kind),
            (EntityKind::Player, EntityKind::Npc) | (EntityKind::Npc, EntityKind::Player)
        ),
    };
    if !sides_match {
        return Err(EngineError::new(
            ErrorCode::InvalidAction,
            format!("{ability_id} cannot target {target_id}"),
        ));
    }

    let remaining = caster.cooldown_remaining(ability_id);
    if remaining > 0 {
        return Err(EngineError::new(
            ErrorCode::InvalidAction,
            format!("{ability_id} is on cooldown for {remaining} more rounds"),
        ));
    }

    let target_ac = target.stats.ac + conditions::ac_modifier(target);
    let hp_before = target.stats.hp_current;

    let mut attack_roll = None;
    let mut hit = None;
    let mut damage = None;
    let mut healing = None;
    let mut condition_applied = None;
    let mut target_hp_after = hp_before;

    match spec.kind {
        AbilityKind::Attack => {
            let roll = i64::from(rng::roll_die(state, 20)) + spec.attack_bonus;
            attack_roll = Some(roll);
            let landed = roll >= target_ac;
            hit = Some(landed);
            if landed {
                let dealt = rng::roll(state, spec.dice.count(), spec.dice.sides()).total;
                damage = Some(dealt);
                if let Some(target) = state.entity_mut(target_id) {
                    (target_hp_after, _) = apply_damage(target, dealt);
                    if target_hp_after > 0 {
                        if let Some((kind, duration)) = spec.condition_apply {
                            conditions::apply_condition(target, kind, duration);
                            condition_applied = Some(kind);
                        }
                    }
                }
            }
        }
        AbilityKind::Heal => {
            let rolled = rng::roll(state, spec.dice.count(), spec.dice.sides()).total;
            if let Some(target) = state.entity_mut(target_id) {
                let (restored, after) = apply_healing(target, rolled);
                healing = Some(restored);
                target_hp_after = after;
                // A heal that brings HP above zero clears the death
                // state, keeping hp==0 <=> dead intact.
                if after > 0 {
                    target.conditions.retain(|&c| c != crate::state::ConditionKind::Dead);
                }
            }
        }
    }

    if let Some(caster) = state.entity_mut(caster_id) {
        caster.ability_cooldowns.insert(ability_id, spec.cooldown);
    }

    state.push_event(EventBody::AbilityUsed {
        caster_id: caster_id.to_string(),
        ability_id,
        target_id: target_id.to_string(),
        attack_roll,
        target_ac: attack_roll.map(|_| target_ac),
        hit,
        damage,
        healing,
        target_hp_after,
        condition_applied,
    });
    Ok(())
}
