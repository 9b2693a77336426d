//! DEFEND: raise AC via `dodging` until the next own turn and catch a
//! breath for 2 HP.

use crate::error::{EngineError, ErrorCode};
use crate::rules::{apply_healing, conditions};
use crate::state::{ConditionKind, EventBody, GameState};

const DODGE_AC_BONUS: i64 = 2;
const DODGE_DURATION: u32 = 1;
const DEFEND_HEAL: u32 = 2;

pub(crate) fn apply(state: &mut GameState, entity_id: &str) -> Result<(), EngineError> {
    let entity = state.entity(entity_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {entity_id}"))
    })?;
    if entity.is_dead() {
        return Err(EngineError::new(
            ErrorCode::DeadEntity,
            format!("{entity_id} is dead and cannot defend"),
        ));
    }

    let (effective_ac, hp_healed, hp_after) = {
        let Some(entity) = state.entity_mut(entity_id) else {
            return Err(EngineError::new(
                ErrorCode::EntityNotFound,
                format!("no entity {entity_id}"),
            ));
        };
        conditions::apply_condition(entity, ConditionKind::Dodging, DODGE_DURATION);
        let (healed, after) = apply_healing(entity, DEFEND_HEAL);
        let effective = entity.stats.ac + conditions::ac_modifier(entity);
        (effective, healed, after)
    };

    state.push_event(EventBody::DefendApplied {
        entity_id: entity_id.to_string(),
        ac_bonus: DODGE_AC_BONUS,
        duration: DODGE_DURATION,
        effective_ac,
        hp_healed,
        hp_after,
    });
    Ok(())
}
