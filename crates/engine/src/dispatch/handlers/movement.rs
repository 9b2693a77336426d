//! MOVE: walk a declared cardinal path through validated cells.

use std::collections::BTreeSet;

use crate::error::{EngineError, ErrorCode};
use crate::state::{EventBody, GameState, Position};

pub(crate) fn apply(
    state: &mut GameState,
    entity_id: &str,
    path: &[Position],
) -> Result<(), EngineError> {
    if path.is_empty() {
        return Err(EngineError::new(ErrorCode::PathEmpty, "path has no steps"));
    }

    let entity = state.entity(entity_id).ok_or_else(|| {
        EngineError::new(ErrorCode::EntityNotFound, format!("no entity {entity_id}"))
    })?;
    if entity.is_dead() {
        return Err(EngineError::new(
            ErrorCode::DeadEntity,
            format!("{entity_id} is dead and cannot move"),
        ));
    }
    let speed = entity.stats.movement_speed;
    if path.len() as u32 > speed {
        return Err(EngineError::new(
            ErrorCode::OutOfRange,
            format!("path length {} exceeds movement speed {speed}", path.len()),
        ));
    }

    let origin = entity.position;
    let occupied: BTreeSet<Position> =
        state.occupied_cells(Some(entity_id)).into_iter().collect();

    // Every intermediate step is validated, not just the destination.
    let mut previous = origin;
    for &step in path {
        if previous.manhattan(step) != 1 {
            return Err(EngineError::new(
                ErrorCode::DiagonalMove,
                format!("step {previous} -> {step} is not a cardinal move"),
            ));
        }
        if !state.map.in_bounds(step) || state.map.blocks_movement(step) {
            return Err(EngineError::new(
                ErrorCode::BlockedCell,
                format!("cell {step} cannot be entered"),
            ));
        }
        if occupied.contains(&step) {
            return Err(EngineError::new(
                ErrorCode::Overlap,
                format!("cell {step} is occupied"),
            ));
        }
        previous = step;
    }

    let final_position = previous;
    if let Some(entity) = state.entity_mut(entity_id) {
        entity.position = final_position;
    }
    state.push_event(EventBody::MoveApplied {
        entity_id: entity_id.to_string(),
        path: path.to_vec(),
        final_position,
        original_position: origin,
    });
    Ok(())
}
