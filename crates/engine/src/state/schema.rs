//! Structural validation beyond what the boundary parser enforces.
//!
//! Closed enums already reject unknown type strings at deserialization;
//! this pass checks the scalar constraints a typed state can still
//! violate. Failures are state-level: the dispatcher returns the previous
//! state untouched and emits no event.

use crate::error::{EngineError, ErrorCode};
use crate::state::{EntityKind, GameState, Position, RngMode};

fn schema_error(message: String) -> EngineError {
    EngineError::new(ErrorCode::SchemaInvalid, message)
}

/// Validates structural constraints; returns every violation found.
pub fn validate(state: &GameState) -> Vec<EngineError> {
    let mut errors = Vec::new();

    if state.schema_version.is_empty() {
        errors.push(schema_error("schemaVersion must be non-empty".into()));
    }
    if state.campaign_id.is_empty() || state.session_id.is_empty() {
        errors.push(schema_error("campaignId and sessionId must be non-empty".into()));
    }

    let size = state.map.grid.size;
    if size.width < 1 || size.height < 1 {
        errors.push(schema_error(format!(
            "grid size {}x{} must be at least 1x1",
            size.width, size.height
        )));
    }
    if state.map.grid.cell_size == 0 {
        errors.push(schema_error("grid cellSize must be positive".into()));
    }
    for tile in &state.map.terrain {
        if !state.map.in_bounds(Position::new(tile.x, tile.y)) {
            errors.push(schema_error(format!(
                "terrain tile at ({}, {}) is outside the grid",
                tile.x, tile.y
            )));
        }
    }

    if state.rng.mode == RngMode::Seeded && state.rng.seed.as_deref().unwrap_or("").is_empty() {
        errors.push(schema_error("seeded rng mode requires a non-empty seed".into()));
    }

    for (kind, list) in [
        (EntityKind::Player, &state.entities.players),
        (EntityKind::Npc, &state.entities.npcs),
        (EntityKind::Object, &state.entities.objects),
    ] {
        for entity in list {
            if entity.id.is_empty() {
                errors.push(schema_error(format!("{kind:?} entity with empty id")));
            }
            if entity.kind != kind {
                errors.push(schema_error(format!(
                    "entity {} has kind {:?} but is listed under {:?}",
                    entity.id, entity.kind, kind
                )));
            }
            if entity.size == 0 {
                errors.push(schema_error(format!("entity {} has zero size", entity.id)));
            }
            if entity.stats.hp_max < 0 {
                errors.push(schema_error(format!(
                    "entity {} has negative hpMax",
                    entity.id
                )));
            }
            if let Some(dice) = entity.stats.damage_dice {
                if dice.count() == 0 || dice.sides() == 0 {
                    errors.push(schema_error(format!(
                        "entity {} has degenerate damage dice {}d{}",
                        entity.id,
                        dice.count(),
                        dice.sides()
                    )));
                }
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::DamageDice;
    use crate::testing;

    #[test]
    fn valid_state_passes() {
        assert!(validate(&testing::two_sided_state()).is_empty());
    }

    #[test]
    fn seeded_mode_without_seed_fails() {
        let mut state = testing::empty_state();
        state.rng.seed = None;
        let errors = validate(&state);
        assert!(errors.iter().any(|e| e.code == ErrorCode::SchemaInvalid));
    }

    #[test]
    fn mislisted_entity_kind_fails() {
        let mut state = testing::two_sided_state();
        state.entities.players[0].kind = EntityKind::Npc;
        assert!(!validate(&state).is_empty());
    }

    #[test]
    fn zero_sided_dice_fail() {
        let mut state = testing::two_sided_state();
        state.entities.players[0].stats.damage_dice = Some(DamageDice(1, 0));
        assert!(!validate(&state).is_empty());
    }
}
