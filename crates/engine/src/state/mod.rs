//! Authoritative game state representation.
//!
//! This module owns the data structures that describe the map, entities,
//! combat bookkeeping, the RNG record, and the append-only event log. The
//! dispatcher is the only producer of new state values; everything else
//! reads or clones.

pub mod combat;
pub mod common;
pub mod entity;
pub mod event;
pub mod invariants;
pub mod map;
pub mod schema;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use combat::{CombatMode, CombatState, TurnBudget};
pub use common::Position;
pub use entity::{
    AbilityId, ConditionKind, Controller, ControllerKind, DamageDice, Entity, EntityKind, Stats,
};
pub use event::{
    CombatWinner, EngineEvent, EventBody, EventType, InitiativeEntry,
};
pub use map::{GridKind, GridSize, GridSpec, MapState, TerrainKind, TerrainTile};

/// Canonical snapshot of the deterministic game state.
///
/// Each dispatch produces a fresh value; the previous value is never
/// mutated. The `ui` block is cosmetic and excluded from the state hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub schema_version: String,
    pub campaign_id: String,
    pub session_id: String,
    pub timestamp: String,
    pub rng: RngState,
    pub map: MapState,
    pub entities: EntitiesState,
    pub combat: CombatState,
    pub log: EventLog,
    pub ui: UiState,
}

/// Deterministic RNG record carried inside the state.
///
/// The seed string plus the roll history fully determine every future
/// roll; there is no process-global random source in the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RngState {
    pub mode: RngMode,
    pub seed: Option<String>,
    pub last_rolls: Vec<RollRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RngMode {
    Seeded,
    Manual,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollRecord {
    /// Dice notation, e.g. `"1d20"` or `"2d6"`.
    pub dice: String,
    pub rolls: Vec<u32>,
    pub total: u32,
}

/// Entities kept as three ordered lists. Relative order among surviving
/// members is part of the observable model; dispatch may append on spawn
/// but never reorders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesState {
    pub players: Vec<Entity>,
    pub npcs: Vec<Entity>,
    pub objects: Vec<Entity>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLog {
    pub events: Vec<EngineEvent>,
}

/// Cosmetic client-side selection state; not covered by invariants and
/// excluded from the canonical hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub selected_entity_id: Option<String>,
    pub hovered_cell: Option<Position>,
}

/// Lookup table from entity id to its kind and list index, derived from
/// the three kind lists which remain the source of truth.
pub struct EntityIndex<'a> {
    by_id: BTreeMap<&'a str, (EntityKind, usize)>,
}

impl<'a> EntityIndex<'a> {
    pub fn build(entities: &'a EntitiesState) -> Self {
        let mut by_id = BTreeMap::new();
        for (kind, list) in [
            (EntityKind::Player, &entities.players),
            (EntityKind::Npc, &entities.npcs),
            (EntityKind::Object, &entities.objects),
        ] {
            for (index, entity) in list.iter().enumerate() {
                by_id.insert(entity.id.as_str(), (kind, index));
            }
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<(EntityKind, usize)> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }
}

impl EntitiesState {
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.all().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.players
            .iter_mut()
            .chain(self.npcs.iter_mut())
            .chain(self.objects.iter_mut())
            .find(|e| e.id == id)
    }

    /// Iterates players, then npcs, then objects, in list order.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.players
            .iter()
            .chain(self.npcs.iter())
            .chain(self.objects.iter())
    }

    /// Living (non-dead) players and npcs; objects never participate.
    pub fn combatants(&self) -> impl Iterator<Item = &Entity> {
        self.players
            .iter()
            .chain(self.npcs.iter())
            .filter(|e| !e.is_dead())
    }

    pub fn living_ids(&self, kind: EntityKind) -> Vec<String> {
        let list = match kind {
            EntityKind::Player => &self.players,
            EntityKind::Npc => &self.npcs,
            EntityKind::Object => &self.objects,
        };
        list.iter()
            .filter(|e| !e.is_dead())
            .map(|e| e.id.clone())
            .collect()
    }
}

impl GameState {
    /// Appends an event, assigning the next dense `evt-NNNN` id and the
    /// state's timestamp. The id is derived from the log length at the
    /// moment of emission so ids stay dense within a dispatch.
    pub fn push_event(&mut self, body: EventBody) {
        let id = format!("evt-{:04}", self.log.events.len() + 1);
        self.log.events.push(EngineEvent {
            id,
            timestamp: self.timestamp.clone(),
            body,
        });
    }

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.entity(id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.entity_mut(id)
    }

    /// Cells occupied by living players and npcs, optionally excluding one
    /// mover. Objects never block movement.
    pub fn occupied_cells(&self, exclude: Option<&str>) -> Vec<Position> {
        self.entities
            .players
            .iter()
            .chain(self.entities.npcs.iter())
            .filter(|e| !e.is_dead())
            .filter(|e| Some(e.id.as_str()) != exclude)
            .map(|e| e.position)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn event_ids_are_dense_and_zero_padded() {
        let mut state = testing::empty_state();
        state.push_event(EventBody::RngSeedSet {
            previous_seed: None,
            previous_mode: RngMode::Seeded,
            next_seed: "abc".into(),
            mode: RngMode::Seeded,
        });
        state.push_event(EventBody::RngSeedSet {
            previous_seed: Some("abc".into()),
            previous_mode: RngMode::Seeded,
            next_seed: "def".into(),
            mode: RngMode::Seeded,
        });
        assert_eq!(state.log.events[0].id, "evt-0001");
        assert_eq!(state.log.events[1].id, "evt-0002");
    }

    #[test]
    fn entity_index_spans_all_three_lists() {
        let state = testing::two_sided_state();
        let index = EntityIndex::build(&state.entities);
        assert_eq!(index.get("pc-01"), Some((EntityKind::Player, 0)));
        assert_eq!(index.get("npc-01"), Some((EntityKind::Npc, 0)));
        assert!(!index.contains("ghost"));
    }

    #[test]
    fn occupied_cells_skip_dead_and_mover() {
        let mut state = testing::two_sided_state();
        state
            .entity_mut("npc-01")
            .unwrap()
            .conditions
            .push(ConditionKind::Dead);
        let cells = state.occupied_cells(Some("pc-01"));
        assert!(!cells.contains(&state.entity("pc-01").unwrap().position));
        assert!(!cells.contains(&state.entity("npc-01").unwrap().position));
    }
}
