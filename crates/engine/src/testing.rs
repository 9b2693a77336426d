//! Canned states and entity builders shared by unit and integration tests.

use std::collections::BTreeMap;

use crate::state::{
    CombatMode, CombatState, Controller, ControllerKind, DamageDice, Entity, EntityKind,
    EventLog, GameState, GridKind, GridSize, GridSpec, MapState, Position, RngMode, RngState,
    Stats, TurnBudget, UiState,
};

/// A valid exploration-mode state with a 10x10 empty map and no entities.
pub fn empty_state() -> GameState {
    GameState {
        schema_version: "1.0".into(),
        campaign_id: "campaign-test".into(),
        session_id: "session-test".into(),
        timestamp: "2026-01-01T00:00:00Z".into(),
        rng: RngState {
            mode: RngMode::Seeded,
            seed: Some("test-seed".into()),
            last_rolls: Vec::new(),
        },
        map: MapState {
            name: "test-arena".into(),
            grid: GridSpec {
                kind: GridKind::Square,
                size: GridSize {
                    width: 10,
                    height: 10,
                },
                cell_size: 5,
            },
            terrain: Vec::new(),
            fog_of_war_enabled: false,
        },
        entities: crate::state::EntitiesState {
            players: Vec::new(),
            npcs: Vec::new(),
            objects: Vec::new(),
        },
        combat: CombatState::exploration(),
        log: EventLog::default(),
        ui: UiState::default(),
    }
}

/// A basic combat-capable entity: 10 HP, AC 12, speed 6, +4 to hit, 1d6.
pub fn fighter(id: &str, kind: EntityKind, position: Position) -> Entity {
    let controller = match kind {
        EntityKind::Player => Controller {
            kind: ControllerKind::Human,
            player_id: Some(format!("client-{id}")),
        },
        _ => Controller {
            kind: ControllerKind::Ai,
            player_id: None,
        },
    };
    Entity {
        id: id.into(),
        kind,
        name: id.into(),
        position,
        size: 1,
        stats: Stats {
            hp_current: 10,
            hp_max: 10,
            ac: 12,
            movement_speed: 6,
            attack_bonus: Some(4),
            damage_dice: Some(DamageDice(1, 6)),
            attack_range: Some(1),
        },
        conditions: Vec::new(),
        condition_durations: BTreeMap::new(),
        abilities: Vec::new(),
        ability_cooldowns: BTreeMap::new(),
        inventory: Vec::new(),
        token: format!("token-{id}"),
        controller,
    }
}

/// One player at (0,0) and one npc at (5,5), exploration mode.
pub fn two_sided_state() -> GameState {
    let mut state = empty_state();
    state
        .entities
        .players
        .push(fighter("pc-01", EntityKind::Player, Position::new(0, 0)));
    state
        .entities
        .npcs
        .push(fighter("npc-01", EntityKind::Npc, Position::new(5, 5)));
    state
}

/// Two-sided state already in combat: order [pc-01, npc-01], pc-01 active.
pub fn combat_state() -> GameState {
    let mut state = two_sided_state();
    state.combat = CombatState {
        mode: CombatMode::Combat,
        round: 1,
        active_entity_id: Some("pc-01".into()),
        initiative_order: vec!["pc-01".into(), "npc-01".into()],
        turn_budget: Some(TurnBudget::default()),
    };
    state
}
