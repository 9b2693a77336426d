//! Deterministic core of the skirmish tactical-combat engine.
//!
//! `skirmish-engine` defines the canonical state model, the action
//! dispatcher, pathfinding, the NPC planner, and the replay machinery.
//! All state mutation flows through [`dispatch::apply_action`]; session
//! and client layers depend on the types re-exported here.

pub mod action;
pub mod dispatch;
pub mod error;
pub mod path;
pub mod planner;
pub mod replay;
pub mod rng;
pub mod rules;
pub mod state;
pub mod testing;

pub use action::{ActionSummary, DeclaredAction};
pub use dispatch::{apply_action, apply_action_value, DispatchOutcome};
pub use error::{EngineError, ErrorCode};
pub use path::{find_path, find_path_to_adjacent, PathOptions};
pub use planner::{plan, plan_multi, Difficulty, DifficultyPreset};
pub use replay::{
    load_bundle, load_scenario, run as run_replay, save_bundle, save_scenario, state_hash,
    ExpectedEvent, FinalCheck, ReplayBundle, ReplayIoError, ReplayMeta, ReplayReport, ReplayStep,
};
pub use state::{
    AbilityId, CombatMode, CombatState, CombatWinner, ConditionKind, Controller, ControllerKind,
    DamageDice, EngineEvent, EntitiesState, Entity, EntityIndex, EntityKind, EventBody, EventLog,
    EventType, GameState, GridKind, GridSize, GridSpec, InitiativeEntry, MapState, Position,
    RngMode, RngState, RollRecord, Stats, TerrainKind, TerrainTile, TurnBudget, UiState,
};
