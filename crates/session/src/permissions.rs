//! Role permissions and turn authority.
//!
//! The table is closed: GMs may do anything, players act only through
//! their bound entity, spectators watch. Turn authority additionally
//! pins entity-bound actions to the active entity while combat runs.

use serde::{Deserialize, Serialize};

use skirmish_engine::{DeclaredAction, GameState};

use crate::error::SessionError;
use crate::room::{ClientInfo, Role};

/// GM-only room operations outside the engine's action set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    LoadScenario,
    ResetGame,
    SetDifficulty,
    KickPlayer,
}

fn action_name(action: &DeclaredAction) -> &'static str {
    match action {
        DeclaredAction::Move { .. } => "MOVE",
        DeclaredAction::Attack { .. } => "ATTACK",
        DeclaredAction::Defend { .. } => "DEFEND",
        DeclaredAction::UseAbility { .. } => "USE_ABILITY",
        DeclaredAction::EndTurn { .. } => "END_TURN",
        DeclaredAction::RollInitiative => "ROLL_INITIATIVE",
        DeclaredAction::SetSeed { .. } => "SET_SEED",
    }
}

/// Screens an engine action against the submitting client's role.
pub fn can_submit(client: &ClientInfo, action: &DeclaredAction) -> Result<(), SessionError> {
    let denied = || SessionError::PermissionDenied {
        role: client.role,
        action: action_name(action).to_string(),
    };
    match client.role {
        Role::Gm => Ok(()),
        Role::Spectator => Err(denied()),
        Role::Player => {
            // SET_SEED is GM/system authority.
            if matches!(action, DeclaredAction::SetSeed { .. }) {
                return Err(denied());
            }
            match action.actor_id() {
                // Entity-bound actions must act through the bound entity.
                Some(actor) if client.entity_id.as_deref() == Some(actor) => Ok(()),
                Some(_) => Err(denied()),
                // ROLL_INITIATIVE is not entity-bound.
                None => Ok(()),
            }
        }
    }
}

/// Screens an admin operation; the table grants these to GMs alone.
pub fn can_admin(client: &ClientInfo, action: AdminAction) -> Result<(), SessionError> {
    if client.role == Role::Gm {
        Ok(())
    } else {
        Err(SessionError::PermissionDenied {
            role: client.role,
            action: format!("{action:?}"),
        })
    }
}

/// While combat runs, entity-bound actions belong to the active entity.
/// GMs are exempt.
pub fn check_turn_authority(
    client: &ClientInfo,
    action: &DeclaredAction,
    state: &GameState,
) -> Result<(), SessionError> {
    if client.role == Role::Gm || !state.combat.in_combat() {
        return Ok(());
    }
    if let Some(actor) = action.actor_id() {
        if !state.combat.is_active(actor) {
            return Err(SessionError::NotYourTurn {
                active: state
                    .combat
                    .active_entity_id
                    .clone()
                    .unwrap_or_default(),
            });
        }
    }
    Ok(())
}
