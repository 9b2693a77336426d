//! Action handlers. Each receives the working clone, validates its own
//! rules, mutates on success, and appends its events.

mod ability;
mod attack;
mod defend;
mod initiative;
mod movement;
mod seed;
mod turn;

use crate::action::DeclaredAction;
use crate::error::EngineError;
use crate::state::GameState;

/// Routes a declared action to its handler.
pub(crate) fn dispatch(state: &mut GameState, action: &DeclaredAction) -> Result<(), EngineError> {
    match action {
        DeclaredAction::Move { entity_id, path } => movement::apply(state, entity_id, path),
        DeclaredAction::Attack {
            attacker_id,
            target_id,
        } => attack::apply(state, attacker_id, target_id),
        DeclaredAction::Defend { entity_id } => defend::apply(state, entity_id),
        DeclaredAction::UseAbility {
            caster_id,
            ability_id,
            target_id,
        } => ability::apply(state, caster_id, *ability_id, target_id),
        DeclaredAction::EndTurn { entity_id } => turn::apply(state, entity_id),
        DeclaredAction::RollInitiative => initiative::apply(state),
        DeclaredAction::SetSeed { seed } => seed::apply(state, seed),
    }
}
