//! Faction liveness check after every successful commit in combat.

use crate::state::{CombatWinner, EntityKind, EventBody, GameState};

/// Ends combat when either faction has no living members, returning the
/// state to exploration and logging the outcome.
pub(crate) fn check(state: &mut GameState) {
    if !state.combat.in_combat() {
        return;
    }
    let living_players = state.entities.living_ids(EntityKind::Player);
    let living_npcs = state.entities.living_ids(EntityKind::Npc);
    if !living_players.is_empty() && !living_npcs.is_empty() {
        return;
    }

    let winner = match (living_players.is_empty(), living_npcs.is_empty()) {
        (false, true) => CombatWinner::Players,
        (true, false) => CombatWinner::Npcs,
        _ => CombatWinner::None,
    };
    let final_round = state.combat.round;
    state.combat.end_combat();

    tracing::info!(?winner, final_round, "combat ended");
    state.push_event(EventBody::CombatEnded {
        winner,
        final_round,
        living_players,
        living_npcs,
    });
}
