//! NPC turn planner: a stateless policy that turns a state snapshot into
//! an ordered action sequence for one npc.
//!
//! The planner never mutates the state it reads. Its one probabilistic
//! choice (substituting a melee ability for a plain attack) samples the
//! state's RNG derivation without consuming a roll, so planning stays
//! replay-deterministic.

use serde::{Deserialize, Serialize};

use crate::action::DeclaredAction;
use crate::path::{self, PathOptions};
use crate::rng;
use crate::rules::abilities::{self, AbilityKind};
use crate::rules::conditions;
use crate::state::{AbilityId, Entity, EntityKind, GameState, Position};

/// Opponent presets gating how eagerly npcs spend abilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

#[derive(Clone, Copy, Debug)]
pub struct DifficultyPreset {
    /// Percent chance a melee ability replaces a plain attack.
    pub ability_use_probability: u32,
}

impl Difficulty {
    pub fn preset(self) -> DifficultyPreset {
        match self {
            Difficulty::Easy => DifficultyPreset {
                ability_use_probability: 25,
            },
            Difficulty::Normal => DifficultyPreset {
                ability_use_probability: 50,
            },
            Difficulty::Hard => DifficultyPreset {
                ability_use_probability: 75,
            },
        }
    }
}

/// Basic policy: attack an adjacent hostile, otherwise walk toward the
/// nearest reachable one, then end the turn.
pub fn plan(state: &GameState, npc_id: &str) -> Vec<DeclaredAction> {
    let end_turn = DeclaredAction::EndTurn {
        entity_id: npc_id.to_string(),
    };

    let Some(me) = state.entity(npc_id) else {
        return vec![end_turn];
    };
    if conditions::skips_turn(me) {
        return vec![end_turn];
    }

    let hostiles = hostiles_of(state, me);
    if hostiles.is_empty() {
        return vec![end_turn];
    }

    if let Some(target) = nearest_adjacent(me, &hostiles) {
        return vec![
            DeclaredAction::Attack {
                attacker_id: npc_id.to_string(),
                target_id: target.id.clone(),
            },
            end_turn,
        ];
    }

    if let Some((path, target_id, reaches)) = approach(state, me, &hostiles) {
        let mut actions = vec![DeclaredAction::Move {
            entity_id: npc_id.to_string(),
            path,
        }];
        if reaches {
            actions.push(DeclaredAction::Attack {
                attacker_id: npc_id.to_string(),
                target_id,
            });
        }
        actions.push(end_turn);
        return actions;
    }

    vec![end_turn]
}

/// Extended policy: may open with a ranged ability, heal a wounded ally,
/// or swap the melee attack for an ability, all gated by the preset.
pub fn plan_multi(state: &GameState, npc_id: &str, difficulty: Difficulty) -> Vec<DeclaredAction> {
    let preset = difficulty.preset();
    let end_turn = DeclaredAction::EndTurn {
        entity_id: npc_id.to_string(),
    };

    let Some(me) = state.entity(npc_id) else {
        return vec![end_turn];
    };
    if conditions::skips_turn(me) {
        return vec![end_turn];
    }

    let hostiles = hostiles_of(state, me);
    if hostiles.is_empty() {
        return vec![end_turn];
    }

    let mut actions = Vec::new();
    let mut action_spent = false;

    // Ranged opener: a target in ability range but outside melee reach.
    if let Some((ability, target_id)) = ranged_ability_shot(me, &hostiles) {
        actions.push(DeclaredAction::UseAbility {
            caster_id: npc_id.to_string(),
            ability_id: ability,
            target_id,
        });
        action_spent = true;
    }

    // Triage: patch up the most injured ally in range.
    if !action_spent {
        if let Some((ability, target_id)) = heal_most_injured(state, me) {
            actions.push(DeclaredAction::UseAbility {
                caster_id: npc_id.to_string(),
                ability_id: ability,
                target_id,
            });
            action_spent = true;
        }
    }

    let adjacent = nearest_adjacent(me, &hostiles);
    if let Some(target) = adjacent {
        if !action_spent {
            actions.push(melee_action(state, me, &target.id, preset));
        }
    } else if let Some((path, target_id, reaches)) = approach(state, me, &hostiles) {
        actions.push(DeclaredAction::Move {
            entity_id: npc_id.to_string(),
            path,
        });
        if reaches && !action_spent {
            actions.push(melee_action(state, me, &target_id, preset));
        }
    }

    actions.push(end_turn);
    actions
}

/// Living entities of the opposite kind, nearest first (Manhattan, then
/// id for determinism).
fn hostiles_of<'a>(state: &'a GameState, me: &Entity) -> Vec<&'a Entity> {
    let list = match me.kind {
        EntityKind::Npc => &state.entities.players,
        _ => &state.entities.npcs,
    };
    let mut hostiles: Vec<&Entity> = list.iter().filter(|e| !e.is_dead()).collect();
    hostiles.sort_by_key(|e| (me.position.manhattan(e.position), e.id.clone()));
    hostiles
}

fn nearest_adjacent<'a>(me: &Entity, hostiles: &[&'a Entity]) -> Option<&'a Entity> {
    hostiles
        .iter()
        .find(|e| me.position.chebyshev(e.position) <= 1)
        .copied()
}

/// Path toward the first reachable hostile, clipped to movement speed.
/// Returns the path, the hostile's id, and whether the clipped path ends
/// in melee reach.
fn approach(
    state: &GameState,
    me: &Entity,
    hostiles: &[&Entity],
) -> Option<(Vec<Position>, String, bool)> {
    for hostile in hostiles {
        let Some(mut path) =
            path::find_path_to_adjacent(state, &me.id, &hostile.id, PathOptions::default())
        else {
            continue;
        };
        if path.is_empty() {
            continue;
        }
        path.truncate(me.stats.movement_speed as usize);
        let Some(&last) = path.last() else { continue };
        let reaches = last.chebyshev(hostile.position) <= 1;
        return Some((path, hostile.id.clone(), reaches));
    }
    None
}

/// First known attack ability off cooldown with reach beyond melee and a
/// hostile inside its range but not adjacent.
fn ranged_ability_shot(me: &Entity, hostiles: &[&Entity]) -> Option<(AbilityId, String)> {
    for &ability in &me.abilities {
        let spec = abilities::spec(ability);
        if spec.kind != AbilityKind::Attack || spec.range <= 1 {
            continue;
        }
        if me.cooldown_remaining(ability) > 0 {
            continue;
        }
        let target = hostiles.iter().find(|e| {
            let distance = me.position.chebyshev(e.position);
            distance > 1 && distance <= spec.range
        });
        if let Some(target) = target {
            return Some((ability, target.id.clone()));
        }
    }
    None
}

/// First known heal ability off cooldown with an ally below half HP in
/// range; picks the lowest-HP ally.
fn heal_most_injured(state: &GameState, me: &Entity) -> Option<(AbilityId, String)> {
    for &ability in &me.abilities {
        let spec = abilities::spec(ability);
        if spec.kind != AbilityKind::Heal || me.cooldown_remaining(ability) > 0 {
            continue;
        }
        let list = match me.kind {
            EntityKind::Player => &state.entities.players,
            _ => &state.entities.npcs,
        };
        let mut wounded: Vec<&Entity> = list
            .iter()
            .filter(|e| !e.is_dead())
            .filter(|e| e.stats.hp_current * 2 < e.stats.hp_max)
            .filter(|e| me.position.chebyshev(e.position) <= spec.range)
            .collect();
        wounded.sort_by_key(|e| (e.stats.hp_current, e.id.clone()));
        if let Some(target) = wounded.first() {
            return Some((ability, target.id.clone()));
        }
    }
    None
}

/// Plain attack, or a melee ability when the preset's probability gate
/// opens and one is ready.
fn melee_action(
    state: &GameState,
    me: &Entity,
    target_id: &str,
    preset: DifficultyPreset,
) -> DeclaredAction {
    let roll = rng::preview_percent(state, "melee-ability");
    if roll < preset.ability_use_probability {
        let melee_ability = me.abilities.iter().copied().find(|&ability| {
            let spec = abilities::spec(ability);
            spec.kind == AbilityKind::Attack
                && spec.range <= 1
                && me.cooldown_remaining(ability) == 0
        });
        if let Some(ability) = melee_ability {
            return DeclaredAction::UseAbility {
                caster_id: me.id.clone(),
                ability_id: ability,
                target_id: target_id.to_string(),
            };
        }
    }
    DeclaredAction::Attack {
        attacker_id: me.id.clone(),
        target_id: target_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConditionKind;
    use crate::testing;

    #[test]
    fn missing_or_stunned_npc_just_ends_turn() {
        let state = testing::combat_state();
        assert_eq!(
            plan(&state, "npc-99"),
            vec![DeclaredAction::EndTurn {
                entity_id: "npc-99".into()
            }]
        );

        let mut stunned = state.clone();
        conditions::apply_condition(
            stunned.entity_mut("npc-01").unwrap(),
            ConditionKind::Stunned,
            1,
        );
        assert_eq!(
            plan(&stunned, "npc-01"),
            vec![DeclaredAction::EndTurn {
                entity_id: "npc-01".into()
            }]
        );
    }

    #[test]
    fn adjacent_hostile_is_attacked() {
        let mut state = testing::combat_state();
        state.entity_mut("npc-01").unwrap().position = Position::new(0, 1);
        let actions = plan(&state, "npc-01");
        assert_eq!(
            actions,
            vec![
                DeclaredAction::Attack {
                    attacker_id: "npc-01".into(),
                    target_id: "pc-01".into(),
                },
                DeclaredAction::EndTurn {
                    entity_id: "npc-01".into()
                },
            ]
        );
    }

    #[test]
    fn reachable_hostile_draws_a_move_then_attack() {
        let mut state = testing::combat_state();
        state.entity_mut("npc-01").unwrap().position = Position::new(3, 0);
        let actions = plan(&state, "npc-01");
        assert_eq!(actions.len(), 3);
        let DeclaredAction::Move { entity_id, path } = &actions[0] else {
            panic!("expected MOVE, got {:?}", actions[0]);
        };
        assert_eq!(entity_id, "npc-01");
        assert_eq!(path.len(), 2);
        assert!(matches!(actions[1], DeclaredAction::Attack { .. }));
        assert!(matches!(actions[2], DeclaredAction::EndTurn { .. }));
    }

    #[test]
    fn out_of_reach_hostile_still_draws_a_partial_move() {
        // npc-01 at (5,5) cannot close 9 cells with speed 6; it moves as
        // far as it can and ends the turn without attacking.
        let state = testing::combat_state();
        let actions = plan(&state, "npc-01");
        assert_eq!(actions.len(), 2);
        let DeclaredAction::Move { path, .. } = &actions[0] else {
            panic!("expected MOVE, got {:?}", actions[0]);
        };
        assert_eq!(path.len(), 6);
        assert!(matches!(actions[1], DeclaredAction::EndTurn { .. }));
    }

    #[test]
    fn plan_never_mutates_the_state() {
        let state = testing::combat_state();
        let snapshot = state.clone();
        let _ = plan(&state, "npc-01");
        let _ = plan_multi(&state, "npc-01", Difficulty::Hard);
        assert_eq!(state, snapshot);
    }

    #[test]
    fn ranged_ability_opens_when_target_is_out_of_reach() {
        let mut state = testing::combat_state();
        state
            .entity_mut("npc-01")
            .unwrap()
            .abilities
            .push(AbilityId::Fireball);
        // pc-01 is at (0,0), npc-01 at (5,5): distance 5, within fireball
        // range 6 but not adjacent.
        let actions = plan_multi(&state, "npc-01", Difficulty::Normal);
        assert!(matches!(
            actions[0],
            DeclaredAction::UseAbility {
                ability_id: AbilityId::Fireball,
                ..
            }
        ));
        assert!(matches!(actions.last(), Some(DeclaredAction::EndTurn { .. })));
    }

    #[test]
    fn wounded_ally_gets_healed_before_fighting() {
        let mut state = testing::combat_state();
        state
            .entities
            .npcs
            .push(testing::fighter("npc-02", EntityKind::Npc, Position::new(5, 6)));
        state.entity_mut("npc-02").unwrap().stats.hp_current = 3;
        state
            .entity_mut("npc-01")
            .unwrap()
            .abilities
            .push(AbilityId::HealingWord);
        let actions = plan_multi(&state, "npc-01", Difficulty::Normal);
        assert!(matches!(
            &actions[0],
            DeclaredAction::UseAbility {
                ability_id: AbilityId::HealingWord,
                target_id,
                ..
            } if target_id == "npc-02"
        ));
    }
}
