//! Fixed ability catalogue and per-entity cooldown bookkeeping.
//!
//! Each entry resolves to an attack or a heal with a range, a targeting
//! side, dice, and a cooldown in rounds. Abilities outside the catalogue
//! cannot be expressed: the ability id space is closed at the parser.

use crate::state::{AbilityId, ConditionKind, DamageDice, Entity};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbilityKind {
    Attack,
    Heal,
}

/// Which side of the player/npc divide an ability may target. `Ally`
/// means the caster's own kind (self included); `Enemy` the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Targeting {
    Enemy,
    Ally,
}

#[derive(Clone, Copy, Debug)]
pub struct AbilitySpec {
    pub id: AbilityId,
    pub kind: AbilityKind,
    pub range: u32,
    pub targeting: Targeting,
    /// Damage dice for attacks, heal dice for heals.
    pub dice: DamageDice,
    pub attack_bonus: i64,
    pub cooldown: u32,
    pub condition_apply: Option<(ConditionKind, u32)>,
}

/// Resolves a catalogue entry. Total over the closed id set.
pub fn spec(id: AbilityId) -> &'static AbilitySpec {
    match id {
        AbilityId::Fireball => &AbilitySpec {
            id: AbilityId::Fireball,
            kind: AbilityKind::Attack,
            range: 6,
            targeting: Targeting::Enemy,
            dice: DamageDice(2, 6),
            attack_bonus: 4,
            cooldown: 3,
            condition_apply: Some((ConditionKind::Burning, 3)),
        },
        AbilityId::PowerAttack => &AbilitySpec {
            id: AbilityId::PowerAttack,
            kind: AbilityKind::Attack,
            range: 1,
            targeting: Targeting::Enemy,
            dice: DamageDice(1, 10),
            attack_bonus: 5,
            cooldown: 2,
            condition_apply: None,
        },
        AbilityId::PoisonStrike => &AbilitySpec {
            id: AbilityId::PoisonStrike,
            kind: AbilityKind::Attack,
            range: 1,
            targeting: Targeting::Enemy,
            dice: DamageDice(1, 6),
            attack_bonus: 4,
            cooldown: 2,
            condition_apply: Some((ConditionKind::Poisoned, 3)),
        },
        AbilityId::HealingWord => &AbilitySpec {
            id: AbilityId::HealingWord,
            kind: AbilityKind::Heal,
            range: 5,
            targeting: Targeting::Ally,
            dice: DamageDice(1, 8),
            attack_bonus: 0,
            cooldown: 2,
            condition_apply: None,
        },
        AbilityId::SecondWind => &AbilitySpec {
            id: AbilityId::SecondWind,
            kind: AbilityKind::Heal,
            range: 0,
            targeting: Targeting::Ally,
            dice: DamageDice(1, 10),
            attack_bonus: 0,
            cooldown: 3,
            condition_apply: None,
        },
    }
}

/// End-of-turn cooldown tick: positive counters drop by one; entries at
/// zero are removed so `cooldown_remaining` stays the single source.
pub fn tick_cooldowns(entity: &mut Entity) {
    let expired: Vec<AbilityId> = entity
        .ability_cooldowns
        .iter()
        .filter(|&(_, &remaining)| remaining <= 1)
        .map(|(&id, _)| id)
        .collect();
    for id in expired {
        entity.ability_cooldowns.remove(&id);
    }
    for remaining in entity.ability_cooldowns.values_mut() {
        *remaining -= 1;
    }
}
