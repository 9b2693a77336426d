//! Entity representation: players, npcs, and inert objects.
//!
//! Entities are never removed once spawned. Death is the `dead` condition,
//! not deletion, so dead entities stay addressable in the three kind lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::Position;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub kind: EntityKind,
    pub name: String,
    pub position: Position,
    pub size: u32,
    pub stats: Stats,
    pub conditions: Vec<ConditionKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub condition_durations: BTreeMap<ConditionKind, u32>,
    pub abilities: Vec<AbilityId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ability_cooldowns: BTreeMap<AbilityId, u32>,
    pub inventory: Vec<String>,
    pub token: String,
    pub controller: Controller,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Player,
    Npc,
    Object,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub hp_current: i64,
    pub hp_max: i64,
    pub ac: i64,
    pub movement_speed: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_bonus: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_dice: Option<DamageDice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_range: Option<u32>,
}

/// Damage dice as `[count, sides]`, e.g. `[2, 6]` for 2d6.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDice(pub u32, pub u32);

impl DamageDice {
    pub fn count(self) -> u32 {
        self.0
    }

    pub fn sides(self) -> u32 {
        self.1
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Controller {
    #[serde(rename = "type")]
    pub kind: ControllerKind,
    pub player_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerKind {
    Human,
    Ai,
}

/// Closed set of condition names. Unknown names in incoming JSON fail at
/// the boundary parser, which the dispatcher surfaces as a schema failure.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConditionKind {
    Dead,
    Stunned,
    Poisoned,
    Prone,
    Blessed,
    Burning,
    Dodging,
}

/// Closed set of ability identifiers resolved against the fixed catalogue.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AbilityId {
    Fireball,
    PowerAttack,
    PoisonStrike,
    HealingWord,
    SecondWind,
}

impl Stats {
    /// Attack bonus, defaulting to 0 when the stat block omits it.
    pub fn attack_bonus(&self) -> i64 {
        self.attack_bonus.unwrap_or(0)
    }

    /// Attack range in cells, defaulting to melee reach.
    pub fn attack_range(&self) -> u32 {
        self.attack_range.unwrap_or(1)
    }
}

impl Entity {
    pub fn is_dead(&self) -> bool {
        self.conditions.contains(&ConditionKind::Dead)
    }

    pub fn has_condition(&self, kind: ConditionKind) -> bool {
        self.conditions.contains(&kind)
    }

    pub fn knows_ability(&self, ability: AbilityId) -> bool {
        self.abilities.contains(&ability)
    }

    /// Remaining cooldown rounds for an ability; 0 when ready.
    pub fn cooldown_remaining(&self, ability: AbilityId) -> u32 {
        self.ability_cooldowns.get(&ability).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_stats_have_defaults() {
        let stats = Stats {
            hp_current: 10,
            hp_max: 10,
            ac: 12,
            movement_speed: 6,
            attack_bonus: None,
            damage_dice: None,
            attack_range: None,
        };
        assert_eq!(stats.attack_bonus(), 0);
        assert_eq!(stats.attack_range(), 1);
    }

    #[test]
    fn condition_names_serialize_lowercase() {
        let json = serde_json::to_string(&ConditionKind::Dodging).unwrap();
        assert_eq!(json, "\"dodging\"");
        assert!(serde_json::from_str::<ConditionKind>("\"petrified\"").is_err());
    }

    #[test]
    fn damage_dice_round_trip_as_pair() {
        let dice: DamageDice = serde_json::from_str("[2,6]").unwrap();
        assert_eq!(dice.count(), 2);
        assert_eq!(dice.sides(), 6);
        assert_eq!(serde_json::to_string(&dice).unwrap(), "[2,6]");
    }
}
