//! Engine events: the append-only record of everything a dispatch did.
//!
//! Events carry a monotonic `evt-NNNN` id, the state's timestamp, and a
//! typed payload. The variant set is closed; unknown event types in
//! incoming state JSON fail at the boundary parser.

use serde::{Deserialize, Serialize};

use super::common::Position;
use super::entity::{AbilityId, ConditionKind};
use crate::action::ActionSummary;
use crate::state::RngMode;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub body: EventBody,
}

/// Typed event payloads, tagged on the wire as `{ "type": …, "payload": … }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventBody {
    #[serde(rename_all = "camelCase")]
    MoveApplied {
        entity_id: String,
        path: Vec<Position>,
        final_position: Position,
        original_position: Position,
    },
    #[serde(rename_all = "camelCase")]
    AttackResolved {
        attacker_id: String,
        target_id: String,
        attack_roll: i64,
        target_ac: i64,
        hit: bool,
        damage: u32,
        target_hp_after: i64,
    },
    #[serde(rename_all = "camelCase")]
    InitiativeRolled { order: Vec<InitiativeEntry> },
    #[serde(rename_all = "camelCase")]
    TurnEnded {
        entity_id: String,
        next_entity_id: String,
        round: u32,
    },
    #[serde(rename_all = "camelCase")]
    CombatEnded {
        winner: CombatWinner,
        final_round: u32,
        living_players: Vec<String>,
        living_npcs: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    ActionRejected {
        action: ActionSummary,
        reasons: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    RngSeedSet {
        previous_seed: Option<String>,
        previous_mode: RngMode,
        next_seed: String,
        mode: RngMode,
    },
    #[serde(rename_all = "camelCase")]
    DefendApplied {
        entity_id: String,
        ac_bonus: i64,
        duration: u32,
        effective_ac: i64,
        hp_healed: i64,
        hp_after: i64,
    },
    #[serde(rename_all = "camelCase")]
    AbilityUsed {
        caster_id: String,
        ability_id: AbilityId,
        target_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        attack_roll: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_ac: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        hit: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        damage: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        healing: Option<i64>,
        target_hp_after: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        condition_applied: Option<ConditionKind>,
    },
    #[serde(rename_all = "camelCase")]
    ConditionDamage {
        entity_id: String,
        condition: ConditionKind,
        damage: u32,
        hp_after: i64,
    },
    #[serde(rename_all = "camelCase")]
    ConditionExpired {
        entity_id: String,
        condition: ConditionKind,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiativeEntry {
    pub entity_id: String,
    pub roll: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatWinner {
    Players,
    Npcs,
    None,
}

/// Event kind without payload, used for replay expectations and fog
/// filtering.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    MoveApplied,
    AttackResolved,
    InitiativeRolled,
    TurnEnded,
    CombatEnded,
    ActionRejected,
    RngSeedSet,
    DefendApplied,
    AbilityUsed,
    ConditionDamage,
    ConditionExpired,
}

impl EventBody {
    /// Entity ids this event is about. Rejection summaries are excluded:
    /// they may legitimately name ids that never existed.
    pub fn subject_ids(&self) -> Vec<&str> {
        match self {
            EventBody::MoveApplied { entity_id, .. } => vec![entity_id],
            EventBody::AttackResolved {
                attacker_id,
                target_id,
                ..
            } => vec![attacker_id, target_id],
            EventBody::InitiativeRolled { order } => {
                order.iter().map(|e| e.entity_id.as_str()).collect()
            }
            EventBody::TurnEnded {
                entity_id,
                next_entity_id,
                ..
            } => vec![entity_id, next_entity_id],
            EventBody::CombatEnded {
                living_players,
                living_npcs,
                ..
            } => living_players
                .iter()
                .chain(living_npcs.iter())
                .map(String::as_str)
                .collect(),
            EventBody::ActionRejected { .. } => Vec::new(),
            EventBody::RngSeedSet { .. } => Vec::new(),
            EventBody::DefendApplied { entity_id, .. } => vec![entity_id],
            EventBody::AbilityUsed {
                caster_id,
                target_id,
                ..
            } => vec![caster_id, target_id],
            EventBody::ConditionDamage { entity_id, .. } => vec![entity_id],
            EventBody::ConditionExpired { entity_id, .. } => vec![entity_id],
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            EventBody::MoveApplied { .. } => EventType::MoveApplied,
            EventBody::AttackResolved { .. } => EventType::AttackResolved,
            EventBody::InitiativeRolled { .. } => EventType::InitiativeRolled,
            EventBody::TurnEnded { .. } => EventType::TurnEnded,
            EventBody::CombatEnded { .. } => EventType::CombatEnded,
            EventBody::ActionRejected { .. } => EventType::ActionRejected,
            EventBody::RngSeedSet { .. } => EventType::RngSeedSet,
            EventBody::DefendApplied { .. } => EventType::DefendApplied,
            EventBody::AbilityUsed { .. } => EventType::AbilityUsed,
            EventBody::ConditionDamage { .. } => EventType::ConditionDamage,
            EventBody::ConditionExpired { .. } => EventType::ConditionExpired,
        }
    }
}

impl EngineEvent {
    pub fn event_type(&self) -> EventType {
        self.body.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_and_payload() {
        let event = EngineEvent {
            id: "evt-0001".into(),
            timestamp: "t0".into(),
            body: EventBody::TurnEnded {
                entity_id: "pc-01".into(),
                next_entity_id: "npc-01".into(),
                round: 2,
            },
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "TURN_ENDED");
        assert_eq!(value["payload"]["nextEntityId"], "npc-01");
        assert_eq!(value["id"], "evt-0001");
    }

    #[test]
    fn unknown_event_type_is_rejected() {
        let raw = r#"{"id":"evt-0001","timestamp":"t0","type":"TELEPORTED","payload":{}}"#;
        assert!(serde_json::from_str::<EngineEvent>(raw).is_err());
    }
}
