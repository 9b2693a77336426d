//! The declared-action wire format and its boundary parser.
//!
//! `DeclaredAction` is the one shape every caller emits: player clients,
//! the NPC planner, proposal translators, and the replay runner. Anything
//! that does not parse into the closed set is rejected with
//! `INVALID_ACTION` before it reaches a handler.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorCode};
use crate::state::{AbilityId, Position};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclaredAction {
    #[serde(rename_all = "camelCase")]
    Move {
        entity_id: String,
        path: Vec<Position>,
    },
    #[serde(rename_all = "camelCase")]
    Attack {
        attacker_id: String,
        target_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Defend { entity_id: String },
    #[serde(rename_all = "camelCase")]
    UseAbility {
        caster_id: String,
        ability_id: AbilityId,
        target_id: String,
    },
    #[serde(rename_all = "camelCase")]
    EndTurn { entity_id: String },
    RollInitiative,
    #[serde(rename_all = "camelCase")]
    SetSeed { seed: String },
}

impl DeclaredAction {
    /// Parses an untyped JSON action. Unknown `type` values, missing
    /// fields, and unknown ability ids all collapse to `INVALID_ACTION`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, EngineError> {
        serde_json::from_value(value.clone())
            .map_err(|err| EngineError::new(ErrorCode::InvalidAction, err.to_string()))
    }

    /// The entity this action acts as, if it is entity-bound.
    pub fn actor_id(&self) -> Option<&str> {
        match self {
            DeclaredAction::Move { entity_id, .. }
            | DeclaredAction::Defend { entity_id }
            | DeclaredAction::EndTurn { entity_id } => Some(entity_id),
            DeclaredAction::Attack { attacker_id, .. } => Some(attacker_id),
            DeclaredAction::UseAbility { caster_id, .. } => Some(caster_id),
            DeclaredAction::RollInitiative | DeclaredAction::SetSeed { .. } => None,
        }
    }

    /// True for the four per-turn entity actions subject to turn order
    /// and budget checks. END_TURN polices its own ordering.
    pub fn is_turn_bound(&self) -> bool {
        matches!(
            self,
            DeclaredAction::Move { .. }
                | DeclaredAction::Attack { .. }
                | DeclaredAction::Defend { .. }
                | DeclaredAction::UseAbility { .. }
        )
    }

    /// Validates field shapes the type system cannot express.
    pub fn validate_shape(&self) -> Vec<EngineError> {
        let mut errors = Vec::new();
        let mut require = |name: &str, value: &str| {
            if value.is_empty() {
                errors.push(EngineError::new(
                    ErrorCode::InvalidAction,
                    format!("{name} must be a non-empty string"),
                ));
            }
        };
        match self {
            DeclaredAction::Move { entity_id, .. } => require("entityId", entity_id),
            DeclaredAction::Attack {
                attacker_id,
                target_id,
            } => {
                require("attackerId", attacker_id);
                require("targetId", target_id);
            }
            DeclaredAction::Defend { entity_id } | DeclaredAction::EndTurn { entity_id } => {
                require("entityId", entity_id)
            }
            DeclaredAction::UseAbility {
                caster_id,
                target_id,
                ..
            } => {
                require("casterId", caster_id);
                require("targetId", target_id);
            }
            DeclaredAction::RollInitiative => {}
            DeclaredAction::SetSeed { seed } => require("seed", seed),
        }
        errors
    }

    /// Compact identifying summary for rejection payloads: the type plus
    /// ids, never bulky payload like paths.
    pub fn summary(&self) -> ActionSummary {
        let mut summary = ActionSummary::of_type(match self {
            DeclaredAction::Move { .. } => "MOVE",
            DeclaredAction::Attack { .. } => "ATTACK",
            DeclaredAction::Defend { .. } => "DEFEND",
            DeclaredAction::UseAbility { .. } => "USE_ABILITY",
            DeclaredAction::EndTurn { .. } => "END_TURN",
            DeclaredAction::RollInitiative => "ROLL_INITIATIVE",
            DeclaredAction::SetSeed { .. } => "SET_SEED",
        });
        match self {
            DeclaredAction::Move { entity_id, .. }
            | DeclaredAction::Defend { entity_id }
            | DeclaredAction::EndTurn { entity_id } => {
                summary.entity_id = Some(entity_id.clone());
            }
            DeclaredAction::Attack {
                attacker_id,
                target_id,
            } => {
                summary.attacker_id = Some(attacker_id.clone());
                summary.target_id = Some(target_id.clone());
            }
            DeclaredAction::UseAbility {
                caster_id,
                target_id,
                ability_id,
            } => {
                summary.caster_id = Some(caster_id.clone());
                summary.target_id = Some(target_id.clone());
                summary.ability_id = Some(ability_id.to_string());
            }
            DeclaredAction::RollInitiative | DeclaredAction::SetSeed { .. } => {}
        }
        summary
    }
}

/// Identifying fragment of an action embedded in `ACTION_REJECTED`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionSummary {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attacker_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability_id: Option<String>,
}

impl ActionSummary {
    pub fn of_type(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Best-effort summary for an action that failed to parse: lifts the
    /// raw `type` and any id-shaped fields straight off the JSON value.
    pub fn from_raw(value: &serde_json::Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            kind: field("type").unwrap_or_else(|| "UNKNOWN".into()),
            entity_id: field("entityId"),
            attacker_id: field("attackerId"),
            caster_id: field("casterId"),
            target_id: field("targetId"),
            ability_id: field("abilityId"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn move_action_parses_from_wire_shape() {
        let value = json!({
            "type": "MOVE",
            "entityId": "pc-01",
            "path": [{"x": 1, "y": 0}, {"x": 1, "y": 1}],
        });
        let action = DeclaredAction::from_value(&value).unwrap();
        assert_eq!(
            action,
            DeclaredAction::Move {
                entity_id: "pc-01".into(),
                path: vec![Position::new(1, 0), Position::new(1, 1)],
            }
        );
        assert_eq!(action.actor_id(), Some("pc-01"));
    }

    #[test]
    fn unknown_type_maps_to_invalid_action() {
        let value = json!({"type": "TELEPORT", "entityId": "pc-01"});
        let err = DeclaredAction::from_value(&value).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAction);
    }

    #[test]
    fn unknown_ability_id_maps_to_invalid_action() {
        let value = json!({
            "type": "USE_ABILITY",
            "casterId": "pc-01",
            "abilityId": "meteor_swarm",
            "targetId": "npc-01",
        });
        assert!(DeclaredAction::from_value(&value).is_err());
    }

    #[test]
    fn empty_seed_fails_shape_validation() {
        let action = DeclaredAction::SetSeed { seed: String::new() };
        let errors = action.validate_shape();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::InvalidAction);
    }

    #[test]
    fn summary_carries_ids_but_not_path() {
        let action = DeclaredAction::Move {
            entity_id: "pc-01".into(),
            path: vec![Position::new(1, 0)],
        };
        let summary = serde_json::to_value(action.summary()).unwrap();
        assert_eq!(summary["type"], "MOVE");
        assert_eq!(summary["entityId"], "pc-01");
        assert!(summary.get("path").is_none());
    }

    #[test]
    fn raw_summary_survives_parse_failure() {
        let value = json!({"type": "TELEPORT", "entityId": "pc-01"});
        let summary = ActionSummary::from_raw(&value);
        assert_eq!(summary.kind, "TELEPORT");
        assert_eq!(summary.entity_id.as_deref(), Some("pc-01"));
    }
}
