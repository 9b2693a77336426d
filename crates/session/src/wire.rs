//! JSON wire messages exchanged with clients.
//!
//! Every message travels as `{ type, payload, seq, timestamp }`. The
//! message sets are closed; unknown types fail at the parser.

use serde::{Deserialize, Serialize};

use skirmish_engine::{CombatWinner, EngineEvent};

use crate::room::Role;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    ClientJoin {
        display_name: String,
        role: Role,
        room_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        entity_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    ClientAction {
        action: serde_json::Value,
        client_event_seq: u64,
    },
    ClientPing {},
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    ServerWelcome {
        client_id: String,
        room_id: String,
        role: Role,
        event_seq: u64,
    },
    #[serde(rename_all = "camelCase")]
    ServerStateSync {
        /// Full (possibly fog-redacted) state snapshot.
        state: serde_json::Value,
    },
    #[serde(rename_all = "camelCase")]
    ServerEvent { event: EngineEvent },
    #[serde(rename_all = "camelCase")]
    ServerEventsBatch { events: Vec<EngineEvent> },
    #[serde(rename_all = "camelCase")]
    ServerReject { reasons: Vec<String> },
    ServerPong {},
    #[serde(rename_all = "camelCase")]
    ServerPlayerJoined {
        client_id: String,
        display_name: String,
        role: Role,
    },
    #[serde(rename_all = "camelCase")]
    ServerPlayerLeft { client_id: String },
    #[serde(rename_all = "camelCase")]
    ServerTurnNotification { active_entity_id: String },
    #[serde(rename_all = "camelCase")]
    ServerYourTurn { entity_id: String },
    #[serde(rename_all = "camelCase")]
    ServerCombatEnd { winner: CombatWinner },
    #[serde(rename_all = "camelCase")]
    ServerRoundStart { round: u32 },
}

/// Transport envelope: the tagged message flattened alongside the room
/// sequence stamp and a wall-clock timestamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub message: ServerMessage,
    pub seq: u64,
    pub timestamp: String,
}

impl Envelope {
    pub fn new(message: ServerMessage, seq: u64) -> Self {
        Self {
            message,
            seq,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_type_payload_seq_timestamp() {
        let envelope = Envelope::new(
            ServerMessage::ServerRoundStart { round: 2 },
            7,
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["type"], "SERVER_ROUND_START");
        assert_eq!(value["payload"]["round"], 2);
        assert_eq!(value["seq"], 7);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn client_action_round_trips() {
        let raw = r#"{
            "type": "CLIENT_ACTION",
            "payload": {
                "action": {"type": "END_TURN", "entityId": "pc-01"},
                "clientEventSeq": 4
            }
        }"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        match message {
            ClientMessage::ClientAction {
                client_event_seq, ..
            } => assert_eq!(client_event_seq, 4),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_message_type_is_rejected() {
        let raw = r#"{"type": "CLIENT_TELEPORT", "payload": {}}"#;
        assert!(serde_json::from_str::<ClientMessage>(raw).is_err());
    }
}
