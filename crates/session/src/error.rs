//! Session-layer errors: screening failures surfaced to the submitting
//! client, never to the room at large.

use crate::room::Role;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("room {0} does not exist")]
    UnknownRoom(String),

    #[error("no room with join code {0}")]
    UnknownCode(String),

    #[error("client {0} is not in this room")]
    UnknownClient(String),

    #[error("room is full ({max} players)")]
    RoomFull { max: usize },

    #[error("entity {entity_id} is already controlled by {owner}")]
    EntityTaken { entity_id: String, owner: String },

    #[error("{role:?} may not submit {action}")]
    PermissionDenied { role: Role, action: String },

    #[error("not your turn: the active entity is {active}")]
    NotYourTurn { active: String },

    #[error("stale action: client seq {client_seq} is {behind} events behind")]
    StaleAction { client_seq: u64, behind: u64 },

    #[error("malformed action: {0}")]
    MalformedAction(String),

    #[error("room worker is no longer running")]
    WorkerUnavailable,
}
