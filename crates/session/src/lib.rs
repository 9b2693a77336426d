//! Multi-client authoritative session layer for the skirmish engine.
//!
//! A [`room::Room`] holds connected clients and their roles; the
//! [`service::RoomService`] screens every submission (permissions, turn
//! authority, staleness), serializes dispatch through a single queue
//! consumer, and fans events out per client with optional fog-of-war
//! filtering.

pub mod error;
pub mod fog;
pub mod permissions;
pub mod queue;
pub mod registry;
pub mod room;
pub mod service;
pub mod wire;

pub use error::SessionError;
pub use fog::{filter_events, redact_state, VisionProvider};
pub use permissions::AdminAction;
pub use queue::{ActionQueue, QueueStatus, QueuedAction};
pub use registry::RoomRegistry;
pub use room::{ClientInfo, Role, Room};
pub use service::{AdminOp, Fanout, RoomCommand, RoomService, RoomWorker};
pub use wire::{ClientMessage, Envelope, ServerMessage};
