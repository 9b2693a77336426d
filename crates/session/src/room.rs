//! Room state: connected clients, roles, entity bindings, and the
//! monotonic event sequence every broadcast is stamped with.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Gm,
    Player,
    Spectator,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub client_id: String,
    pub display_name: String,
    pub role: Role,
    /// Entity this client controls; required for players to act.
    pub entity_id: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_ping: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Room {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub max_players: usize,
    pub per_player_fog: bool,
    clients: BTreeMap<String, ClientInfo>,
    event_seq: u64,
}

impl Room {
    pub fn new(id: String, max_players: usize, per_player_fog: bool) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            max_players,
            per_player_fog,
            clients: BTreeMap::new(),
            event_seq: 0,
        }
    }

    /// Admits a client. Player slots are bounded by `max_players`; GMs
    /// and spectators are not counted against the cap.
    pub fn join(
        &mut self,
        client_id: &str,
        display_name: &str,
        role: Role,
    ) -> Result<&ClientInfo, SessionError> {
        if role == Role::Player {
            let players = self
                .clients
                .values()
                .filter(|c| c.role == Role::Player)
                .count();
            if players >= self.max_players {
                return Err(SessionError::RoomFull {
                    max: self.max_players,
                });
            }
        }
        let now = Utc::now();
        let info = ClientInfo {
            client_id: client_id.to_string(),
            display_name: display_name.to_string(),
            role,
            entity_id: None,
            joined_at: now,
            last_ping: now,
        };
        tracing::info!(room = %self.id, client = client_id, ?role, "client joined");
        Ok(self.clients.entry(client_id.to_string()).or_insert(info))
    }

    /// Binds a client to the entity it controls. Ownership is unique per
    /// room.
    pub fn bind_entity(&mut self, client_id: &str, entity_id: &str) -> Result<(), SessionError> {
        if let Some(owner) = self
            .clients
            .values()
            .find(|c| c.entity_id.as_deref() == Some(entity_id))
        {
            if owner.client_id != client_id {
                return Err(SessionError::EntityTaken {
                    entity_id: entity_id.to_string(),
                    owner: owner.client_id.clone(),
                });
            }
        }
        let client = self
            .clients
            .get_mut(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.to_string()))?;
        client.entity_id = Some(entity_id.to_string());
        Ok(())
    }

    pub fn remove_client(&mut self, client_id: &str) -> Option<ClientInfo> {
        let removed = self.clients.remove(client_id);
        if removed.is_some() {
            tracing::info!(room = %self.id, client = client_id, "client left");
        }
        removed
    }

    pub fn touch_ping(&mut self, client_id: &str) -> Result<(), SessionError> {
        let client = self
            .clients
            .get_mut(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.to_string()))?;
        client.last_ping = Utc::now();
        Ok(())
    }

    pub fn client(&self, client_id: &str) -> Option<&ClientInfo> {
        self.clients.get(client_id)
    }

    pub fn clients(&self) -> impl Iterator<Item = &ClientInfo> {
        self.clients.values()
    }

    pub fn event_seq(&self) -> u64 {
        self.event_seq
    }

    /// Advances the sequence exactly once per non-empty event batch and
    /// returns the stamp for that batch's envelopes.
    pub fn next_event_seq(&mut self) -> u64 {
        self.event_seq += 1;
        self.event_seq
    }
}
