//! Room registry: owns every room and the join-code index.
//!
//! The registry is mutable and thread-confined to its owner task;
//! external access goes through these operations.

use std::collections::BTreeMap;

use rand::Rng;

use crate::error::SessionError;
use crate::room::Room;

/// 32-symbol alphabet with the confusable 0/1/I/O removed.
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const CODE_LENGTH: usize = 6;

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: BTreeMap<String, Room>,
    codes: BTreeMap<String, String>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room and returns `(room_id, join_code)`.
    pub fn create_room(&mut self, max_players: usize, per_player_fog: bool) -> (String, String) {
        let code = loop {
            let candidate = generate_code();
            if !self.codes.contains_key(&candidate) {
                break candidate;
            }
        };
        let room_id = format!("room-{}", code.to_lowercase());
        self.rooms
            .insert(room_id.clone(), Room::new(room_id.clone(), max_players, per_player_fog));
        self.codes.insert(code.clone(), room_id.clone());
        tracing::info!(room = %room_id, code = %code, "room created");
        (room_id, code)
    }

    pub fn room(&self, room_id: &str) -> Result<&Room, SessionError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| SessionError::UnknownRoom(room_id.to_string()))
    }

    pub fn room_mut(&mut self, room_id: &str) -> Result<&mut Room, SessionError> {
        self.rooms
            .get_mut(room_id)
            .ok_or_else(|| SessionError::UnknownRoom(room_id.to_string()))
    }

    /// Resolves a join code (case-insensitive) to its room id.
    pub fn resolve_code(&self, code: &str) -> Result<&str, SessionError> {
        self.codes
            .get(&code.to_uppercase())
            .map(String::as_str)
            .ok_or_else(|| SessionError::UnknownCode(code.to_string()))
    }

    pub fn remove_room(&mut self, room_id: &str) -> Option<Room> {
        self.codes.retain(|_, id| id != room_id);
        self.rooms.remove(room_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}
