//! Canonical state hashing.
//!
//! The state is serialized to JSON with recursively sorted object keys
//! (serde_json's default object representation is ordered), the cosmetic
//! `ui` block is stripped, and the result is committed with SHA-256,
//! rendered as 64 lowercase hex characters. The same state always hashes
//! the same on every platform.

use sha2::{Digest, Sha256};

use crate::state::GameState;

pub fn state_hash(state: &GameState) -> String {
    let mut value =
        serde_json::to_value(state).expect("GameState serialization should not fail");
    if let Some(object) = value.as_object_mut() {
        object.remove("ui");
    }
    let canonical = value.to_string();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}
