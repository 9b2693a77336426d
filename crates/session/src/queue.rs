//! FIFO action queue with staleness screening.
//!
//! One consumer drains the queue: at most one dispatch per room is in
//! flight, so effects never interleave. Entries keep their terminal
//! status for inspection after resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skirmish_engine::DeclaredAction;

use crate::error::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Processing,
    Resolved,
    Rejected,
}

#[derive(Clone, Debug)]
pub struct QueuedAction {
    pub seq: u64,
    pub client_id: String,
    pub action: DeclaredAction,
    /// The room event seq the client had seen when it submitted.
    pub client_event_seq: u64,
    pub enqueued_at: DateTime<Utc>,
    pub status: QueueStatus,
}

#[derive(Debug)]
pub struct ActionQueue {
    entries: Vec<QueuedAction>,
    next_seq: u64,
    stale_tolerance: u64,
}

impl ActionQueue {
    pub fn new(stale_tolerance: u64) -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
            stale_tolerance,
        }
    }

    /// Rejects actions submitted against a view too far behind the
    /// room's event sequence.
    pub fn check_staleness(
        &self,
        room_event_seq: u64,
        client_event_seq: u64,
    ) -> Result<(), SessionError> {
        let behind = room_event_seq.saturating_sub(client_event_seq);
        if behind > self.stale_tolerance {
            return Err(SessionError::StaleAction {
                client_seq: client_event_seq,
                behind,
            });
        }
        Ok(())
    }

    pub fn enqueue(
        &mut self,
        client_id: &str,
        action: DeclaredAction,
        client_event_seq: u64,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(QueuedAction {
            seq,
            client_id: client_id.to_string(),
            action,
            client_event_seq,
            enqueued_at: Utc::now(),
            status: QueueStatus::Pending,
        });
        seq
    }

    /// Takes the oldest pending entry, marking it `processing`.
    pub fn begin_next(&mut self) -> Option<QueuedAction> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.status == QueueStatus::Pending)?;
        entry.status = QueueStatus::Processing;
        Some(entry.clone())
    }

    /// Records the dispatch outcome for a processed entry.
    pub fn finish(&mut self, seq: u64, success: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.seq == seq) {
            entry.status = if success {
                QueueStatus::Resolved
            } else {
                QueueStatus::Rejected
            };
        }
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == QueueStatus::Pending)
            .count()
    }

    pub fn entries(&self) -> impl Iterator<Item = &QueuedAction> {
        self.entries.iter()
    }
}
