//! Authoritative room service: screens submissions, serializes dispatch,
//! and fans events out per client.
//!
//! [`RoomService`] is the synchronous core — one room, one state, one
//! queue consumer. [`RoomWorker`] wraps it in a tokio task behind a
//! command channel so at most one dispatch per room is ever in flight.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use skirmish_engine::{
    apply_action, plan_multi, state_hash, DeclaredAction, Difficulty, EngineEvent, EventBody,
    GameState, ReplayBundle, ReplayMeta, ReplayStep,
};

use crate::error::SessionError;
use crate::fog::{self, VisionProvider};
use crate::permissions::{self, AdminAction};
use crate::queue::ActionQueue;
use crate::room::{Role, Room};
use crate::wire::{Envelope, ServerMessage};

/// Default staleness window: how many room events a submission may lag.
pub const DEFAULT_STALE_TOLERANCE: u64 = 5;

/// One batch of outbound envelopes, all stamped with the same room seq.
#[derive(Debug)]
pub struct Fanout {
    pub seq: u64,
    pub messages: Vec<(String, Envelope)>,
}

/// GM-only room operations.
#[derive(Debug)]
pub enum AdminOp {
    LoadScenario(Box<GameState>),
    ResetGame,
    SetDifficulty(Difficulty),
    KickPlayer(String),
}

impl AdminOp {
    fn permission(&self) -> AdminAction {
        match self {
            AdminOp::LoadScenario(_) => AdminAction::LoadScenario,
            AdminOp::ResetGame => AdminAction::ResetGame,
            AdminOp::SetDifficulty(_) => AdminAction::SetDifficulty,
            AdminOp::KickPlayer(_) => AdminAction::KickPlayer,
        }
    }
}

pub struct RoomService {
    room: Room,
    state: GameState,
    initial_state: GameState,
    queue: ActionQueue,
    vision: Option<Box<dyn VisionProvider>>,
    difficulty: Difficulty,
    record_replay: bool,
    recorded_steps: Vec<ReplayStep>,
}

impl RoomService {
    pub fn new(room: Room, state: GameState) -> Self {
        Self {
            room,
            initial_state: state.clone(),
            state,
            queue: ActionQueue::new(DEFAULT_STALE_TOLERANCE),
            vision: None,
            difficulty: Difficulty::Normal,
            record_replay: false,
            recorded_steps: Vec::new(),
        }
    }

    /// Injects the vision callback used for fog filtering and redaction.
    pub fn with_vision(mut self, vision: Box<dyn VisionProvider>) -> Self {
        self.vision = Some(vision);
        self
    }

    pub fn with_stale_tolerance(mut self, tolerance: u64) -> Self {
        self.queue = ActionQueue::new(tolerance);
        self
    }

    /// Records every processed action into an exportable replay bundle.
    pub fn with_replay_recording(mut self) -> Self {
        self.record_replay = true;
        self
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn room_mut(&mut self) -> &mut Room {
        &mut self.room
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Admits a client, binding it to an entity when requested. Returns
    /// the welcome envelope plus join notices for the other clients.
    pub fn join(
        &mut self,
        client_id: &str,
        display_name: &str,
        role: Role,
        entity_id: Option<&str>,
    ) -> Result<(Envelope, Vec<(String, Envelope)>), SessionError> {
        self.room.join(client_id, display_name, role)?;
        if let Some(entity_id) = entity_id {
            // A failed binding rolls the whole join back.
            if let Err(err) = self.room.bind_entity(client_id, entity_id) {
                self.room.remove_client(client_id);
                return Err(err);
            }
        }

        let seq = self.room.event_seq();
        let welcome = Envelope::new(
            ServerMessage::ServerWelcome {
                client_id: client_id.to_string(),
                room_id: self.room.id.clone(),
                role,
                event_seq: seq,
            },
            seq,
        );
        let notices = self
            .room
            .clients()
            .filter(|c| c.client_id != client_id)
            .map(|c| {
                (
                    c.client_id.clone(),
                    Envelope::new(
                        ServerMessage::ServerPlayerJoined {
                            client_id: client_id.to_string(),
                            display_name: display_name.to_string(),
                            role,
                        },
                        seq,
                    ),
                )
            })
            .collect();
        Ok((welcome, notices))
    }

    /// Removes a client and tells the rest of the room.
    pub fn leave(&mut self, client_id: &str) -> Vec<(String, Envelope)> {
        if self.room.remove_client(client_id).is_none() {
            return Vec::new();
        }
        let seq = self.room.event_seq();
        self.room
            .clients()
            .map(|c| {
                (
                    c.client_id.clone(),
                    Envelope::new(
                        ServerMessage::ServerPlayerLeft {
                            client_id: client_id.to_string(),
                        },
                        seq,
                    ),
                )
            })
            .collect()
    }

    /// Refreshes the client's liveness stamp and answers with a pong.
    pub fn ping(&mut self, client_id: &str) -> Result<Envelope, SessionError> {
        self.room.touch_ping(client_id)?;
        Ok(Envelope::new(
            ServerMessage::ServerPong {},
            self.room.event_seq(),
        ))
    }

    /// Screens a submission (permissions, turn authority, staleness) and
    /// enqueues it. Returns the queue seq on success.
    pub fn submit(
        &mut self,
        client_id: &str,
        action_value: &Value,
        client_event_seq: u64,
    ) -> Result<u64, SessionError> {
        let client = self
            .room
            .client(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.to_string()))?
            .clone();
        let action = DeclaredAction::from_value(action_value)
            .map_err(|e| SessionError::MalformedAction(e.to_string()))?;

        permissions::can_submit(&client, &action)?;
        permissions::check_turn_authority(&client, &action, &self.state)?;
        self.queue
            .check_staleness(self.room.event_seq(), client_event_seq)?;

        Ok(self.queue.enqueue(client_id, action, client_event_seq))
    }

    /// Drains one pending action through the dispatcher and builds the
    /// per-client fan-out. `None` when the queue is empty.
    pub fn process_next(&mut self) -> Option<Fanout> {
        let entry = self.queue.begin_next()?;
        let outcome = apply_action(&self.state, &entry.action);
        self.queue.finish(entry.seq, outcome.success);

        if self.record_replay {
            let mut action_value = serde_json::to_value(&entry.action)
                .expect("DeclaredAction serialization should not fail");
            if !outcome.success {
                if let Some(object) = action_value.as_object_mut() {
                    object.insert("_expectReject".into(), Value::Bool(true));
                }
            }
            self.recorded_steps.push(ReplayStep {
                action: action_value,
                expected_events: None,
                expected_state_hash: Some(state_hash(&outcome.next_state)),
            });
        }

        let previous_round = self.state.combat.round;
        let events = outcome.events;
        self.state = outcome.next_state;

        if events.is_empty() {
            // State-level failure: nothing to broadcast, tell the
            // submitter alone.
            let envelope = Envelope::new(
                ServerMessage::ServerReject {
                    reasons: outcome.errors,
                },
                self.room.event_seq(),
            );
            return Some(Fanout {
                seq: self.room.event_seq(),
                messages: vec![(entry.client_id, envelope)],
            });
        }

        let seq = self.room.next_event_seq();
        let mut messages = Vec::new();
        for client in self.room.clients() {
            let client_events = self.events_for_client(client.role, client.entity_id.as_deref(), &events);
            messages.push((
                client.client_id.clone(),
                Envelope::new(
                    ServerMessage::ServerEventsBatch {
                        events: client_events,
                    },
                    seq,
                ),
            ));
        }
        self.push_notifications(&events, previous_round, seq, &mut messages);

        tracing::debug!(room = %self.room.id, seq, events = events.len(), "batch fanned out");
        Some(Fanout { seq, messages })
    }

    /// A full state snapshot for one client, fog-redacted when needed.
    pub fn state_sync(&self, client_id: &str) -> Result<Envelope, SessionError> {
        let client = self
            .room
            .client(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.to_string()))?;
        let state = match self.visible_cells(client.role, client.entity_id.as_deref()) {
            Some(visible) => fog::redact_state(&self.state, &visible),
            None => serde_json::to_value(&self.state)
                .expect("GameState serialization should not fail"),
        };
        Ok(Envelope::new(
            ServerMessage::ServerStateSync { state },
            self.room.event_seq(),
        ))
    }

    /// Executes a GM-only room operation.
    pub fn admin(&mut self, client_id: &str, op: AdminOp) -> Result<(), SessionError> {
        let client = self
            .room
            .client(client_id)
            .ok_or_else(|| SessionError::UnknownClient(client_id.to_string()))?;
        permissions::can_admin(client, op.permission())?;

        match op {
            AdminOp::LoadScenario(state) => {
                self.initial_state = (*state).clone();
                self.state = *state;
                self.recorded_steps.clear();
            }
            AdminOp::ResetGame => {
                self.state = self.initial_state.clone();
                self.recorded_steps.clear();
            }
            AdminOp::SetDifficulty(difficulty) => {
                self.difficulty = difficulty;
            }
            AdminOp::KickPlayer(target) => {
                self.room.remove_client(&target);
            }
        }
        Ok(())
    }

    /// Plans an npc turn against the current state and difficulty.
    pub fn plan_npc(&self, npc_id: &str) -> Vec<DeclaredAction> {
        plan_multi(&self.state, npc_id, self.difficulty)
    }

    /// Exports the recorded session as a verification bundle.
    pub fn export_replay(&self, id: &str) -> ReplayBundle {
        ReplayBundle {
            meta: ReplayMeta {
                id: id.to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                schema_version: self.initial_state.schema_version.clone(),
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                notes: None,
            },
            initial_state: self.initial_state.clone(),
            steps: self.recorded_steps.clone(),
            final_check: Some(skirmish_engine::FinalCheck {
                expected_state_hash: Some(state_hash(&self.state)),
            }),
        }
    }

    /// Visible-cell set for a fogged client; `None` means unfiltered.
    fn visible_cells(
        &self,
        role: Role,
        entity_id: Option<&str>,
    ) -> Option<std::collections::BTreeSet<skirmish_engine::Position>> {
        if !self.room.per_player_fog || !self.state.map.fog_of_war_enabled {
            return None;
        }
        if role != Role::Player {
            return None;
        }
        let viewer = self.state.entity(entity_id?)?;
        let vision = self.vision.as_ref()?;
        Some(vision.visible_cells(&self.state, viewer))
    }

    fn events_for_client(
        &self,
        role: Role,
        entity_id: Option<&str>,
        events: &[EngineEvent],
    ) -> Vec<EngineEvent> {
        match self.visible_cells(role, entity_id) {
            Some(visible) => fog::filter_events(&self.state, events, &visible),
            None => events.to_vec(),
        }
    }

    /// Derives turn/round/combat notifications from an event batch.
    fn push_notifications(
        &self,
        events: &[EngineEvent],
        previous_round: u32,
        seq: u64,
        messages: &mut Vec<(String, Envelope)>,
    ) {
        for event in events {
            match &event.body {
                EventBody::TurnEnded {
                    next_entity_id,
                    round,
                    ..
                } => {
                    for client in self.room.clients() {
                        messages.push((
                            client.client_id.clone(),
                            Envelope::new(
                                ServerMessage::ServerTurnNotification {
                                    active_entity_id: next_entity_id.clone(),
                                },
                                seq,
                            ),
                        ));
                        if client.entity_id.as_deref() == Some(next_entity_id) {
                            messages.push((
                                client.client_id.clone(),
                                Envelope::new(
                                    ServerMessage::ServerYourTurn {
                                        entity_id: next_entity_id.clone(),
                                    },
                                    seq,
                                ),
                            ));
                        }
                    }
                    if *round > previous_round {
                        for client in self.room.clients() {
                            messages.push((
                                client.client_id.clone(),
                                Envelope::new(
                                    ServerMessage::ServerRoundStart { round: *round },
                                    seq,
                                ),
                            ));
                        }
                    }
                }
                EventBody::CombatEnded { winner, .. } => {
                    for client in self.room.clients() {
                        messages.push((
                            client.client_id.clone(),
                            Envelope::new(ServerMessage::ServerCombatEnd { winner: *winner }, seq),
                        ));
                    }
                }
                _ => {}
            }
        }
    }
}

/// Commands accepted by the room worker task.
pub enum RoomCommand {
    Submit {
        client_id: String,
        action: Value,
        client_event_seq: u64,
        reply: oneshot::Sender<Result<u64, SessionError>>,
    },
    Admin {
        client_id: String,
        op: AdminOp,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Shutdown,
}

/// Tokio task owning a [`RoomService`]. Commands are processed one at a
/// time and the queue is drained after each submission, so dispatch is
/// fully serialized per room.
pub struct RoomWorker {
    commands: mpsc::Sender<RoomCommand>,
    handle: JoinHandle<RoomService>,
}

impl RoomWorker {
    pub fn spawn(service: RoomService, buffer: usize) -> (Self, mpsc::UnboundedReceiver<Fanout>) {
        let (command_tx, mut command_rx) = mpsc::channel(buffer);
        let (fanout_tx, fanout_rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            let mut service = service;
            while let Some(command) = command_rx.recv().await {
                match command {
                    RoomCommand::Submit {
                        client_id,
                        action,
                        client_event_seq,
                        reply,
                    } => {
                        let result = service.submit(&client_id, &action, client_event_seq);
                        let _ = reply.send(result);
                        while let Some(fanout) = service.process_next() {
                            if fanout_tx.send(fanout).is_err() {
                                break;
                            }
                        }
                    }
                    RoomCommand::Admin {
                        client_id,
                        op,
                        reply,
                    } => {
                        let _ = reply.send(service.admin(&client_id, op));
                    }
                    RoomCommand::Shutdown => break,
                }
            }
            service
        });

        (
            Self {
                commands: command_tx,
                handle,
            },
            fanout_rx,
        )
    }

    pub async fn submit(
        &self,
        client_id: &str,
        action: Value,
        client_event_seq: u64,
    ) -> Result<u64, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(RoomCommand::Submit {
                client_id: client_id.to_string(),
                action,
                client_event_seq,
                reply,
            })
            .await
            .map_err(|_| SessionError::WorkerUnavailable)?;
        response.await.map_err(|_| SessionError::WorkerUnavailable)?
    }

    pub async fn admin(&self, client_id: &str, op: AdminOp) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(RoomCommand::Admin {
                client_id: client_id.to_string(),
                op,
                reply,
            })
            .await
            .map_err(|_| SessionError::WorkerUnavailable)?;
        response.await.map_err(|_| SessionError::WorkerUnavailable)?
    }

    /// Stops the worker and returns the service for inspection or
    /// persistence.
    pub async fn shutdown(self) -> Result<RoomService, SessionError> {
        let _ = self.commands.send(RoomCommand::Shutdown).await;
        self.handle
            .await
            .map_err(|_| SessionError::WorkerUnavailable)
    }
}
