//! Room actor: an isolated Tokio task owning one room's session registry.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel — no shared mutable state, just message passing
//! (§4.4, §5's "one coordinator task per Hub" requirement, satisfied here
//! per-room so that fan-out for different rooms never contends).

use std::collections::HashMap;

use camelot_protocol::{GameId, RoomPlayerId, ServerEnvelope};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::HubConfig;

/// One session's outbound queue, as seen by the room actor.
type SessionSender = mpsc::Sender<ServerEnvelope>;

/// Roles keyed by room-player id, as strings (`"good"` / `"evil"`) so this
/// crate doesn't need to depend on `camelot-engine` for a single enum —
/// the caller converts `camelot_engine::Role` before building the command.
pub type RoleMap = HashMap<RoomPlayerId, String>;

enum RoomCommand {
    Register {
        room_player_id: RoomPlayerId,
        sender: SessionSender,
        reply: oneshot::Sender<()>,
    },
    Unregister {
        room_player_id: RoomPlayerId,
    },
    BroadcastEnvelope {
        envelope: ServerEnvelope,
    },
    BroadcastExcept {
        envelope: ServerEnvelope,
        exclude: RoomPlayerId,
    },
    /// A `state` envelope whose `state.roles` field gets masked per
    /// recipient before delivery (SPEC_FULL.md's role-visibility decision).
    BroadcastMaskedState {
        game_id: GameId,
        full_state: serde_json::Value,
        phase: String,
        version: i64,
        roles: RoleMap,
    },
    SessionCount {
        reply: oneshot::Sender<usize>,
    },
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: Uuid,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> Uuid {
        self.room_id
    }

    /// Registers a session's outbound sender under `room_player_id`. A
    /// second registration for the same id replaces the first, which
    /// closes the prior session's queue (receiver sees the channel drop).
    pub async fn register(&self, room_player_id: RoomPlayerId, sender: SessionSender) {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.sender.send(RoomCommand::Register { room_player_id, sender, reply: reply_tx }).await.is_ok() {
            let _ = reply_rx.await;
        }
    }

    pub async fn unregister(&self, room_player_id: RoomPlayerId) {
        let _ = self.sender.send(RoomCommand::Unregister { room_player_id }).await;
    }

    pub async fn broadcast_envelope(&self, envelope: ServerEnvelope) {
        let _ = self.sender.send(RoomCommand::BroadcastEnvelope { envelope }).await;
    }

    pub async fn broadcast_except(&self, envelope: ServerEnvelope, exclude: RoomPlayerId) {
        let _ = self.sender.send(RoomCommand::BroadcastExcept { envelope, exclude }).await;
    }

    pub async fn broadcast_masked_state(
        &self,
        game_id: GameId,
        full_state: serde_json::Value,
        phase: String,
        version: i64,
        roles: RoleMap,
    ) {
        let _ = self
            .sender
            .send(RoomCommand::BroadcastMaskedState { game_id, full_state, phase, version, roles })
            .await;
    }

    pub async fn session_count(&self) -> usize {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self.sender.send(RoomCommand::SessionCount { reply: reply_tx }).await.is_err() {
            return 0;
        }
        reply_rx.await.unwrap_or(0)
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

struct RoomActor {
    room_id: Uuid,
    sessions: HashMap<RoomPlayerId, SessionSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Register { room_player_id, sender, reply } => {
                    self.sessions.insert(room_player_id, sender);
                    tracing::info!(
                        room_id = %self.room_id,
                        room_player_id = %room_player_id,
                        sessions = self.sessions.len(),
                        "session registered"
                    );
                    let _ = reply.send(());
                }
                RoomCommand::Unregister { room_player_id } => {
                    self.sessions.remove(&room_player_id);
                    tracing::info!(
                        room_id = %self.room_id,
                        room_player_id = %room_player_id,
                        sessions = self.sessions.len(),
                        "session unregistered"
                    );
                }
                RoomCommand::BroadcastEnvelope { envelope } => {
                    self.fan_out(&envelope, None);
                }
                RoomCommand::BroadcastExcept { envelope, exclude } => {
                    self.fan_out(&envelope, Some(exclude));
                }
                RoomCommand::BroadcastMaskedState { game_id, full_state, phase, version, roles } => {
                    self.broadcast_masked_state(game_id, &full_state, &phase, version, &roles);
                }
                RoomCommand::SessionCount { reply } => {
                    let _ = reply.send(self.sessions.len());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room actor shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    /// Sends `envelope` to every registered session except `exclude`.
    /// A full queue means a slow consumer: the session is evicted from the
    /// room rather than allowed to block fan-out for everyone else (§4.4).
    fn fan_out(&mut self, envelope: &ServerEnvelope, exclude: Option<RoomPlayerId>) {
        let mut evicted = Vec::new();
        for (&room_player_id, sender) in self.sessions.iter() {
            if Some(room_player_id) == exclude {
                continue;
            }
            if let Err(err) = sender.try_send(envelope.clone()) {
                match err {
                    mpsc::error::TrySendError::Full(_) => {
                        tracing::warn!(
                            room_id = %self.room_id,
                            room_player_id = %room_player_id,
                            "send queue full, evicting slow consumer"
                        );
                    }
                    mpsc::error::TrySendError::Closed(_) => {}
                }
                evicted.push(room_player_id);
            }
        }
        for room_player_id in evicted {
            self.sessions.remove(&room_player_id);
        }
    }

    fn broadcast_masked_state(
        &mut self,
        game_id: GameId,
        full_state: &serde_json::Value,
        phase: &str,
        version: i64,
        roles: &RoleMap,
    ) {
        let mut evicted = Vec::new();
        for (&room_player_id, sender) in self.sessions.iter() {
            let masked = mask_roles(full_state, room_player_id, roles);
            let envelope = ServerEnvelope::state(game_id, masked, phase.to_string(), version);
            if let Err(err) = sender.try_send(envelope) {
                match err {
                    mpsc::error::TrySendError::Full(_) => {
                        tracing::warn!(
                            room_id = %self.room_id,
                            room_player_id = %room_player_id,
                            "send queue full, evicting slow consumer"
                        );
                    }
                    mpsc::error::TrySendError::Closed(_) => {}
                }
                evicted.push(room_player_id);
            }
        }
        for room_player_id in evicted {
            self.sessions.remove(&room_player_id);
        }
    }
}

/// Strips `state.roles` entries a `viewer` isn't entitled to see: a
/// viewer's own entry always survives; an evil viewer also keeps every
/// other evil entry (classic rules — evil players know each other); a
/// good viewer sees nothing beyond their own role (§9's open question,
/// resolved in DESIGN.md).
fn mask_roles(full_state: &serde_json::Value, viewer: RoomPlayerId, roles: &RoleMap) -> serde_json::Value {
    let mut state = full_state.clone();
    let Some(obj) = state.as_object_mut() else { return state };
    let Some(roles_value) = obj.get_mut("roles").and_then(|v| v.as_object_mut()) else { return state };

    let viewer_is_evil = roles.get(&viewer).is_some_and(|r| r == "evil");
    let viewer_key = viewer.0.to_string();

    roles_value.retain(|key, _| {
        if *key == viewer_key {
            return true;
        }
        if viewer_is_evil {
            let other_id = RoomPlayerId(key.parse().unwrap_or(Uuid::nil()));
            return roles.get(&other_id).is_some_and(|r| r == "evil");
        }
        false
    });

    state
}

pub(crate) fn spawn_room(room_id: Uuid, config: HubConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.command_queue_capacity);
    let actor = RoomActor { room_id, sessions: HashMap::new(), receiver: rx };
    tokio::spawn(actor.run());
    RoomHandle { room_id, sender: tx }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_roles_good_viewer_sees_only_self() {
        let viewer = RoomPlayerId(Uuid::new_v4());
        let evil1 = RoomPlayerId(Uuid::new_v4());
        let evil2 = RoomPlayerId(Uuid::new_v4());
        let mut roles = RoleMap::new();
        roles.insert(viewer, "good".into());
        roles.insert(evil1, "evil".into());
        roles.insert(evil2, "evil".into());

        let state = serde_json::json!({
            "roles": {
                viewer.0.to_string(): "good",
                evil1.0.to_string(): "evil",
                evil2.0.to_string(): "evil",
            }
        });

        let masked = mask_roles(&state, viewer, &roles);
        let obj = masked["roles"].as_object().unwrap();
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key(&viewer.0.to_string()));
    }

    #[test]
    fn mask_roles_evil_viewer_sees_all_evil() {
        let viewer = RoomPlayerId(Uuid::new_v4());
        let evil2 = RoomPlayerId(Uuid::new_v4());
        let good = RoomPlayerId(Uuid::new_v4());
        let mut roles = RoleMap::new();
        roles.insert(viewer, "evil".into());
        roles.insert(evil2, "evil".into());
        roles.insert(good, "good".into());

        let state = serde_json::json!({
            "roles": {
                viewer.0.to_string(): "evil",
                evil2.0.to_string(): "evil",
                good.0.to_string(): "good",
            }
        });

        let masked = mask_roles(&state, viewer, &roles);
        let obj = masked["roles"].as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key(&viewer.0.to_string()));
        assert!(obj.contains_key(&evil2.0.to_string()));
        assert!(!obj.contains_key(&good.0.to_string()));
    }
}
