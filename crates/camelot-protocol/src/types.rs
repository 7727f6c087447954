//! Message envelope types for the room socket.
//!
//! Two directions, two envelope shapes. Clients send [`ClientEnvelope`]s
//! (`chat`, `vote`, `action`, `sync_state`); the server sends
//! [`ServerEnvelope`]s (`event`, `state`, `error`). Both are internally
//! tagged on `type` so a peer can dispatch on one field before touching
//! the payload.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A room player's identity, stable for the lifetime of a room.
///
/// `#[serde(transparent)]` means this serializes as a bare UUID string on
/// the wire, not `{"0": "..."}` — callers never see the wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomPlayerId(pub Uuid);

impl std::fmt::Display for RoomPlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single game instance within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(pub Uuid);

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-to-server message. Internally tagged on `type`; unknown tags are
/// rejected by the session's read loop before reaching this type (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEnvelope {
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        payload: ChatPayload,
    },
    Vote {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        payload: VotePayload,
    },
    Action {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        payload: ActionPayload,
    },
    SyncState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        #[serde(default)]
        payload: SyncStatePayload,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPayload {
    pub message: String,
}

/// Team and mission votes share a wire shape (`vote`) but differ in which
/// field is populated; the phase disambiguates which one the engine expects
/// (§4.3). Both fields are optional on the wire and validated by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VotePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionPayload {
    StartGame,
    ProposeTeam { team_ids: Vec<RoomPlayerId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncStatePayload {}

/// Server-to-client message. Always carries an `event` name alongside the
/// `type` discriminant (§6) so clients can dispatch on either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEnvelope {
    Event {
        event: EventName,
        payload: serde_json::Value,
    },
    State {
        event: EventName,
        payload: StatePayload,
    },
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        correlation_id: Option<String>,
        payload: ErrorPayload,
    },
}

impl ServerEnvelope {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEnvelope::Error {
            correlation_id: None,
            payload: ErrorPayload { message: message.into() },
        }
    }

    pub fn state(game_id: GameId, state: serde_json::Value, phase: String, version: i64) -> Self {
        ServerEnvelope::State {
            event: EventName::State,
            payload: StatePayload { game_id, state, phase, version },
        }
    }
}

/// The complete set of event names the engine or chat handler may emit,
/// per §6. A closed enum (rather than a bare string) so a typo in a new
/// engine variant fails to compile instead of silently mismatching clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    Chat,
    VoteRecorded,
    TeamProposed,
    TeamApproved,
    TeamRejected,
    MissionResolved,
    GameStarted,
    GameEnded,
    State,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatePayload {
    pub game_id: GameId,
    pub state: serde_json::Value,
    pub phase: String,
    pub version: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}
