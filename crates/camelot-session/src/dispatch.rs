//! Message dispatch for a room socket (§4.5). One [`Dispatcher`] is shared
//! across every session in the process; per-connection identity comes in
//! through [`SessionContext`] on each call.

use camelot_engine::{
    apply_move, ActionMove, EngineEvent, EngineState, Move, MoveOutcome, RulesConfig, VoteMove,
};
use camelot_hub::{RoleMap, RoomHandle};
use camelot_protocol::{
    ActionPayload, ChatPayload, ClientEnvelope, EventName, GameId, RoomPlayerId, ServerEnvelope,
};
use camelot_ratelimit::SlidingWindowLimiter;
use camelot_store::Store;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use crate::context::SessionContext;
use crate::error::SessionError;

const MAX_CHAT_LEN: usize = 2000;

pub struct Dispatcher {
    store: Store,
    rules: RulesConfig,
    chat_limiter: SlidingWindowLimiter<String>,
}

impl Dispatcher {
    pub fn new(store: Store, rules: RulesConfig) -> Self {
        Self { store, rules, chat_limiter: SlidingWindowLimiter::default_preset() }
    }

    /// Routes one decoded client message. Validation and Store/Engine
    /// failures are reported to `outbound` (the sender only, per §4.5) and
    /// swallowed here — only a dead `outbound` channel propagates as an
    /// error, since that means the connection itself is gone.
    pub async fn dispatch(
        &self,
        ctx: &SessionContext,
        room: &RoomHandle,
        outbound: &mpsc::Sender<ServerEnvelope>,
        envelope: ClientEnvelope,
    ) -> Result<(), SessionError> {
        let result = match envelope {
            ClientEnvelope::Chat { payload, .. } => self.handle_chat(ctx, room, payload).await,
            ClientEnvelope::SyncState { .. } => self.handle_sync_state(ctx, outbound).await,
            ClientEnvelope::Vote { payload, .. } => {
                let mv = Move::Vote(VoteMove { approved: payload.approved, success: payload.success });
                self.handle_move(ctx, room, mv, "vote", json!(payload)).await
            }
            ClientEnvelope::Action { payload, .. } => {
                let wire_payload = json!(&payload);
                let mv = Move::Action(match payload {
                    ActionPayload::StartGame => ActionMove::StartGame,
                    ActionPayload::ProposeTeam { team_ids } => ActionMove::ProposeTeam {
                        team_ids: team_ids.into_iter().map(|id| id.0).collect(),
                    },
                });
                self.handle_move(ctx, room, mv, "action", wire_payload).await
            }
        };

        if let Err(err) = result {
            let _ = outbound.send(ServerEnvelope::error(err.to_string())).await;
        }
        Ok(())
    }

    async fn handle_chat(
        &self,
        ctx: &SessionContext,
        room: &RoomHandle,
        payload: ChatPayload,
    ) -> Result<(), SessionError> {
        let (allowed, retry_after) = self.chat_limiter.allow(ctx.rate_limit_key.clone()).await;
        if !allowed {
            return Err(SessionError::RateLimited {
                retry_after_secs: retry_after.map(|d| d.as_secs()).unwrap_or(60),
            });
        }

        let body = payload.message.trim();
        if body.is_empty() {
            return Ok(());
        }
        let body: String = body.chars().take(MAX_CHAT_LEN).collect();

        let latest_game = self.store.get_latest_game(ctx.room_id).await?;
        self.store
            .append_chat_message(ctx.room_id, latest_game.map(|g| g.id), ctx.room_player_id.0, &body)
            .await?;

        room.broadcast_except(
            ServerEnvelope::Event {
                event: EventName::Chat,
                payload: json!({ "display_name": ctx.display_name, "message": body }),
            },
            ctx.room_player_id,
        )
        .await;
        Ok(())
    }

    async fn handle_sync_state(
        &self,
        ctx: &SessionContext,
        outbound: &mpsc::Sender<ServerEnvelope>,
    ) -> Result<(), SessionError> {
        let envelope = match self.store.get_latest_game(ctx.room_id).await? {
            None => ServerEnvelope::state(GameId(uuid::Uuid::nil()), json!({"phase": "lobby"}), "lobby".into(), 0),
            Some(game) => {
                let state = self.store.get_latest_snapshot(game.id).await?.unwrap_or_else(|| json!({"phase": "lobby"}));
                let phase = state.get("phase").and_then(Value::as_str).unwrap_or("lobby").to_string();
                let version = state.get("version").and_then(Value::as_i64).unwrap_or(0);
                ServerEnvelope::state(GameId(game.id), state, phase, version)
            }
        };
        let _ = outbound.send(envelope).await;
        Ok(())
    }

    async fn handle_move(
        &self,
        ctx: &SessionContext,
        room: &RoomHandle,
        mv: Move,
        move_type: &str,
        wire_payload: Value,
    ) -> Result<(), SessionError> {
        let game = self.store.get_latest_game(ctx.room_id).await?.ok_or(SessionError::NoActiveGame)?;
        let snapshot = self
            .store
            .get_latest_snapshot(game.id)
            .await?
            .unwrap_or_else(|| json!(EngineState::lobby(game.id)));
        let current: EngineState = serde_json::from_value(snapshot).map_err(SessionError::Decode)?;
        let join_order = self.store.get_game_player_ids_in_join_order(game.id).await?;

        let seed = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let MoveOutcome { next_state, events } =
            apply_move(&current, &self.rules, &join_order, ctx.room_player_id.0, mv, seed)?;

        let next_state_json = serde_json::to_value(&next_state).map_err(SessionError::Decode)?;
        let finished_at = (next_state.status == camelot_engine::GameStatus::Finished)
            .then(chrono::Utc::now);
        let version = self
            .store
            .append_event_and_snapshot(
                game.id,
                Some(ctx.room_player_id.0),
                move_type,
                wire_payload,
                next_state_json.clone(),
                finished_at,
            )
            .await?;

        for event in &events {
            let (name, payload) = wire_event(event);
            room.broadcast_envelope(ServerEnvelope::Event { event: name, payload }).await;
        }

        let phase = next_state_json.get("phase").and_then(Value::as_str).unwrap_or("lobby").to_string();
        let roles: RoleMap = next_state
            .roles
            .iter()
            .map(|(id, role)| (RoomPlayerId(*id), role_label(*role).to_string()))
            .collect();
        room.broadcast_masked_state(GameId(game.id), next_state_json, phase, version, roles).await;

        Ok(())
    }
}

fn role_label(role: camelot_engine::Role) -> &'static str {
    match role {
        camelot_engine::Role::Good => "good",
        camelot_engine::Role::Evil => "evil",
    }
}

fn wire_event(event: &EngineEvent) -> (EventName, Value) {
    match event {
        EngineEvent::GameStarted { phase, round_index, leader_id } => (
            EventName::GameStarted,
            json!({ "phase": phase, "round_index": round_index, "leader_id": leader_id }),
        ),
        EngineEvent::TeamProposed { team, phase } => {
            (EventName::TeamProposed, json!({ "team": team, "phase": phase }))
        }
        EngineEvent::VoteRecorded { player_id } => {
            (EventName::VoteRecorded, json!({ "player_id": player_id }))
        }
        EngineEvent::TeamApproved { phase } => (EventName::TeamApproved, json!({ "phase": phase })),
        EngineEvent::TeamRejected { phase, reject_count, leader_id } => (
            EventName::TeamRejected,
            json!({ "phase": phase, "reject_count": reject_count, "leader_id": leader_id }),
        ),
        EngineEvent::MissionResolved { result, round_index, leader_id, phase } => (
            EventName::MissionResolved,
            json!({ "result": result, "round_index": round_index, "leader_id": leader_id, "phase": phase }),
        ),
        EngineEvent::GameEnded { winner, mission_result } => (
            EventName::GameEnded,
            json!({ "winner": winner, "mission_result": mission_result }),
        ),
    }
}
