//! `GET /ws/rooms/{code}` (§4.5, §4.7): upgrades to a room socket, then hands
//! every decoded message to the shared [`camelot_session::Dispatcher`].
//!
//! Split-socket shape (one task reading, one task writing, joined through an
//! mpsc channel) follows the same pattern as a plain tokio-tungstenite relay
//! server, just rebuilt on axum's native upgrade instead of a bare accept loop.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Path, Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use camelot_hub::RoomHandle;
use camelot_protocol::{Codec, JsonCodec, ServerEnvelope};
use camelot_session::{decode_client_message, SessionContext, PING_INTERVAL, PONG_TIMEOUT};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::dto::WsQuery;
use crate::error::CamelotError;
use crate::extract::bearer_token;
use crate::state::AppState;
use crate::validation::validate_room_code;

pub async fn ws_room(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(code): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, CamelotError> {
    let token = query.token.or_else(|| bearer_token(&headers).ok().map(str::to_string));
    let token = token.ok_or(CamelotError::Unauthorized)?;
    let code = validate_room_code(&code)?;

    let ctx = camelot_session::authenticate_room_socket(
        &state.tokens,
        &state.store,
        &code,
        &token,
        Utc::now().timestamp(),
        addr.ip(),
    )
    .await
    .map_err(|_| CamelotError::Unauthorized)?;

    let room = state.hub.room(ctx.room_id).await;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, room, ctx)))
}

async fn handle_socket(socket: WebSocket, state: AppState, room: RoomHandle, ctx: SessionContext) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<ServerEnvelope>(state.config.send_queue_capacity);

    room.register(ctx.room_player_id, outbound_tx.clone()).await;
    tracing::info!(room_id = %ctx.room_id, room_player_id = %ctx.room_player_id, "socket connected");

    let last_pong = Arc::new(Mutex::new(Instant::now()));
    let writer_last_pong = last_pong.clone();
    let writer = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PING_INTERVAL);
        ticker.tick().await; // first tick fires immediately; skip it
        loop {
            tokio::select! {
                envelope = outbound_rx.recv() => {
                    let Some(envelope) = envelope else { break };
                    let Ok(bytes) = JsonCodec.encode(&envelope) else { continue };
                    let Ok(text) = String::from_utf8(bytes) else { continue };
                    if ws_sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if writer_last_pong.lock().unwrap().elapsed() > PONG_TIMEOUT {
                        tracing::info!("pong timeout, closing socket");
                        break;
                    }
                    if ws_sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    while let Some(Ok(msg)) = ws_receiver.next().await {
        match msg {
            Message::Text(text) => match decode_client_message(&text) {
                Ok(envelope) => {
                    let _ = state.dispatcher.dispatch(&ctx, &room, &outbound_tx, envelope).await;
                }
                Err(err) => {
                    let _ = outbound_tx.send(ServerEnvelope::error(err.to_string())).await;
                }
            },
            Message::Pong(_) => {
                *last_pong.lock().unwrap() = Instant::now();
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    drop(outbound_tx);
    let _ = writer.await;
    state.hub.unregister(ctx.room_id, ctx.room_player_id).await;
    tracing::info!(room_id = %ctx.room_id, room_player_id = %ctx.room_player_id, "socket disconnected");
}
