//! `/rooms/*` (§4.7): create, join, inspect, and start a game within a room.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;

use crate::dto::{
    CreateGameRequest, CreateGameResponse, CreateRoomRequest, CreateRoomResponse, GamePlayerView,
    GameView, JoinRoomRequest, JoinRoomResponse, RoomDetailResponse, RoomPlayerView, RoomView,
};
use crate::error::CamelotError;
use crate::extract::bearer_user_claims;
use crate::state::{AppState, ROOM_TOKEN_TTL_SECS};
use crate::validation::{validate_display_name, validate_room_code};

pub async fn create_room(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(body): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), CamelotError> {
    crate::ratelimit::check(&state, addr.ip()).await?;

    let claims = bearer_user_claims(&state, &headers)?;
    let user = state.store.get_user(claims.user_id).await?;
    let display_name = validate_display_name(&user.display_name)?;
    let settings = body.settings.unwrap_or_else(|| serde_json::json!({}));

    let (room, room_player, _game) = state
        .store
        .create_room(Some(user.id), &display_name, body.password.as_deref(), settings)
        .await?;

    let (token, expires_at) = state.tokens.generate_room_token(
        room.id,
        room_player.id,
        ROOM_TOKEN_TTL_SECS,
        Utc::now().timestamp(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            room: RoomView::from(&room),
            room_player: RoomPlayerView::from(&room_player),
            token,
            expires_at,
        }),
    ))
}

pub async fn join_room(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, CamelotError> {
    crate::ratelimit::check(&state, addr.ip()).await?;

    let code = validate_room_code(&code)?;
    let claims = bearer_user_claims(&state, &headers)?;
    let user = state.store.get_user(claims.user_id).await?;
    let display_name = validate_display_name(&user.display_name)?;

    let (room, room_player, latest_game, game_player) = state
        .store
        .join_room(&code, Some(user.id), &display_name, body.password.as_deref())
        .await?;

    let latest_snapshot = match &latest_game {
        Some(game) => state.store.get_latest_snapshot(game.id).await?,
        None => None,
    };

    let (token, expires_at) = state.tokens.generate_room_token(
        room.id,
        room_player.id,
        ROOM_TOKEN_TTL_SECS,
        Utc::now().timestamp(),
    )?;

    Ok(Json(JoinRoomResponse {
        room: RoomView::from(&room),
        room_player: RoomPlayerView::from(&room_player),
        latest_game: latest_game.as_ref().map(GameView::from),
        game_player: game_player.as_ref().map(GamePlayerView::from),
        latest_snapshot,
        token,
        expires_at,
    }))
}

pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<RoomDetailResponse>, CamelotError> {
    let code = validate_room_code(&code)?;
    let room = state.store.get_room_by_code(&code).await?;
    let latest_game = state.store.get_latest_game(room.id).await?;
    let latest_snapshot = match &latest_game {
        Some(game) => state.store.get_latest_snapshot(game.id).await?,
        None => None,
    };

    Ok(Json(RoomDetailResponse {
        room: RoomView::from(&room),
        latest_game: latest_game.as_ref().map(GameView::from),
        latest_snapshot,
    }))
}

/// Starts a new game in a room. Host-only: the caller's room-player row for
/// this room must have `is_host = true` (§4.7).
pub async fn create_game(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(code): Path<String>,
    headers: HeaderMap,
    Json(body): Json<CreateGameRequest>,
) -> Result<(StatusCode, Json<CreateGameResponse>), CamelotError> {
    crate::ratelimit::check(&state, addr.ip()).await?;

    let code = validate_room_code(&code)?;
    let claims = bearer_user_claims(&state, &headers)?;
    let room_player = state.store.get_room_player_by_user_in_room(&code, claims.user_id).await?;
    if !room_player.is_host {
        return Err(CamelotError::NotHost);
    }

    let room = state.store.get_room_by_code(&code).await?;
    let config = body.config.unwrap_or_else(|| serde_json::json!({}));
    let (game, game_players, snapshot) = state.store.create_game(room.id, config).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse {
            game: GameView::from(&game),
            players: game_players.iter().map(GamePlayerView::from).collect(),
            latest_snapshot: snapshot.state,
        }),
    ))
}
