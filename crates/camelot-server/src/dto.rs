//! Request/response bodies for the HTTP surface (§4.7, §6). Kept separate
//! from `camelot-store`'s row types so a password hash can never
//! accidentally round-trip onto the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use camelot_store::{Game, GamePlayer, Room, RoomPlayer, User};

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomView {
    pub id: Uuid,
    pub code: String,
    pub has_password: bool,
    pub settings: Value,
    pub created_at: DateTime<Utc>,
}

impl From<&Room> for RoomView {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id,
            code: room.code.clone(),
            has_password: room.password_hash.is_some(),
            settings: room.settings.clone(),
            created_at: room.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoomPlayerView {
    pub id: Uuid,
    pub display_name: String,
    pub is_host: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&RoomPlayer> for RoomPlayerView {
    fn from(player: &RoomPlayer) -> Self {
        Self {
            id: player.id,
            display_name: player.display_name.clone(),
            is_host: player.is_host,
            created_at: player.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameView {
    pub id: Uuid,
    pub status: String,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id,
            status: game.status.clone(),
            config: game.config.clone(),
            created_at: game.created_at,
            ended_at: game.ended_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GamePlayerView {
    pub id: Uuid,
    pub room_player_id: Uuid,
    pub role: Option<String>,
}

impl From<&GamePlayer> for GamePlayerView {
    fn from(player: &GamePlayer) -> Self {
        Self { id: player.id, room_player_id: player.room_player_id, role: player.role.clone() }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserView,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room: RoomView,
    pub room_player: RoomPlayerView,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Deserialize)]
pub struct JoinRoomRequest {
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinRoomResponse {
    pub room: RoomView,
    pub room_player: RoomPlayerView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_game: Option<GameView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_player: Option<GamePlayerView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_snapshot: Option<Value>,
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
pub struct RoomDetailResponse {
    pub room: RoomView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_game: Option<GameView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_snapshot: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub config: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub game: GameView,
    pub players: Vec<GamePlayerView>,
    pub latest_snapshot: Value,
}

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
