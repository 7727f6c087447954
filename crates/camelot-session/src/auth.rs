//! Authenticates a room socket upgrade and builds its [`SessionContext`].

use std::net::IpAddr;

use camelot_protocol::RoomPlayerId;
use camelot_store::Store;
use camelot_token::TokenService;

use crate::context::SessionContext;
use crate::error::SessionError;

/// Verifies the room token presented at `GET /ws/rooms/{code}` and loads the
/// matching room-player's display name, so the dispatch layer never has to
/// re-derive identity from the token on every message. `client_ip` is the
/// address captured at upgrade time, carried into the session's rate-limit
/// key (§4.6).
pub async fn authenticate_room_socket(
    tokens: &TokenService,
    store: &Store,
    code: &str,
    token: &str,
    now_unix: i64,
    client_ip: IpAddr,
) -> Result<SessionContext, SessionError> {
    let claims = tokens
        .verify_room_token(token, now_unix)
        .map_err(|_| SessionError::Unauthorized)?;

    let room = store.get_room_by_code(code).await.map_err(|_| SessionError::Unauthorized)?;
    if room.id != claims.room_id {
        return Err(SessionError::Unauthorized);
    }

    let player = store
        .get_room_player_in_room(code, claims.room_player_id)
        .await
        .map_err(|_| SessionError::Unauthorized)?;

    Ok(SessionContext::new(
        room.id,
        RoomPlayerId(claims.room_player_id),
        player.display_name,
        client_ip,
    ))
}
