//! Per-connection identity (§4.5): everything a dispatch call needs to know
//! about which socket a message came from, without re-deriving it from the
//! room token on every message.

use std::net::IpAddr;

use camelot_protocol::RoomPlayerId;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub room_id: Uuid,
    pub room_player_id: RoomPlayerId,
    pub display_name: String,
    /// The rate-limit key for this connection: the client IP captured at
    /// upgrade (§4.6 — WS chat is keyed by IP, same as the HTTP routes, so
    /// one attacker can't bypass the ceiling by opening more room-player
    /// identities).
    pub rate_limit_key: String,
}

impl SessionContext {
    pub fn new(
        room_id: Uuid,
        room_player_id: RoomPlayerId,
        display_name: String,
        client_ip: IpAddr,
    ) -> Self {
        let rate_limit_key = client_ip.to_string();
        Self { room_id, room_player_id, display_name, rate_limit_key }
    }
}
