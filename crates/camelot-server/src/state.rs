//! Shared application state, handed to every axum handler via `State`.

use std::net::IpAddr;
use std::sync::Arc;

use camelot_hub::Hub;
use camelot_ratelimit::SlidingWindowLimiter;
use camelot_session::Dispatcher;
use camelot_store::Store;
use camelot_token::TokenService;

use crate::config::ServerConfig;

/// Room tokens are short-lived: a client re-derives one from `/rooms/{code}`
/// or `/rooms/{code}/join` rather than holding a long-lived credential to a
/// live socket. Not specified by spec.md's Token Service contract (the TTL
/// argument is a caller-supplied parameter) — recorded as a default in
/// DESIGN.md.
pub const ROOM_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;
/// User tokens back the account session and are long-lived by comparison.
pub const USER_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub hub: Hub,
    pub tokens: Arc<TokenService>,
    pub dispatcher: Arc<Dispatcher>,
    pub http_limiter: Arc<SlidingWindowLimiter<IpAddr>>,
    pub config: Arc<ServerConfig>,
}
