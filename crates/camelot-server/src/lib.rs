pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod ratelimit;
pub mod routes;
pub mod state;
pub mod validation;
pub mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use camelot_engine::RulesConfig;
use camelot_hub::{Hub, HubConfig};
use camelot_ratelimit::SlidingWindowLimiter;
use camelot_session::Dispatcher;
use camelot_store::{Store, StoreError};
use camelot_token::TokenService;

use config::ServerConfig;
use state::AppState;

/// Connects to Postgres, runs migrations, and wires every collaborator
/// (`Hub`, `TokenService`, `Dispatcher`, the HTTP rate limiter) into one
/// [`AppState`]. Split out of `main` so integration tests can build the same
/// state against a test database without going through the binary.
pub async fn build_state(config: ServerConfig) -> Result<AppState, StoreError> {
    let store = Store::connect(&config.database_url).await?;
    store.run_migrations().await?;

    let hub = Hub::new(HubConfig {
        send_queue_capacity: config.send_queue_capacity,
        command_queue_capacity: config.send_queue_capacity,
    });
    let tokens = Arc::new(TokenService::new(
        config.websocket_token_secret.clone().map(String::into_bytes),
    ));
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), RulesConfig::default()));
    let http_limiter = Arc::new(SlidingWindowLimiter::new(
        config.rate_limit_count,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    Ok(AppState { store, hub, tokens, dispatcher, http_limiter, config: Arc::new(config) })
}

/// Builds the full HTTP + WebSocket router over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/users/me", get(routes::auth::me))
        .route("/rooms", post(routes::rooms::create_room))
        .route("/rooms/{code}", get(routes::rooms::get_room))
        .route("/rooms/{code}/join", post(routes::rooms::join_room))
        .route("/rooms/{code}/games", post(routes::rooms::create_game))
        .route("/ws/rooms/{code}", get(ws::ws_room))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
