//! Process entry point: loads configuration, builds the shared application
//! state, and serves the HTTP + WebSocket surface until a shutdown signal
//! arrives (§5, §6).

use std::net::SocketAddr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use camelot_server::config::ServerConfig;
use camelot_server::{build_router, build_state};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = ServerConfig::load();
    let production = std::env::var("CAMELOT_ENV").map(|v| v == "production").unwrap_or(false);
    config.validate(production);

    let shutdown_drain = Duration::from_secs(config.shutdown_drain_secs);
    let bind_addr = config.bind_addr();

    let state = build_state(config).await.unwrap_or_else(|err| {
        tracing::error!(%err, "failed to initialize application state");
        std::process::exit(1);
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind to {bind_addr}: {err}"));
    tracing::info!(addr = %bind_addr, "camelot-server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal(shutdown_drain))
        .await
        .expect("server error");
}

/// Waits for SIGINT or SIGTERM, then returns immediately so axum begins
/// graceful shutdown (stop accepting, let in-flight requests finish). A
/// watchdog force-exits the process after `drain` seconds in case some
/// connection (a long-lived room socket) never finishes on its own (§5).
async fn shutdown_signal(drain: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received, draining for up to {}s", drain.as_secs());
    tokio::spawn(async move {
        tokio::time::sleep(drain).await;
        tracing::warn!("drain window elapsed, forcing exit");
        std::process::exit(0);
    });
}
