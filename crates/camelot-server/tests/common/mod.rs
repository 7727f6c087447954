//! Shared test harness: spins up a real `camelot-server` instance bound to
//! an ephemeral port, against the database named by `DATABASE_URL`. Tests
//! that need it call `TestServer::new().await` and skip themselves (via the
//! early `return` the caller performs on `None`) when no database is
//! configured.

use std::net::SocketAddr;

use camelot_server::config::ServerConfig;

pub struct TestServer {
    pub addr: SocketAddr,
    _server: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Option<Self> {
        let database_url = std::env::var("DATABASE_URL").ok()?;

        let config = ServerConfig {
            database_url,
            http_addr: ":0".to_string(),
            migrations_dir: "migrations".to_string(),
            websocket_token_secret: Some("integration-test-secret".to_string()),
            db_pool_size: 5,
            send_queue_capacity: 64,
            ping_interval_secs: 54,
            pong_timeout_secs: 60,
            max_message_bytes: 512 * 1024,
            rate_limit_window_secs: 60,
            rate_limit_count: 1000,
            shutdown_drain_secs: 1,
        };

        let state = camelot_server::build_state(config).await.expect("build state");
        let app = camelot_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local_addr");

        let server = tokio::spawn(async move {
            axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
                .await
                .expect("test server error");
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        Some(Self { addr, _server: server })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self, code: &str, token: &str) -> String {
        format!("ws://{}/ws/rooms/{code}?token={token}", self.addr)
    }
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@camelot.example", uuid::Uuid::new_v4())
}
