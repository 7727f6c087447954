//! `ServerConfig`: environment-var configuration (§6's Environment
//! Variables list) plus the operational knobs a real deployment needs that
//! the distilled spec only mentions in prose.

/// Top-level server configuration, loaded entirely from environment
/// variables — no `camelot.toml`, matching spec.md §1's scope (a config
/// file loader is explicitly out of scope).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub http_addr: String,
    /// Carried for parity with §6's env var list. `camelot-store`'s
    /// migrator path is fixed at compile time via `sqlx::migrate!`, so this
    /// field is informational only — see DESIGN.md.
    pub migrations_dir: String,
    pub websocket_token_secret: Option<String>,
    pub db_pool_size: u32,
    pub send_queue_capacity: usize,
    pub ping_interval_secs: u64,
    pub pong_timeout_secs: u64,
    pub max_message_bytes: usize,
    pub rate_limit_window_secs: u64,
    pub rate_limit_count: usize,
    pub shutdown_drain_secs: u64,
}

impl ServerConfig {
    /// Loads configuration from environment variables, applying the
    /// defaults spec.md §6 and SPEC_FULL.md's Configuration section name.
    pub fn load() -> Self {
        let mut config = Self {
            database_url: String::new(),
            http_addr: ":8080".to_string(),
            migrations_dir: "migrations".to_string(),
            websocket_token_secret: None,
            db_pool_size: 25,
            send_queue_capacity: 256,
            ping_interval_secs: 54,
            pong_timeout_secs: 60,
            max_message_bytes: 512 * 1024,
            rate_limit_window_secs: 60,
            rate_limit_count: 20,
            shutdown_drain_secs: 10,
        };

        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if !addr.is_empty() {
                config.http_addr = addr;
            }
        }
        if let Ok(dir) = std::env::var("MIGRATIONS_DIR") {
            if !dir.is_empty() {
                config.migrations_dir = dir;
            }
        }
        if let Ok(secret) = std::env::var("WEBSOCKET_TOKEN_SECRET") {
            if !secret.is_empty() {
                config.websocket_token_secret = Some(secret);
            }
        }

        config
    }

    /// Returns a bindable socket address, expanding spec.md's `:8080`
    /// shorthand to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> String {
        if let Some(port) = self.http_addr.strip_prefix(':') {
            format!("0.0.0.0:{port}")
        } else {
            self.http_addr.clone()
        }
    }

    /// Exits non-zero on fatal misconfiguration, matching §7's "Fatal"
    /// error kind: no secret, unparseable address, empty database URL.
    pub fn validate(&self, production: bool) {
        if self.database_url.is_empty() {
            tracing::error!("DATABASE_URL is required");
            std::process::exit(1);
        }
        if self.bind_addr().parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(addr = %self.http_addr, "HTTP_ADDR is not a valid socket address");
            std::process::exit(1);
        }
        if production && self.websocket_token_secret.is_none() {
            tracing::error!("WEBSOCKET_TOKEN_SECRET is required in production");
            std::process::exit(1);
        }
    }
}
