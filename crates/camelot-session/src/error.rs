//! Error types for the session layer.

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("message exceeds the 512 KiB limit")]
    MessageTooLarge,
    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("room token invalid or expired")]
    Unauthorized,
    #[error("room has no game yet")]
    NoActiveGame,
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error(transparent)]
    Engine(#[from] camelot_engine::EngineError),
    #[error(transparent)]
    Store(#[from] camelot_store::StoreError),
    #[error(transparent)]
    Hub(#[from] camelot_hub::HubError),
}
