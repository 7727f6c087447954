//! Error types for the room layer.

use uuid::Uuid;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The room's coordinator task is gone (panicked or shut down).
    #[error("room {0} is unavailable")]
    Unavailable(Uuid),
}
