//! The Store's closed error surface (§4.2). Anything not in this set is an
//! opaque `Internal` error — callers never see raw SQL failures.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("room not found")]
    RoomNotFound,
    #[error("not in room")]
    NotInRoom,
    #[error("user not in room")]
    UserNotInRoom,
    #[error("email already registered")]
    EmailExists,
    #[error("invalid password")]
    InvalidPassword,
    #[error("password required")]
    PasswordRequired,
    #[error("display name already taken in this room")]
    NameTaken,
    #[error("room has no players")]
    RoomHasNoPlayers,
    #[error("internal store error")]
    Internal(#[from] sqlx::Error),
}
