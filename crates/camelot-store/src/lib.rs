//! Transactional Postgres repository over rooms, players, games, snapshots,
//! and the event log (§3, §4.2). Every public method on [`Store`] either
//! commits everything it touches or leaves the database unchanged.

mod codes;
mod error;
mod models;
mod store;

pub use codes::generate_room_code;
pub use error::StoreError;
pub use models::{ChatMessage, Event, Game, GamePlayer, Room, RoomPlayer, Snapshot, User};
pub use store::Store;
