//! Per-room session registry for Camelot (§4.4).
//!
//! Each room runs as an isolated Tokio task (actor model) holding the set
//! of currently registered sessions, keyed by room-player id. Fan-out is
//! serialized by that task so every recipient in a room observes identical
//! ordering; a session whose send queue is full is evicted rather than
//! allowed to block delivery to everyone else.

mod error;
mod manager;
mod room;

pub use error::HubError;
pub use manager::{Hub, HubConfig};
pub use room::{RoleMap, RoomHandle};
