//! Per-connection read/write loop semantics and message dispatch (§4.5).
//!
//! This crate doesn't own a socket — that's the entry layer's job. It owns
//! the contract between one connection and the rest of the system: how a
//! room token turns into an identity ([`auth`]), what framing limits apply
//! to a raw message before it's even parsed ([`framing`]), and what happens
//! once a message is parsed ([`Dispatcher`]).

mod auth;
mod context;
mod dispatch;
mod error;
mod framing;

pub use auth::authenticate_room_socket;
pub use context::SessionContext;
pub use dispatch::Dispatcher;
pub use error::SessionError;
pub use framing::{decode_client_message, MAX_MESSAGE_SIZE, PING_INTERVAL, PONG_TIMEOUT};
