//! HMAC-signed room and user session tokens.
//!
//! Two opaque token variants, both symmetric-authenticated: a canonical
//! JSON payload, an HMAC-SHA256 tag computed over it, concatenated with a
//! `.` delimiter. Distinct claim schemas mean a user token can never verify
//! as a room token or vice versa (§4.1).

mod claims;
mod error;
mod service;

pub use claims::{RoomClaims, UserClaims};
pub use error::TokenError;
pub use service::TokenService;
