//! Canonical claim shapes for the two token variants.
//!
//! Room tokens and user tokens are deliberately different shapes — not just
//! different values — so one can never verify as the other (§4.1). The
//! `kind` tag makes a cross-presented token fail at the variant-match step
//! rather than relying on field overlap alone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum Claims {
    Room { room_id: Uuid, room_player_id: Uuid, exp: i64 },
    User { user_id: Uuid, exp: i64 },
}

impl Claims {
    pub(crate) fn exp(&self) -> i64 {
        match self {
            Claims::Room { exp, .. } => *exp,
            Claims::User { exp, .. } => *exp,
        }
    }
}

/// Verified claims for a room-session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomClaims {
    pub room_id: Uuid,
    pub room_player_id: Uuid,
    pub expires_at: i64,
}

/// Verified claims for a user-session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserClaims {
    pub user_id: Uuid,
    pub expires_at: i64,
}
