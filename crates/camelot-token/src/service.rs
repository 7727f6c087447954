//! Mints and verifies HMAC-signed room/user session tokens.
//!
//! Token shape: `<hex(json claims)>.<hex(hmac-sha256 tag)>`. The payload is
//! canonical JSON (one claim schema per variant) so re-signing the same
//! claims always reproduces the same tag — useful for tests, not required
//! for correctness.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::claims::{Claims, RoomClaims, UserClaims};
use crate::error::TokenError;

type HmacSha256 = Hmac<Sha256>;

/// Mints and verifies room/user tokens against a single shared secret.
///
/// Constructed with `secret: None` when `WEBSOCKET_TOKEN_SECRET` is unset;
/// every verify then fails closed with [`TokenError::Invalid`] rather than
/// panicking, and minting fails with [`TokenError::MissingSecret`] — the
/// orchestration layer decides whether that's fatal at boot (§7).
pub struct TokenService {
    secret: Option<Vec<u8>>,
}

impl TokenService {
    pub fn new(secret: Option<Vec<u8>>) -> Self {
        Self { secret }
    }

    pub fn generate_room_token(
        &self,
        room_id: Uuid,
        room_player_id: Uuid,
        ttl_secs: i64,
        now_unix: i64,
    ) -> Result<(String, i64), TokenError> {
        let exp = now_unix + ttl_secs;
        let claims = Claims::Room { room_id, room_player_id, exp };
        Ok((self.sign(&claims)?, exp))
    }

    pub fn generate_user_token(
        &self,
        user_id: Uuid,
        ttl_secs: i64,
        now_unix: i64,
    ) -> Result<(String, i64), TokenError> {
        let exp = now_unix + ttl_secs;
        let claims = Claims::User { user_id, exp };
        Ok((self.sign(&claims)?, exp))
    }

    pub fn verify_room_token(&self, token: &str, now_unix: i64) -> Result<RoomClaims, TokenError> {
        match self.verify(token, now_unix)? {
            Claims::Room { room_id, room_player_id, exp } => {
                Ok(RoomClaims { room_id, room_player_id, expires_at: exp })
            }
            Claims::User { .. } => Err(TokenError::Invalid),
        }
    }

    pub fn verify_user_token(&self, token: &str, now_unix: i64) -> Result<UserClaims, TokenError> {
        match self.verify(token, now_unix)? {
            Claims::User { user_id, exp } => Ok(UserClaims { user_id, expires_at: exp }),
            Claims::Room { .. } => Err(TokenError::Invalid),
        }
    }

    fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let secret = self.secret.as_ref().ok_or(TokenError::MissingSecret)?;
        let payload_json = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
        let payload_hex = hex::encode(payload_json);

        let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::MissingSecret)?;
        mac.update(payload_hex.as_bytes());
        let tag_hex = hex::encode(mac.finalize().into_bytes());

        Ok(format!("{payload_hex}.{tag_hex}"))
    }

    fn verify(&self, token: &str, now_unix: i64) -> Result<Claims, TokenError> {
        let Some(secret) = self.secret.as_ref() else {
            return Err(TokenError::Invalid);
        };

        let (payload_hex, tag_hex) = token.split_once('.').ok_or(TokenError::Malformed)?;

        let tag_bytes = hex::decode(tag_hex).map_err(|_| TokenError::Malformed)?;
        let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::Invalid)?;
        mac.update(payload_hex.as_bytes());
        mac.verify_slice(&tag_bytes).map_err(|_| TokenError::Invalid)?;

        let payload_bytes = hex::decode(payload_hex).map_err(|_| TokenError::Malformed)?;
        let claims: Claims =
            serde_json::from_slice(&payload_bytes).map_err(|_| TokenError::Malformed)?;

        if claims.exp() < now_unix {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}
