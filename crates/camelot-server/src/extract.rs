//! Bearer-token extraction shared by every authenticated HTTP route (§4.7).

use axum::http::HeaderMap;
use camelot_token::UserClaims;
use chrono::Utc;

use crate::error::CamelotError;
use crate::state::AppState;

/// Pulls `Authorization: Bearer <token>` out of the request and verifies it
/// as a user-session token.
pub fn bearer_user_claims(state: &AppState, headers: &HeaderMap) -> Result<UserClaims, CamelotError> {
    let token = bearer_token(headers)?;
    state
        .tokens
        .verify_user_token(token, Utc::now().timestamp())
        .map_err(|_| CamelotError::Unauthorized)
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str, CamelotError> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(CamelotError::Unauthorized)
}
