//! HTTP-side rate limiting (§4.6): create-room, join-room, register, and
//! login are all keyed by client IP.

use std::net::IpAddr;

use crate::error::CamelotError;
use crate::state::AppState;

pub async fn check(state: &AppState, ip: IpAddr) -> Result<(), CamelotError> {
    let (allowed, retry_after) = state.http_limiter.allow(ip).await;
    if allowed {
        return Ok(());
    }
    Err(CamelotError::RateLimited { retry_after_secs: retry_after.map(|d| d.as_secs()).unwrap_or(60) })
}
