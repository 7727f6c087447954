//! `/auth/*` and `/users/me` (§4.7).

use std::net::SocketAddr;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;

use crate::dto::{AuthResponse, LoginRequest, RegisterRequest, UserView};
use crate::error::CamelotError;
use crate::extract::bearer_user_claims;
use crate::state::{AppState, USER_TOKEN_TTL_SECS};
use crate::validation::{validate_display_name, validate_email, validate_password};

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), CamelotError> {
    crate::ratelimit::check(&state, addr.ip()).await?;

    let email = validate_email(&body.email)?;
    validate_password(&body.password)?;
    let display_name = validate_display_name(&body.display_name)?;

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(body.password.as_bytes(), &salt)
        .map_err(|err| {
            tracing::error!(%err, "password hashing failed");
            CamelotError::Validation("could not process password".into())
        })?
        .to_string();

    let user = state.store.create_user(&email, &password_hash, &display_name).await?;
    let now = Utc::now().timestamp();
    let (token, expires_at) =
        state.tokens.generate_user_token(user.id, USER_TOKEN_TTL_SECS, now)?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user: UserView::from(&user), token, expires_at })))
}

pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, CamelotError> {
    crate::ratelimit::check(&state, addr.ip()).await?;

    let email = validate_email(&body.email)?;
    let user = state
        .store
        .verify_user_password(&email, &body.password)
        .await?
        .ok_or(CamelotError::Unauthorized)?;

    let now = Utc::now().timestamp();
    let (token, expires_at) =
        state.tokens.generate_user_token(user.id, USER_TOKEN_TTL_SECS, now)?;

    Ok(Json(AuthResponse { user: UserView::from(&user), token, expires_at }))
}

pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserView>, CamelotError> {
    let claims = bearer_user_claims(&state, &headers)?;
    let user = state.store.get_user(claims.user_id).await?;
    Ok(Json(UserView::from(&user)))
}
