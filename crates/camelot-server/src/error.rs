//! `CamelotError`: the top-level error type unifying every sub-crate's
//! error surface (§7's taxonomy), with one `IntoResponse` impl per kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use camelot_store::StoreError;
use camelot_token::TokenError;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum CamelotError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Hub(#[from] camelot_hub::HubError),
    #[error("{0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("not the host")]
    NotHost,
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for CamelotError {
    fn into_response(self) -> Response {
        if let CamelotError::RateLimited { retry_after_secs } = &self {
            let retry_after_secs = *retry_after_secs;
            let message = self.to_string();
            let mut response =
                (StatusCode::TOO_MANY_REQUESTS, axum::Json(ErrorBody { message })).into_response();
            if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(axum::http::header::RETRY_AFTER, value);
            }
            return response;
        }

        let (status, message) = match &self {
            CamelotError::Store(err) => store_status(err),
            CamelotError::Token(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            CamelotError::Hub(_) => {
                tracing::error!(error = %self, "hub unavailable");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            CamelotError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            CamelotError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            CamelotError::NotHost => (StatusCode::FORBIDDEN, self.to_string()),
            CamelotError::RateLimited { .. } => unreachable!(),
        };
        (status, axum::Json(ErrorBody { message })).into_response()
    }
}

/// Maps the Store's closed error set onto §7's taxonomy. `Internal` is
/// logged with full detail server-side and reported to the caller as a
/// bare 500 with no payload leakage.
fn store_status(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::RoomNotFound => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::NotInRoom | StoreError::UserNotInRoom => (StatusCode::FORBIDDEN, err.to_string()),
        StoreError::EmailExists | StoreError::NameTaken => (StatusCode::CONFLICT, err.to_string()),
        StoreError::InvalidPassword | StoreError::PasswordRequired => {
            (StatusCode::UNAUTHORIZED, err.to_string())
        }
        StoreError::RoomHasNoPlayers => (StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::Internal(source) => {
            tracing::error!(error = %source, "store error");
            (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
        }
    }
}
