//! `GET /healthz` (§4.7): a true liveness probe rather than a bare "process
//! is up" — it checks the database pool the way a load balancer would want
//! to know before routing traffic here.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn healthz(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    match sqlx::query("SELECT 1").execute(state.store.pool()).await {
        Ok(_) => Ok(Json(HealthResponse { status: "ok" })),
        Err(err) => {
            tracing::error!(%err, "healthz: database unreachable");
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(HealthResponse { status: "unavailable" })))
        }
    }
}
