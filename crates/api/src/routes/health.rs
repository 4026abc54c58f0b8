//! Liveness probe for load balancers and the frontend's status badge.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `"ok"` when Postgres answers, `"degraded"` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
}

/// GET /health
///
/// Always answers 200 so a slow database does not take the process out of
/// rotation; callers read `db_healthy` instead.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match ecosort_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database unreachable from health check");
            false
        }
    };

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
    })
}

/// `/health`, mounted beside `/api/v1` rather than inside it.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
