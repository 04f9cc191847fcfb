//! Status and health handlers.

use axum::{Json, extract::State};

use super::super::types::{HealthResponse, StatusResponse};
use super::super::{AppError, SharedState};

/// GET /status - Cached row count and last refresh time.
pub(crate) async fn status(
    State(state): State<SharedState>,
) -> Result<Json<StatusResponse>, AppError> {
    let total_countries = state.store.count().await?;
    let status = state.store.status().await?;
    Ok(Json(StatusResponse {
        total_countries,
        last_refreshed_at: status.last_refreshed_at,
    }))
}

/// GET /health - Liveness check.
pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}
