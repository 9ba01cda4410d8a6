//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::HealthResponse};

/// GET /api/health
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let storage = state.watcher.storage_health().await?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage,
    }))
}
