//! Runtime configuration endpoints

use axum::{Json, body::Bytes, extract::State};
use serde_json::Value;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};
use crate::config::RuntimeConfigView;

/// GET /api/config
pub async fn get_config(State(state): State<ApiState>) -> Json<RuntimeConfigView> {
    Json(state.watcher.runtime_config().await)
}

/// POST /api/config
///
/// Validates, persists and applies the update; the monitor picks it up
/// on its next cycle.
pub async fn update_config(
    State(state): State<ApiState>,
    body: Bytes,
) -> ApiResult<Json<RuntimeConfigView>> {
    let payload: Value = serde_json::from_slice(&body)
        .map_err(|_| ApiError::InvalidRequest("Expected JSON body.".to_string()))?;

    let view = state.watcher.update_runtime_config(&payload).await?;
    Ok(Json(view))
}
