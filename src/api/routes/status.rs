//! Current status endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::StatusResponse};

/// GET /api/status
///
/// In-memory status plus the open downtime and the newest sample
pub async fn get_status(State(state): State<ApiState>) -> ApiResult<Json<StatusResponse>> {
    let status = state.watcher.get_status().await;
    let current_downtime = state.watcher.get_current_downtime().await?;
    let last_sample = state.watcher.get_last_status_sample().await?;

    Ok(Json(StatusResponse {
        up: status.up,
        last_check: status.last_check,
        last_change: status.last_change,
        current_downtime,
        last_sample,
    }))
}
