//! Uptime statistics endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState};
use crate::storage::UptimeStats;

/// GET /api/stats
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<UptimeStats>> {
    Ok(Json(state.watcher.get_uptime_stats().await?))
}
