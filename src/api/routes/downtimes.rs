//! Downtime history endpoint

use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{DowntimesQuery, DowntimesResponse},
};
use crate::config::coerce_int;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: u64 = 1000;

/// GET /api/downtimes?limit=N
///
/// Closed intervals only, newest first
pub async fn get_downtimes(
    State(state): State<ApiState>,
    Query(query): Query<DowntimesQuery>,
) -> ApiResult<Json<DowntimesResponse>> {
    let limit = match query.limit {
        Some(raw) => coerce_int(&Value::String(raw), "limit", 1, MAX_LIMIT)? as usize,
        None => DEFAULT_LIMIT,
    };

    let downtimes = state.watcher.get_recent_downtimes(limit).await?;
    Ok(Json(DowntimesResponse { downtimes }))
}
