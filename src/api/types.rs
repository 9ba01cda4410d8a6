//! API response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{DowntimeRow, HealthStatus, StatusSample};

/// GET /api/status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusResponse {
    pub up: Option<bool>,
    pub last_check: Option<DateTime<Utc>>,
    pub last_change: Option<DateTime<Utc>>,
    pub current_downtime: Option<DowntimeRow>,
    pub last_sample: Option<StatusSample>,
}

/// GET /api/downtimes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DowntimesResponse {
    pub downtimes: Vec<DowntimeRow>,
}

/// Query parameters for GET /api/downtimes
///
/// `limit` stays a string so malformed values get a JSON error body.
#[derive(Debug, Default, Deserialize)]
pub struct DowntimesQuery {
    pub limit: Option<String>,
}

/// GET /api/info
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InfoResponse {
    pub ping_target: Option<String>,
    pub lan_ip: String,
    pub port: u16,
}

/// GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: HealthStatus,
}
