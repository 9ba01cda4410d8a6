//! Storage backend trait definition
//!
//! This module defines the `StorageBackend` trait the monitor writes
//! through and the query facade reads through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageResult;
use super::schema::{DowntimeRow, StatusSample, UptimeStats};

/// Health status of the storage backend
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,
}

/// Trait for downtime/sample storage
///
/// Writes take the instant explicitly; the monitor passes the time of
/// the probe cycle, tests pass fixed instants.
///
/// ## Atomicity
///
/// Every write is a single transaction. On failure nothing of that write
/// is visible. Separate writes are not atomic with each other.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the monitor task writes while
/// any number of API requests read.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Create tables and indexes if they are missing (idempotent)
    async fn initialize(&self) -> StorageResult<()>;

    /// Open a new downtime interval starting at `at`
    ///
    /// Does not check for an already-open interval. The monitor calls this
    /// only on an up→down transition, which keeps at most one row open.
    async fn record_down(&self, at: DateTime<Utc>) -> StorageResult<DowntimeRow>;

    /// Close the most recent open interval at `at`
    ///
    /// Returns the closed row, or `None` (and changes nothing) when no
    /// interval is open.
    async fn record_up(&self, at: DateTime<Utc>) -> StorageResult<Option<DowntimeRow>>;

    /// Append one sample to the status log
    async fn log_status(&self, up: bool, at: DateTime<Utc>) -> StorageResult<StatusSample>;

    /// Closed intervals, newest first by `started_at`, at most `limit`
    async fn recent_downtimes(&self, limit: usize) -> StorageResult<Vec<DowntimeRow>>;

    /// The open interval, if any
    async fn current_downtime(&self) -> StorageResult<Option<DowntimeRow>>;

    /// Aggregate over samples taken at or after `since`
    async fn uptime_stats(
        &self,
        since: DateTime<Utc>,
        poll_interval_secs: u64,
    ) -> StorageResult<UptimeStats>;

    /// The most recent sample
    async fn last_status_sample(&self) -> StorageResult<Option<StatusSample>>;

    /// Lightweight liveness check
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Release connections
    async fn close(&self) -> StorageResult<()>;
}
