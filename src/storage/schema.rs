//! Row types for the two tables the watcher keeps
//!
//! ## Tables
//!
//! - `downtime` - one row per outage. `ended_at` stays `NULL` while the
//!   outage is ongoing; at most one such row exists at a time.
//! - `status_log` - one row per probe cycle, append-only.
//!
//! Timestamps are stored as UTC epoch milliseconds. Anything handed to a
//! backend is truncated to millisecond precision first (see
//! [`to_storage_precision`]) so the value a write returns is exactly the
//! value a later read produces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Window covered by [`UptimeStats`]
pub const STATS_WINDOW_HOURS: i64 = 24;

/// One outage interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DowntimeRow {
    pub id: i64,

    /// When the transition to "down" was detected
    pub started_at: DateTime<Utc>,

    /// When the transition back to "up" was detected (`None` while open)
    pub ended_at: Option<DateTime<Utc>>,

    /// When the row was written (same instant as `started_at`)
    pub created_at: DateTime<Utc>,
}

impl DowntimeRow {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Length of a closed interval in whole seconds
    pub fn duration_seconds(&self) -> Option<i64> {
        self.ended_at
            .map(|ended| (ended - self.started_at).num_seconds())
    }
}

/// One probe cycle result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSample {
    pub at: DateTime<Utc>,
    pub up: bool,
}

/// Aggregate over the recent sample log
///
/// `downtime_seconds` is an approximation: every "down" sample is counted
/// as one full poll interval, so it drifts whenever cycles take longer
/// than the configured interval (slow probe timeouts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UptimeStats {
    /// Percentage of "up" samples, rounded to 2 decimal places
    pub uptime_pct: Option<f64>,

    /// Number of samples in the window
    pub samples: u64,

    /// Down samples times the poll interval
    pub downtime_seconds: Option<u64>,
}

impl UptimeStats {
    /// The result for a window without samples
    pub fn no_data() -> Self {
        Self {
            uptime_pct: None,
            samples: 0,
            downtime_seconds: None,
        }
    }

    /// Build the aggregate from raw counts
    pub fn from_counts(samples: u64, up_samples: u64, poll_interval_secs: u64) -> Self {
        if samples == 0 {
            return Self::no_data();
        }

        let down_samples = samples.saturating_sub(up_samples);
        let pct = up_samples as f64 / samples as f64 * 100.0;

        Self {
            uptime_pct: Some((pct * 100.0).round() / 100.0),
            samples,
            downtime_seconds: Some(down_samples * poll_interval_secs),
        }
    }
}

/// Truncate a timestamp to the precision the database keeps
pub fn to_storage_precision(at: DateTime<Utc>) -> DateTime<Utc> {
    millis_to_timestamp(timestamp_to_millis(&at))
}

/// Convert a timestamp to Unix milliseconds for storage
pub fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

/// Convert stored Unix milliseconds back to a timestamp
pub fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}
