//! In-memory "current status" record
//!
//! Only the monitor writes it; API handlers read copies of it. One lock
//! guards all three fields, so a reader never sees fields from two
//! different cycles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// Copy of the current status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// `None` until the first cycle completes
    pub up: Option<bool>,

    /// Time of the most recent probe cycle
    pub last_check: Option<DateTime<Utc>>,

    /// Time of the most recent up/down transition
    pub last_change: Option<DateTime<Utc>>,
}

/// Mutex-guarded status record
#[derive(Debug, Default)]
pub struct StatusState {
    inner: Mutex<StatusSnapshot>,
}

impl StatusState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy out the current snapshot
    pub async fn read(&self) -> StatusSnapshot {
        *self.inner.lock().await
    }

    /// Set `up` and `last_check`; set `last_change` only when given
    pub async fn update(
        &self,
        up: bool,
        check_time: DateTime<Utc>,
        change_time: Option<DateTime<Utc>>,
    ) {
        let mut snapshot = self.inner.lock().await;
        snapshot.up = Some(up);
        snapshot.last_check = Some(check_time);
        if let Some(change_time) = change_time {
            snapshot.last_change = Some(change_time);
        }
    }
}
