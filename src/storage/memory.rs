//! In-memory storage backend (no persistence)
//!
//! Implements the same contract as the SQLite backend on plain vectors.
//! It's useful for:
//! - Running without the `storage-sqlite` feature
//! - Exercising the monitor in tests without touching the filesystem
//!
//! All data is lost on restart.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::backend::{HealthStatus, StorageBackend};
use super::error::StorageResult;
use super::schema::{DowntimeRow, StatusSample, UptimeStats, to_storage_precision};

#[derive(Debug, Default)]
struct Tables {
    downtime: Vec<DowntimeRow>,
    status_log: Vec<StatusSample>,
    next_id: i64,
}

impl Tables {
    /// Index of the newest open row (same ordering as the SQL query)
    fn open_index(&self) -> Option<usize> {
        self.downtime
            .iter()
            .enumerate()
            .filter(|(_, row)| row.is_open())
            .max_by_key(|(_, row)| (row.started_at, row.id))
            .map(|(index, _)| index)
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every downtime row, open or closed, in insertion order
    pub fn all_downtimes(&self) -> Vec<DowntimeRow> {
        self.lock().downtime.clone()
    }

    /// Every sample in insertion order
    pub fn all_samples(&self) -> Vec<StatusSample> {
        self.lock().status_log.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Writes are single push/assignment steps; a poisoned lock still
        // guards consistent tables.
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn initialize(&self) -> StorageResult<()> {
        debug!("in-memory backend: nothing to initialize");
        Ok(())
    }

    async fn record_down(&self, at: DateTime<Utc>) -> StorageResult<DowntimeRow> {
        let at = to_storage_precision(at);
        let mut tables = self.lock();

        tables.next_id += 1;
        let row = DowntimeRow {
            id: tables.next_id,
            started_at: at,
            ended_at: None,
            created_at: at,
        };
        tables.downtime.push(row.clone());

        Ok(row)
    }

    async fn record_up(&self, at: DateTime<Utc>) -> StorageResult<Option<DowntimeRow>> {
        let at = to_storage_precision(at);
        let mut tables = self.lock();

        let Some(index) = tables.open_index() else {
            return Ok(None);
        };

        let row = &mut tables.downtime[index];
        row.ended_at = Some(at);
        Ok(Some(row.clone()))
    }

    async fn log_status(&self, up: bool, at: DateTime<Utc>) -> StorageResult<StatusSample> {
        let sample = StatusSample {
            at: to_storage_precision(at),
            up,
        };
        self.lock().status_log.push(sample);
        Ok(sample)
    }

    async fn recent_downtimes(&self, limit: usize) -> StorageResult<Vec<DowntimeRow>> {
        let tables = self.lock();

        let mut closed: Vec<DowntimeRow> = tables
            .downtime
            .iter()
            .filter(|row| !row.is_open())
            .cloned()
            .collect();
        closed.sort_by(|a, b| (b.started_at, b.id).cmp(&(a.started_at, a.id)));
        closed.truncate(limit);

        Ok(closed)
    }

    async fn current_downtime(&self) -> StorageResult<Option<DowntimeRow>> {
        let tables = self.lock();
        Ok(tables.open_index().map(|index| tables.downtime[index].clone()))
    }

    async fn uptime_stats(
        &self,
        since: DateTime<Utc>,
        poll_interval_secs: u64,
    ) -> StorageResult<UptimeStats> {
        let tables = self.lock();
        let since = to_storage_precision(since);

        let (samples, up_samples) = tables
            .status_log
            .iter()
            .filter(|sample| sample.at >= since)
            .fold((0u64, 0u64), |(total, up), sample| {
                (total + 1, up + u64::from(sample.up))
            });

        Ok(UptimeStats::from_counts(
            samples,
            up_samples,
            poll_interval_secs,
        ))
    }

    async fn last_status_sample(&self) -> StorageResult<Option<StatusSample>> {
        let tables = self.lock();
        // Later insert wins on equal timestamps, like `ORDER BY at DESC, id DESC`
        Ok(tables
            .status_log
            .iter()
            .enumerate()
            .max_by_key(|(index, sample)| (sample.at, *index))
            .map(|(_, sample)| *sample))
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let tables = self.lock();
        Ok(HealthStatus {
            healthy: true,
            message: format!(
                "In-memory storage operational ({} downtimes, {} samples)",
                tables.downtime.len(),
                tables.status_log.len()
            ),
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
