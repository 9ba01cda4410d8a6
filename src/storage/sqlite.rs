//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `StorageBackend` trait.
//!
//! ## Features
//!
//! - **Embedded**: a single database file, created (with its parent
//!   directory) on first use
//! - **WAL mode**: API reads proceed while the monitor writes
//! - **Connection pooling**: small pool shared by the monitor and API
//! - **Migrations**: schema managed by embedded sqlx migrations

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, trace, warn};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{
    DowntimeRow, StatusSample, UptimeStats, millis_to_timestamp, timestamp_to_millis,
    to_storage_precision,
};

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Open the database and make sure the schema exists
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use heimdall::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./data/heimdall.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let backend = Self::connect(db_path).await?;
        backend.initialize().await?;
        Ok(backend)
    }

    /// Open the database without touching the schema
    ///
    /// The file and its parent directory are created when missing.
    #[instrument(skip_all)]
    pub async fn connect(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        info!("opening SQLite database at {}", db_path.display());

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("SQLite connection pool created");

        Ok(Self { pool, db_path })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn downtime_from_row(row: &SqliteRow) -> StorageResult<DowntimeRow> {
        Ok(DowntimeRow {
            id: row.try_get("id")?,
            started_at: millis_to_timestamp(row.try_get("started_at")?),
            ended_at: row
                .try_get::<Option<i64>, _>("ended_at")?
                .map(millis_to_timestamp),
            created_at: millis_to_timestamp(row.try_get("created_at")?),
        })
    }

    fn sample_from_row(row: &SqliteRow) -> StorageResult<StatusSample> {
        Ok(StatusSample {
            at: millis_to_timestamp(row.try_get("at")?),
            up: row.try_get("up")?,
        })
    }
}

#[async_trait]
impl StorageBackend for SqliteBackend {
    #[instrument(skip(self))]
    async fn initialize(&self) -> StorageResult<()> {
        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database schema ready");
        Ok(())
    }

    #[instrument(skip(self), fields(at = %at))]
    async fn record_down(&self, at: DateTime<Utc>) -> StorageResult<DowntimeRow> {
        let at = to_storage_precision(at);
        let millis = timestamp_to_millis(&at);

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO downtime (started_at, ended_at, created_at) VALUES (?, NULL, ?)",
        )
        .bind(millis)
        .bind(millis)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let row = DowntimeRow {
            id: result.last_insert_rowid(),
            started_at: at,
            ended_at: None,
            created_at: at,
        };
        debug!("opened downtime #{}", row.id);
        Ok(row)
    }

    #[instrument(skip(self), fields(at = %at))]
    async fn record_up(&self, at: DateTime<Utc>) -> StorageResult<Option<DowntimeRow>> {
        let at = to_storage_precision(at);

        let mut tx = self.pool.begin().await?;

        let open = sqlx::query(
            r#"
            SELECT id, started_at, ended_at, created_at
            FROM downtime
            WHERE ended_at IS NULL
            ORDER BY started_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?;

        let Some(open) = open else {
            tx.rollback().await?;
            trace!("no open downtime to close");
            return Ok(None);
        };

        let mut downtime = Self::downtime_from_row(&open)?;

        sqlx::query("UPDATE downtime SET ended_at = ? WHERE id = ?")
            .bind(timestamp_to_millis(&at))
            .bind(downtime.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        downtime.ended_at = Some(at);
        debug!("closed downtime #{}", downtime.id);
        Ok(Some(downtime))
    }

    #[instrument(skip(self), fields(at = %at))]
    async fn log_status(&self, up: bool, at: DateTime<Utc>) -> StorageResult<StatusSample> {
        let at = to_storage_precision(at);

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO status_log (at, up) VALUES (?, ?)")
            .bind(timestamp_to_millis(&at))
            .bind(up)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(StatusSample { at, up })
    }

    #[instrument(skip(self))]
    async fn recent_downtimes(&self, limit: usize) -> StorageResult<Vec<DowntimeRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, started_at, ended_at, created_at
            FROM downtime
            WHERE ended_at IS NOT NULL
            ORDER BY started_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::downtime_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn current_downtime(&self) -> StorageResult<Option<DowntimeRow>> {
        let row = sqlx::query(
            r#"
            SELECT id, started_at, ended_at, created_at
            FROM downtime
            WHERE ended_at IS NULL
            ORDER BY started_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::downtime_from_row).transpose()
    }

    #[instrument(skip(self), fields(since = %since))]
    async fn uptime_stats(
        &self,
        since: DateTime<Utc>,
        poll_interval_secs: u64,
    ) -> StorageResult<UptimeStats> {
        let (samples, up_samples): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(up), 0) FROM status_log WHERE at >= ?",
        )
        .bind(timestamp_to_millis(&since))
        .fetch_one(&self.pool)
        .await?;

        trace!("{up_samples}/{samples} samples up since {since}");

        Ok(UptimeStats::from_counts(
            samples.max(0) as u64,
            up_samples.max(0) as u64,
            poll_interval_secs,
        ))
    }

    #[instrument(skip(self))]
    async fn last_status_sample(&self) -> StorageResult<Option<StatusSample>> {
        let row = sqlx::query("SELECT at, up FROM status_log ORDER BY at DESC, id DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::sample_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: format!("SQLite backend operational ({})", self.db_path.display()),
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
