//! Query facade over the status record, storage and runtime config
//!
//! [`Watcher`] is what the HTTP layer and the binary hold. Clones share
//! the same state.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ConfigResult, RuntimeConfig, RuntimeConfigStore, RuntimeConfigView};
use crate::monitor::{CycleReport, MonitorHandle};
use crate::probe::Probe;
use crate::status::{StatusSnapshot, StatusState};
use crate::storage::schema::STATS_WINDOW_HOURS;
use crate::storage::{
    DowntimeRow, HealthStatus, StatusSample, StorageBackend, StorageResult, UptimeStats,
};

#[derive(Clone)]
pub struct Watcher {
    status: Arc<StatusState>,
    storage: Arc<dyn StorageBackend>,
    config: Arc<RuntimeConfigStore>,
    monitor: Arc<Mutex<Option<MonitorHandle>>>,
}

impl Watcher {
    pub fn new(storage: Arc<dyn StorageBackend>, config: RuntimeConfigStore) -> Self {
        Self {
            status: Arc::new(StatusState::new()),
            storage,
            config: Arc::new(config),
            monitor: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn get_status(&self) -> StatusSnapshot {
        self.status.read().await
    }

    pub async fn get_current_downtime(&self) -> StorageResult<Option<DowntimeRow>> {
        self.storage.current_downtime().await
    }

    pub async fn get_last_status_sample(&self) -> StorageResult<Option<StatusSample>> {
        self.storage.last_status_sample().await
    }

    /// Stats over the last 24 hours, weighted by the current poll interval
    pub async fn get_uptime_stats(&self) -> StorageResult<UptimeStats> {
        let since = Utc::now() - Duration::hours(STATS_WINDOW_HOURS);
        let poll_interval = self.config.snapshot().await.poll_interval;
        self.storage.uptime_stats(since, poll_interval).await
    }

    /// Closed downtime intervals, newest first
    pub async fn get_recent_downtimes(&self, limit: usize) -> StorageResult<Vec<DowntimeRow>> {
        self.storage.recent_downtimes(limit).await
    }

    /// Spawn the monitor loop
    ///
    /// Storage is initialized by the loop before its first cycle. Only one
    /// monitor may run per watcher; a second call fails.
    pub fn start_monitor(&self, probe: Arc<dyn Probe>) -> Result<JoinHandle<Result<()>>> {
        let mut slot = self
            .monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if slot.as_ref().is_some_and(MonitorHandle::is_running) {
            bail!("monitor already started");
        }

        let (handle, task) = MonitorHandle::spawn(
            probe,
            self.storage.clone(),
            self.status.clone(),
            self.config.clone(),
        );
        *slot = Some(handle);

        info!("monitor started");
        Ok(task)
    }

    /// Handle of the running monitor, if any
    pub fn monitor(&self) -> Option<MonitorHandle> {
        self.monitor
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Run a cycle immediately on the running monitor
    pub async fn check_now(&self) -> Result<CycleReport> {
        let monitor = self.monitor().context("monitor not started")?;
        monitor.check_now().await
    }

    pub async fn runtime_config(&self) -> RuntimeConfigView {
        self.config.view().await
    }

    pub async fn runtime_config_snapshot(&self) -> RuntimeConfig {
        self.config.snapshot().await
    }

    /// Validate, persist and commit a config update, then wake the monitor
    pub async fn update_runtime_config(&self, payload: &Value) -> ConfigResult<RuntimeConfigView> {
        let view = self.config.update(payload, true).await?;

        match self.monitor() {
            Some(monitor) => {
                if let Err(e) = monitor.config_changed().await {
                    warn!("monitor did not take the config change: {e:#}");
                }
            }
            None => debug!("no monitor running, config applies on start"),
        }

        Ok(view)
    }

    pub async fn storage_health(&self) -> StorageResult<HealthStatus> {
        self.storage.health_check().await
    }

    pub async fn close(&self) -> StorageResult<()> {
        self.storage.close().await
    }
}
