//! MonitorActor - runs the probe cycle on a timer
//!
//! ## Message Flow
//!
//! ```text
//! Timer → run_cycle → [StorageBackend, StatusState]
//!   ↑
//!   └─── Commands (CheckNow, ConfigChanged)
//! ```
//!
//! There is no shutdown command: the actor lives as long as the process.
//! Dropping every [`MonitorHandle`] only stops command delivery; the timer
//! keeps running.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::config::RuntimeConfigStore;
use crate::probe::{self, Probe};
use crate::status::{StatusSnapshot, StatusState};
use crate::storage::schema::to_storage_precision;
use crate::storage::{DowntimeRow, StorageBackend, StorageResult};

use super::transition::{Transition, plan_cycle};

/// Result of one completed cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub up: bool,
    pub transition: Transition,
    pub at: DateTime<Utc>,

    /// Row opened (went down) or closed (came up) by this cycle
    pub downtime: Option<DowntimeRow>,

    /// Status committed by this cycle
    pub status: StatusSnapshot,
}

#[derive(Debug)]
pub enum MonitorCommand {
    /// Run a cycle immediately and report it
    CheckNow {
        respond_to: oneshot::Sender<Result<CycleReport>>,
    },

    /// Runtime configuration changed; restart the current sleep
    ConfigChanged,
}

pub struct MonitorActor {
    probe: Arc<dyn Probe>,
    storage: Arc<dyn StorageBackend>,
    status: Arc<StatusState>,
    config: Arc<RuntimeConfigStore>,
    command_rx: mpsc::Receiver<MonitorCommand>,
}

impl MonitorActor {
    pub fn new(
        probe: Arc<dyn Probe>,
        storage: Arc<dyn StorageBackend>,
        status: Arc<StatusState>,
        config: Arc<RuntimeConfigStore>,
        command_rx: mpsc::Receiver<MonitorCommand>,
    ) -> Self {
        Self {
            probe,
            storage,
            status,
            config,
            command_rx,
        }
    }

    /// Run the actor's main loop
    ///
    /// Returns only when a cycle fails to write to storage.
    #[instrument(skip(self))]
    pub async fn run(mut self) -> Result<()> {
        debug!("starting monitor actor");

        self.storage
            .initialize()
            .await
            .context("failed to initialize storage")?;

        let mut commands_open = true;

        loop {
            self.run_cycle().await.context("monitor cycle failed")?;

            let pause = sleep(self.config.snapshot().await.poll_interval());
            tokio::pin!(pause);

            loop {
                tokio::select! {
                    _ = &mut pause => break,

                    cmd = self.command_rx.recv(), if commands_open => match cmd {
                        Some(MonitorCommand::CheckNow { respond_to }) => {
                            debug!("received CheckNow command");
                            match self.run_cycle().await {
                                Ok(report) => {
                                    let _ = respond_to.send(Ok(report));
                                }
                                Err(e) => {
                                    let _ = respond_to.send(Err(anyhow!("monitor cycle failed: {e}")));
                                    return Err(e).context("monitor cycle failed");
                                }
                            }
                            let interval = self.config.snapshot().await.poll_interval();
                            pause.as_mut().reset(Instant::now() + interval);
                        }

                        Some(MonitorCommand::ConfigChanged) => {
                            // only ever bring the due cycle forward
                            let interval = self.config.snapshot().await.poll_interval();
                            let deadline = (Instant::now() + interval).min(pause.deadline());
                            debug!(
                                "config changed, next cycle in {:?}",
                                deadline.saturating_duration_since(Instant::now())
                            );
                            pause.as_mut().reset(deadline);
                        }

                        None => {
                            debug!("command channel closed, continuing on timer only");
                            commands_open = false;
                        }
                    },
                }
            }
        }
    }

    /// Probe, record and commit one cycle
    ///
    /// Storage errors are returned before the status snapshot is touched.
    #[instrument(skip(self))]
    async fn run_cycle(&self) -> StorageResult<CycleReport> {
        let config = self.config.snapshot().await;
        let up = probe::resolve(self.probe.as_ref(), &config.targets, config.ping_timeout()).await;
        let now = to_storage_precision(Utc::now());

        let previous = self.status.read().await;
        let plan = plan_cycle(&previous, up, now);

        let downtime = match plan.transition {
            Transition::WentDown => {
                let row = self.storage.record_down(now).await?;
                warn!("network went down at {now}");
                Some(row)
            }
            Transition::CameUp => {
                let row = self.storage.record_up(now).await?;
                match row.as_ref().and_then(DowntimeRow::duration_seconds) {
                    Some(secs) => info!("network back up at {now} after {secs}s"),
                    None => info!("network back up at {now}"),
                }
                row
            }
            Transition::Initial => {
                info!("initial status: {}", if up { "up" } else { "down" });
                None
            }
            Transition::Steady => None,
        };

        self.storage.log_status(up, now).await?;

        self.status
            .update(up, now, plan.transition.is_change().then_some(now))
            .await;

        debug!("cycle complete: up = {up}");

        Ok(CycleReport {
            up,
            transition: plan.transition,
            at: now,
            downtime,
            status: plan.next,
        })
    }
}

/// Handle for sending commands to a running [`MonitorActor`]
#[derive(Clone)]
pub struct MonitorHandle {
    sender: mpsc::Sender<MonitorCommand>,
}

impl MonitorHandle {
    /// Spawn the actor; the join handle resolves only if the loop fails
    pub fn spawn(
        probe: Arc<dyn Probe>,
        storage: Arc<dyn StorageBackend>,
        status: Arc<StatusState>,
        config: Arc<RuntimeConfigStore>,
    ) -> (Self, JoinHandle<Result<()>>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = MonitorActor::new(probe, storage, status, config, cmd_rx);
        let task = tokio::spawn(actor.run());

        (Self { sender: cmd_tx }, task)
    }

    /// Run a cycle now, bypassing the timer
    pub async fn check_now(&self) -> Result<CycleReport> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(MonitorCommand::CheckNow { respond_to: tx })
            .await
            .context("failed to send CheckNow command")?;

        rx.await.context("failed to receive response")?
    }

    /// Tell the actor the runtime configuration changed
    pub async fn config_changed(&self) -> Result<()> {
        self.sender
            .send(MonitorCommand::ConfigChanged)
            .await
            .context("failed to send ConfigChanged command")?;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}
