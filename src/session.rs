//! One agent session: check occupancy, acquire, run the workload, release.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::heartbeat::HeartbeatTask;
use crate::workload::WorkloadSpec;
use crate::Result;

pub struct Session {
    coordinator: Arc<Coordinator>,
    workload: WorkloadSpec,
    identity: String,
    /// Zero disables the heartbeat (and with it, staleness checking).
    heartbeat_interval: Duration,
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Someone else holds the resource; the workload was not launched.
    Occupied(String),
    /// The workload ran here and the occupancy was released.
    Ran,
}

impl Session {
    pub fn new(
        coordinator: Arc<Coordinator>,
        workload: WorkloadSpec,
        identity: String,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            coordinator,
            workload,
            identity,
            heartbeat_interval,
        }
    }

    /// A replica record is fresh while at most two renewal intervals old.
    pub fn staleness_threshold(&self) -> Duration {
        self.heartbeat_interval * 2
    }

    pub async fn run(self) -> Result<SessionOutcome> {
        if let Some(holder) = self
            .coordinator
            .is_someone_running(self.staleness_threshold())
            .await?
        {
            info!("Server is already running at {}", holder);
            return Ok(SessionOutcome::Occupied(holder));
        }

        info!("Server is not running, starting as {}", self.identity);
        self.coordinator.mark_running(&self.identity).await?;

        let mut child = match self.workload.spawn() {
            Ok(child) => child,
            Err(e) => {
                // Launch never happened; leave the slot as we found it
                self.coordinator.mark_stopped().await;
                return Err(e);
            }
        };

        let mut heartbeat = (!self.heartbeat_interval.is_zero()).then(|| {
            let coordinator = self.coordinator.clone();
            let identity = self.identity.clone();
            HeartbeatTask::spawn(self.heartbeat_interval, move || {
                let coordinator = coordinator.clone();
                let identity = identity.clone();
                async move {
                    if let Err(e) = coordinator.mark_running(&identity).await {
                        warn!("Heartbeat renewal failed: {}", e);
                    }
                }
            })
        });

        tokio::select! {
            status = child.wait() => {
                if let Some(mut heartbeat) = heartbeat.take() {
                    heartbeat.stop().await;
                }
                match status {
                    Ok(status) => info!("Workload exited with {}", status),
                    Err(e) => warn!("Could not collect the workload's exit status: {}", e),
                }
                info!("Updating authority and replica store");
                self.coordinator.mark_stopped().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupt received, shutting the workload down");
                if let Some(mut heartbeat) = heartbeat.take() {
                    heartbeat.stop().await;
                }
                if let Err(e) = child.kill().await {
                    warn!("Could not kill the workload: {}", e);
                }
                self.release_if_ours().await?;
            }
        }

        Ok(SessionOutcome::Ran)
    }

    // After an interrupt the record may already belong to someone else (we
    // may have lost an acquisition race). Only clear it when it names us;
    // staleness is ignored so even an old record of ours is recognised.
    async fn release_if_ours(&self) -> Result<()> {
        let holder = self.coordinator.is_someone_running(Duration::ZERO).await?;
        if holder.as_deref() == Some(self.identity.as_str()) {
            info!("We were the holder, marking as stopped");
            self.coordinator.mark_stopped().await;
        } else if let Some(holder) = holder {
            info!("Leaving the record in place, {} is the holder", holder);
        }
        Ok(())
    }
}
