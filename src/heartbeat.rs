//! Periodic occupancy renewal.
//!
//! While the workload runs, a background task re-marks the resource as held
//! so the replica record never crosses the staleness threshold. The task is
//! owned by the returned handle and signalled over a watch channel; stopping
//! takes effect as soon as the current renewal finishes, not after a full
//! interval.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to a running renewal task.
///
/// Dropping the handle stops the task as well, since the shutdown channel
/// closes with it.
#[derive(Debug)]
pub struct HeartbeatTask {
    shutdown: watch::Sender<bool>,
    worker: Option<JoinHandle<()>>,
}

impl HeartbeatTask {
    /// Spawn the renewal loop: `renew` runs immediately, then once per
    /// `interval` until [`stop`](Self::stop) is called.
    pub fn spawn<F, Fut>(interval: Duration, renew: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let (shutdown, mut stopped) = watch::channel(false);
        let worker = tokio::spawn(async move {
            loop {
                renew().await;
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    // Err means the handle was dropped; stop either way
                    _ = stopped.changed() => break,
                }
            }
            debug!("Heartbeat task stopped");
        });
        Self {
            shutdown,
            worker: Some(worker),
        }
    }

    /// Stop the task and wait for it to finish. Idempotent: repeated calls,
    /// or a call racing the task's own exit, are no-ops.
    pub async fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                warn!("Heartbeat task ended abnormally: {}", e);
            }
        }
    }
}
