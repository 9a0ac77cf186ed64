//! Authority-side occupancy registry.
//!
//! A single slot guarded by one async mutex: every query, acquire and release
//! runs as an atomic unit against the in-memory record, so no request ever
//! observes a half-applied transition. The record is mirrored to a local file
//! so a restarted authority can pick the last known holder back up; the
//! mirror is advisory and its absence means vacant.

use std::fs;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{Error, Result};

#[derive(Debug)]
pub struct Registry {
    slot: Mutex<Option<String>>,
    mirror: PathBuf,
}

impl Registry {
    /// Open the registry, recovering the last holder from the mirror file
    /// when one is present.
    pub fn open(mirror: PathBuf) -> Self {
        let holder = match fs::read_to_string(&mirror) {
            Ok(contents) => contents
                .lines()
                .next()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Cannot read state file {:?}: {}", mirror, e);
                None
            }
        };
        if let Some(ref identity) = holder {
            info!("Recovered occupancy state: held by {}", identity);
        }
        Self {
            slot: Mutex::new(holder),
            mirror,
        }
    }

    pub async fn query(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    /// Set the holder. Fails with [`Error::AlreadyRunning`] if the slot is
    /// taken, leaving the record untouched.
    pub async fn acquire(&self, identity: &str) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if let Some(holder) = slot.as_ref() {
            return Err(Error::AlreadyRunning {
                holder: holder.clone(),
            });
        }
        *slot = Some(identity.to_string());
        if let Err(e) = fs::write(&self.mirror, format!("{identity}\n")) {
            warn!("Cannot write state file {:?}: {}", self.mirror, e);
        }
        info!("Occupancy acquired by {}", identity);
        Ok(())
    }

    /// Clear the holder. Idempotent: releasing a vacant slot is a no-op.
    pub async fn release(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(holder) = slot.take() {
            info!("Occupancy released by {}", holder);
        } else {
            debug!("Release on a vacant slot");
        }
        match fs::remove_file(&self.mirror) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Cannot remove state file {:?}: {}", self.mirror, e),
        }
    }
}
