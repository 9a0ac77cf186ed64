//! In-process doubles for exercising the coordination protocol.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::authority::{Authority, AuthorityStatus};
use crate::{Error, Result};

/// Authority double backed by a plain slot. Flip `reachable` off to simulate
/// an outage: every call then reports [`AuthorityStatus::Unavailable`] or an
/// IO error, as the real client does.
#[derive(Debug)]
pub struct MockAuthority {
    slot: Mutex<Option<String>>,
    reachable: AtomicBool,
}

impl Default for MockAuthority {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthority {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            reachable: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn holding(identity: &str) -> Self {
        Self {
            slot: Mutex::new(Some(identity.to_string())),
            reachable: AtomicBool::new(true),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub async fn holder(&self) -> Option<String> {
        self.slot.lock().await.clone()
    }

    fn offline_error(&self) -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "authority offline",
        ))
    }
}

#[async_trait]
impl Authority for MockAuthority {
    async fn query(&self) -> Result<AuthorityStatus> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Ok(AuthorityStatus::Unavailable);
        }
        Ok(match self.slot.lock().await.clone() {
            Some(identity) => AuthorityStatus::Occupied(identity),
            None => AuthorityStatus::Vacant,
        })
    }

    async fn acquire(&self, identity: &str) -> Result<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(self.offline_error());
        }
        let mut slot = self.slot.lock().await;
        if let Some(holder) = slot.as_ref() {
            return Err(Error::AlreadyRunning {
                holder: holder.clone(),
            });
        }
        *slot = Some(identity.to_string());
        Ok(())
    }

    async fn release(&self) -> Result<()> {
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(self.offline_error());
        }
        *self.slot.lock().await = None;
        Ok(())
    }
}
