//! Reconciliation between the authority service and the replica store.
//!
//! The two records are written independently and can disagree. The replica
//! store reflects the instant of the local change, so on disagreement it
//! wins: the coordinator pushes a corrective update to the authority and
//! answers with the replica value. When the authority cannot be reached the
//! replica store is the sole source of truth.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::authority::{Authority, AuthorityStatus};
use crate::replica::ReplicaStore;
use crate::{Error, Result};

#[derive(Debug)]
pub struct Coordinator {
    authority: Option<Arc<dyn Authority>>,
    replica: ReplicaStore,
}

impl Coordinator {
    /// An agent configured without an authority runs against the replica
    /// store alone.
    pub fn new(authority: Option<Arc<dyn Authority>>, replica: ReplicaStore) -> Self {
        Self { authority, replica }
    }

    pub fn replica(&self) -> &ReplicaStore {
        &self.replica
    }

    /// Determine the current holder, reconciling both records.
    ///
    /// Replica records older than `threshold` count as vacant; a zero
    /// threshold disables staleness checking.
    pub async fn is_someone_running(&self, threshold: Duration) -> Result<Option<String>> {
        let authority_view = match &self.authority {
            Some(authority) => authority.query().await?,
            None => AuthorityStatus::Unavailable,
        };
        let replica_view = self.replica.read(threshold);

        let authority_view = match authority_view {
            AuthorityStatus::Unavailable => return Ok(replica_view),
            AuthorityStatus::Occupied(identity) => Some(identity),
            AuthorityStatus::Vacant => None,
        };

        if authority_view == replica_view {
            return Ok(authority_view);
        }

        info!(
            "Authority ({:?}) and replica store ({:?}) disagree, correcting the authority",
            authority_view, replica_view
        );
        self.correct_authority(replica_view.as_deref()).await?;
        Ok(replica_view)
    }

    // Replace whatever the authority holds with the replica value. The slot
    // must be released first: the authority is a lock and rejects an acquire
    // while a holder is set.
    async fn correct_authority(&self, desired: Option<&str>) -> Result<()> {
        let Some(authority) = &self.authority else {
            return Ok(());
        };
        if let Err(e) = authority.release().await {
            if matches!(e, Error::InvalidKey) {
                return Err(e);
            }
            warn!("Corrective release failed: {}", e);
            return Ok(());
        }
        match desired {
            Some(identity) => self.push_to_authority(Some(identity)).await,
            None => Ok(()),
        }
    }

    /// Record this agent as the holder on both replicas.
    ///
    /// The authority is informed first so concurrent pollers see the slot
    /// taken as early as possible, but the replica write decides success:
    /// without it the occupancy cannot be safely recorded.
    pub async fn mark_running(&self, identity: &str) -> Result<()> {
        self.push_to_authority(Some(identity)).await?;
        self.replica.write(Some(identity))
    }

    /// Clear this agent's occupancy on both replicas. Never fails: a record
    /// that cannot be cleared is reclaimed later through staleness.
    pub async fn mark_stopped(&self) {
        if let Err(e) = self.push_to_authority(None).await {
            warn!("Could not inform the authority of the stop: {}", e);
        }
        if let Err(e) = self.replica.write(None) {
            warn!("Could not clear the replica record: {}", e);
        }
    }

    // Best-effort update of the authority record. IO failures and conflicts
    // are logged and swallowed; a key rejection is a configuration fault and
    // surfaces to the caller.
    async fn push_to_authority(&self, identity: Option<&str>) -> Result<()> {
        let Some(authority) = &self.authority else {
            return Ok(());
        };
        let outcome = match identity {
            Some(identity) => authority.acquire(identity).await,
            None => authority.release().await,
        };
        match outcome {
            Ok(()) => Ok(()),
            Err(Error::InvalidKey) => Err(Error::InvalidKey),
            // A conflict naming ourselves is a heartbeat renewal hitting the
            // lock we already hold.
            Err(Error::AlreadyRunning { ref holder }) if Some(holder.as_str()) == identity => {
                Ok(())
            }
            Err(e) => {
                warn!("Could not update the authority: {}", e);
                Ok(())
            }
        }
    }
}
