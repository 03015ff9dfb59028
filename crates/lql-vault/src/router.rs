use std::sync::RwLock;

use tokio::sync::broadcast;
use tracing::debug;

use lql_criteria::Criteria;
use lql_types::UpdateEvent;

use crate::error::{VaultError, VaultResult};
use crate::eval::matches_ignoring_status;

/// Receiver half of a tracker's update feed.
pub type UpdateStream = broadcast::Receiver<UpdateEvent>;

struct Tracker {
    criteria: Criteria,
    sender: broadcast::Sender<UpdateEvent>,
}

/// Fans committed updates out to trackers, each restricted to the records
/// its criteria admit.
pub(crate) struct UpdateRouter {
    trackers: RwLock<Vec<Tracker>>,
}

impl UpdateRouter {
    pub(crate) fn new() -> Self {
        Self {
            trackers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn subscribe(&self, criteria: Criteria, capacity: usize) -> VaultResult<UpdateStream> {
        let (sender, receiver) = broadcast::channel(capacity.max(1));
        self.trackers
            .write()
            .map_err(|_| VaultError::LockPoisoned)?
            .push(Tracker { criteria, sender });
        Ok(receiver)
    }

    /// Deliver `event` to every tracker with at least one admitted record.
    /// Trackers whose receivers are all dropped are pruned.
    pub(crate) fn route(&self, event: &UpdateEvent) -> VaultResult<()> {
        let mut trackers = self.trackers.write().map_err(|_| VaultError::LockPoisoned)?;
        trackers.retain(|tracker| {
            let restricted = event.retain(|r| matches_ignoring_status(&tracker.criteria, r));
            if restricted.is_empty() {
                return tracker.sender.receiver_count() > 0;
            }
            tracker.sender.send(restricted).is_ok()
        });
        debug!(
            transaction = %event.transaction_id.short_hex(),
            trackers = trackers.len(),
            "update routed"
        );
        Ok(())
    }

    pub(crate) fn tracker_count(&self) -> VaultResult<usize> {
        Ok(self
            .trackers
            .read()
            .map_err(|_| VaultError::LockPoisoned)?
            .len())
    }
}
