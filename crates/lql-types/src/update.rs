use serde::{Deserialize, Serialize};

use crate::record::StoredRecord;
use crate::reference::TransactionId;

/// Raw change event emitted by a store when a transaction commits.
///
/// `consumed` holds the records the transaction superseded, `produced` the
/// records it created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    pub transaction_id: TransactionId,
    pub consumed: Vec<StoredRecord>,
    pub produced: Vec<StoredRecord>,
}

impl UpdateEvent {
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty() && self.produced.is_empty()
    }

    /// Keep only the records accepted by `keep`.
    pub fn retain(&self, mut keep: impl FnMut(&StoredRecord) -> bool) -> Self {
        Self {
            transaction_id: self.transaction_id,
            consumed: self.consumed.iter().filter(|r| keep(*r)).cloned().collect(),
            produced: self.produced.iter().filter(|r| keep(*r)).cloned().collect(),
        }
    }
}
