use serde::{Deserialize, Serialize};

use lql_types::Party;

use crate::error::{VaultError, VaultResult};

/// Configuration for the [`InMemoryVault`](crate::InMemoryVault).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Capacity of each tracker's update channel. When a tracker falls this
    /// far behind, its oldest updates are dropped.
    pub channel_capacity: usize,
    /// Largest page a single query may request.
    pub max_page_size: u32,
    /// Parties hosted by this node. Records with any of these participants
    /// are relevant; an empty list makes every record relevant.
    pub local_parties: Vec<Party>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            max_page_size: 10_000,
            local_parties: Vec::new(),
        }
    }
}

impl VaultConfig {
    pub fn from_toml_str(text: &str) -> VaultResult<Self> {
        toml::from_str(text).map_err(|e| VaultError::Config(e.to_string()))
    }

    pub fn is_relevant(&self, participants: &[Party]) -> bool {
        self.local_parties.is_empty()
            || participants.iter().any(|p| self.local_parties.contains(p))
    }
}
