//! Reference vault for the Ledger Query Layer.
//!
//! The vault is the in-process store the host backend talks to. It holds
//! committed records, evaluates [`Criteria`](lql_criteria::Criteria) against
//! them, and fans out [`UpdateEvent`](lql_types::UpdateEvent)s to trackers.
//!
//! # Design Rules
//!
//! 1. Records are immutable once recorded; only status and consumption time
//!    change when a later transaction consumes them.
//! 2. A produced record may only point back at an already-recorded record.
//! 3. Every query is a fresh snapshot; nothing is cached between calls.
//! 4. Update feeds are bounded; slow trackers lose the oldest updates.

pub mod config;
pub mod error;
pub mod eval;
pub mod memory;
pub mod router;
pub mod traits;

pub use config::VaultConfig;
pub use error::{VaultError, VaultResult};
pub use memory::{CommittedTransaction, InMemoryVault, OutputRecord};
pub use router::UpdateStream;
pub use traits::VaultService;
