//! Query backends for the Ledger Query Layer.
//!
//! A [`QueryBackend`] answers a [`QuerySpec`](lql_criteria::QuerySpec) with a
//! page of stored records, and optionally a feed of later updates. Two
//! implementations ship here:
//!
//! - [`HostBackend`] calls a co-located [`VaultService`](lql_vault::VaultService).
//! - [`RemoteBackend`] frames requests with [`LqlCodec`] and sends them over a
//!   [`QueryTransport`]. [`LoopbackTransport`] serves that protocol from a
//!   local vault.

pub mod backend;
pub mod codec;
pub mod error;
pub mod protocol;
pub mod transport;

pub use backend::{HostBackend, QueryBackend, RemoteBackend, RemoteConfig};
pub use codec::LqlCodec;
pub use error::{BackendError, BackendResult};
pub use protocol::{codes, LqlMessage, MAX_MESSAGE_SIZE, PROTOCOL_VERSION};
pub use transport::{LoopbackTransport, QueryTransport};
pub use lql_vault::UpdateStream;
