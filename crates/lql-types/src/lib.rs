//! Foundation types for the Ledger Query Layer (LQL).
//!
//! This crate provides the record, reference, and paging types shared by every
//! other LQL crate. It knows nothing about criteria or backends.
//!
//! # Key Types
//!
//! - [`RecordRef`] — Store-assigned reference of one committed record version
//! - [`TransactionId`] — Content-addressed identifier of a transaction (BLAKE3)
//! - [`RecordType`] — Explicit type descriptor used instead of reflection
//! - [`RecordState`] — Trait implemented by typed record payloads
//! - [`StoredRecord`] — Type-erased record as held by a store
//! - [`VersionedRecord`] — Typed view of a stored record
//! - [`PageSpec`] / [`Page`] / [`Sort`] — Paging and ordering
//! - [`UpdateEvent`] — Raw change event emitted by a store
//! - [`ChainVerifier`] — Back-reference chain checks

pub mod chain;
pub mod error;
pub mod identity;
pub mod paging;
pub mod record;
pub mod reference;
pub mod update;

pub use chain::{is_pointing_to, ChainError, ChainVerifier, Chained};
pub use error::TypeError;
pub use identity::{LinearId, Party};
pub use paging::{Page, PageSpec, Sort, SortColumn, SortDirection, SortKey, DEFAULT_PAGE_SIZE};
pub use record::{AnyRecord, RecordState, RecordStatus, RecordType, StoredRecord, VersionedRecord};
pub use reference::{RecordRef, TransactionId};
pub use update::UpdateEvent;
