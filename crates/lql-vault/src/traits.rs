use lql_criteria::QuerySpec;
use lql_types::{Page, StoredRecord};

use crate::error::VaultResult;
use crate::router::UpdateStream;

/// A store that can answer queries and stream matching updates.
pub trait VaultService: Send + Sync {
    /// One page of records matching `spec`, as of now.
    fn query(&self, spec: &QuerySpec) -> VaultResult<Page<StoredRecord>>;

    /// A snapshot page plus a feed of later updates touching records the
    /// criteria admit. The feed is opened before the snapshot is taken, so no
    /// commit is missed; one racing the snapshot may show up in both.
    fn track(&self, spec: &QuerySpec) -> VaultResult<(Page<StoredRecord>, UpdateStream)>;

    /// Largest page size [`query`](Self::query) accepts.
    fn max_page_size(&self) -> u32;
}
