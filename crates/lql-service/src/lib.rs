//! Typed query service for the Ledger Query Layer.
//!
//! [`QueryService<T>`] binds a [`QueryBackend`](lql_backend::QueryBackend) to
//! one record type. It hands out builders scoped to that type, lazy
//! [`QueryResultSequence`]s, and [`Subscription`]s whose raw updates are
//! translated into typed [`Notification`]s.

pub mod error;
pub mod notification;
pub mod sequence;
pub mod service;
pub mod subscription;

pub use error::{QueryError, QueryResult};
pub use notification::{translate, Notification};
pub use sequence::QueryResultSequence;
pub use service::QueryService;
pub use subscription::{NotificationFeed, Subscription};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};

    use lql_backend::{BackendResult, HostBackend, QueryBackend, UpdateStream};
    use lql_criteria::QuerySpec;
    use lql_types::{Page, RecordRef, RecordState, RecordType, StoredRecord, TransactionId};
    use lql_vault::{CommittedTransaction, InMemoryVault, VaultService};

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Item {
        pub amount: i64,
    }

    impl RecordState for Item {
        const RECORD_TYPE: RecordType = RecordType::new("test.Item");
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct Other {
        pub label: String,
    }

    impl RecordState for Other {
        const RECORD_TYPE: RecordType = RecordType::new("test.Other");
    }

    pub fn stored<T: RecordState>(index: u32, state: &T) -> StoredRecord {
        let reference = RecordRef::new(TransactionId::from_bytes(b"support"), index);
        StoredRecord::from_state(reference, None, state).unwrap()
    }

    pub fn host(amounts: &[i64]) -> (Arc<InMemoryVault>, Arc<dyn QueryBackend>) {
        let vault = Arc::new(InMemoryVault::default());
        for amount in amounts {
            let tx = CommittedTransaction::new()
                .output(&Item { amount: *amount })
                .unwrap();
            vault.record(tx).unwrap();
        }
        let service: Arc<dyn VaultService> = vault.clone();
        (vault, Arc::new(HostBackend::new(service)))
    }

    #[derive(Clone, Default)]
    pub struct CallCount(Arc<AtomicUsize>);

    impl CallCount {
        pub fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct CountingBackend {
        inner: Arc<dyn QueryBackend>,
        calls: CallCount,
    }

    impl QueryBackend for CountingBackend {
        fn query(&self, spec: &QuerySpec) -> BackendResult<Page<StoredRecord>> {
            self.calls.0.fetch_add(1, Ordering::SeqCst);
            self.inner.query(spec)
        }

        fn subscribe(
            &self,
            spec: &QuerySpec,
        ) -> BackendResult<(Page<StoredRecord>, UpdateStream)> {
            self.calls.0.fetch_add(1, Ordering::SeqCst);
            self.inner.subscribe(spec)
        }

        fn max_page_size(&self) -> u32 {
            self.inner.max_page_size()
        }
    }

    pub fn counting_backend(amounts: &[i64]) -> (Arc<dyn QueryBackend>, CallCount) {
        let (_, inner) = host(amounts);
        let calls = CallCount::default();
        let backend = CountingBackend {
            inner,
            calls: calls.clone(),
        };
        (Arc::new(backend), calls)
    }
}
