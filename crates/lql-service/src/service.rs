use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use lql_backend::QueryBackend;
use lql_criteria::{ProjectionError, QueryBuilder, QuerySpec, StatusFilter};
use lql_types::{Page, RecordState, VersionedRecord};

use crate::error::QueryResult;
use crate::sequence::QueryResultSequence;
use crate::subscription::{NotificationFeed, Subscription};

/// Typed entry point for querying and subscribing to records of type `T`.
pub struct QueryService<T> {
    backend: Arc<dyn QueryBackend>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryService<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T: RecordState> QueryService<T> {
    pub fn new(backend: Arc<dyn QueryBackend>) -> Self {
        Self {
            backend,
            _marker: PhantomData,
        }
    }

    pub fn backend(&self) -> &Arc<dyn QueryBackend> {
        &self.backend
    }

    /// Builder scoped to `T`, defaulting to unconsumed records.
    pub fn builder(&self) -> QueryBuilder {
        QueryBuilder::for_type(T::RECORD_TYPE, StatusFilter::Unconsumed)
    }

    /// Builder scoped to `T`, defaulting to every status.
    pub fn subscription_builder(&self) -> QueryBuilder {
        QueryBuilder::for_type(T::RECORD_TYPE, StatusFilter::All)
    }

    /// Run `spec` once and decode the page.
    pub fn query(&self, spec: &QuerySpec) -> QueryResult<Page<VersionedRecord<T>>> {
        self.sequence(spec.clone()).page()
    }

    /// A lazy sequence over `spec`.
    pub fn sequence(&self, spec: QuerySpec) -> QueryResultSequence<T> {
        QueryResultSequence::new(Arc::clone(&self.backend), spec)
    }

    /// Build a query with `block` on top of [`builder`](Self::builder).
    pub fn filter(
        &self,
        block: impl FnOnce(&mut QueryBuilder) -> Result<(), ProjectionError>,
    ) -> QueryResult<QueryResultSequence<T>> {
        let mut builder = self.builder();
        block(&mut builder)?;
        Ok(self.sequence(builder.build()))
    }

    /// Snapshot plus update feed for `spec`. Notifications honour the status
    /// in the query's base filter.
    pub fn subscribe(&self, spec: &QuerySpec) -> QueryResult<Subscription<T>> {
        let (page, stream) = self.backend.subscribe(spec)?;
        let snapshot = page.try_map(|r| r.decode::<T>())?.records;
        debug!(
            record_type = T::RECORD_TYPE.name(),
            snapshot = snapshot.len(),
            "subscribed"
        );
        Ok(Subscription {
            snapshot,
            updates: NotificationFeed::new(stream, spec.criteria.status()),
        })
    }

    /// Subscribe with `block` on top of
    /// [`subscription_builder`](Self::subscription_builder).
    pub fn subscribe_with(
        &self,
        block: impl FnOnce(&mut QueryBuilder) -> Result<(), ProjectionError>,
    ) -> QueryResult<Subscription<T>> {
        let mut builder = self.subscription_builder();
        block(&mut builder)?;
        self.subscribe(&builder.build())
    }
}
