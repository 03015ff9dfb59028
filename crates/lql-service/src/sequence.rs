use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use lql_backend::QueryBackend;
use lql_criteria::QuerySpec;
use lql_types::{Page, RecordState, VersionedRecord};

use crate::error::{QueryError, QueryResult};

/// A lazily evaluated query over one [`QuerySpec`].
///
/// Nothing is fetched until a terminal operation runs, and every terminal
/// operation (or call to [`iter`](Self::iter)) issues exactly one backend
/// query for the configured page. Results are never cached.
pub struct QueryResultSequence<T> {
    backend: Arc<dyn QueryBackend>,
    spec: QuerySpec,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryResultSequence<T> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            spec: self.spec.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: RecordState> QueryResultSequence<T> {
    pub fn new(backend: Arc<dyn QueryBackend>, spec: QuerySpec) -> Self {
        Self {
            backend,
            spec,
            _marker: PhantomData,
        }
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Run the query and decode the page.
    pub fn page(&self) -> QueryResult<Page<VersionedRecord<T>>> {
        let page = self.backend.query(&self.spec)?;
        debug!(
            page = self.spec.paging.number(),
            size = self.spec.paging.size(),
            returned = page.len(),
            "sequence evaluated"
        );
        Ok(page.try_map(|r| r.decode::<T>())?)
    }

    pub fn iter(&self) -> QueryResult<std::vec::IntoIter<VersionedRecord<T>>> {
        Ok(self.page()?.records.into_iter())
    }

    pub fn any(&self) -> QueryResult<bool> {
        Ok(self.iter()?.next().is_some())
    }

    pub fn count(&self) -> QueryResult<usize> {
        Ok(self.iter()?.len())
    }

    pub fn first(&self) -> QueryResult<VersionedRecord<T>> {
        self.first_or_none()?.ok_or(QueryError::EmptyResult)
    }

    pub fn first_or_none(&self) -> QueryResult<Option<VersionedRecord<T>>> {
        Ok(self.iter()?.next())
    }

    pub fn last(&self) -> QueryResult<VersionedRecord<T>> {
        self.last_or_none()?.ok_or(QueryError::EmptyResult)
    }

    pub fn last_or_none(&self) -> QueryResult<Option<VersionedRecord<T>>> {
        Ok(self.iter()?.last())
    }

    /// The only element. Fails on zero or on more than one.
    pub fn single(&self) -> QueryResult<VersionedRecord<T>> {
        self.single_or_none()?.ok_or(QueryError::EmptyResult)
    }

    /// The only element, or `None`. Fails on more than one.
    pub fn single_or_none(&self) -> QueryResult<Option<VersionedRecord<T>>> {
        let mut records = self.page()?.records;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            count => Err(QueryError::MultipleMatches { count }),
        }
    }

    pub fn to_list(&self) -> QueryResult<Vec<VersionedRecord<T>>> {
        Ok(self.page()?.records)
    }

    /// Distinct by reference.
    pub fn to_set(&self) -> QueryResult<HashSet<VersionedRecord<T>>> {
        Ok(self.iter()?.collect())
    }
}
