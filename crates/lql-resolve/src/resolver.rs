use std::sync::Arc;

use tracing::debug;

use lql_backend::QueryBackend;
use lql_criteria::{ProjectionError, QueryBuilder, StatusFilter};
use lql_service::QueryService;
use lql_types::{PageSpec, RecordState, Sort, SortDirection, SortKey, VersionedRecord};

use crate::context::QueryContext;
use crate::error::{ResolveError, ResolveResult};

/// Describes how one record is linked to others of type `T`.
///
/// The live path runs [`criteria`](Self::criteria) on a backend; the draft
/// path filters candidates with [`is_pointing_to`](Self::is_pointing_to).
/// Both must select the same records.
pub trait Resolver<T: RecordState> {
    /// Narrow a builder already scoped to `T` and [`status`](Self::status).
    fn criteria(&self, builder: &mut QueryBuilder) -> Result<(), ProjectionError>;

    fn is_pointing_to(&self, candidate: &VersionedRecord<T>) -> bool;

    fn status(&self) -> StatusFilter {
        StatusFilter::Unconsumed
    }
}

/// A link to at most one record.
pub trait SingularResolvable<T: RecordState>: Resolver<T> {
    fn resolve(&self, context: &QueryContext<'_>) -> ResolveResult<Option<VersionedRecord<T>>> {
        let mut matches = match context {
            QueryContext::Remote(backend) | QueryContext::Host(backend) => {
                let mut builder = live_builder(self)?;
                builder.page(singular_page(backend.max_page_size())?);
                let page = QueryService::<T>::new(Arc::clone(backend))
                    .sequence(builder.build())
                    .page()?;
                let count = usize::try_from(page.total_available).unwrap_or(usize::MAX);
                if count > 1 {
                    return Err(ResolveError::MultipleMatches { count });
                }
                page.records
            }
            QueryContext::Draft(draft, position) => draft
                .candidates::<T>(*position)?
                .into_iter()
                .filter(|c| self.is_pointing_to(c))
                .collect(),
        };
        debug!(context = context.kind(), found = matches.len(), "singular resolution");
        if matches.len() > 1 {
            return Err(ResolveError::MultipleMatches {
                count: matches.len(),
            });
        }
        Ok(matches.pop())
    }

    /// Like [`resolve`](Self::resolve) but a missing record is an error
    /// carrying `message()`.
    fn resolve_or_fail(
        &self,
        context: &QueryContext<'_>,
        message: impl FnOnce() -> String,
    ) -> ResolveResult<VersionedRecord<T>> {
        self.resolve(context)?
            .ok_or_else(|| ResolveError::MissingDependency(message()))
    }
}

/// A link to any number of records.
pub trait PluralResolvable<T: RecordState>: Resolver<T> {
    /// Every linked record. The live path pages through all results.
    fn resolve(&self, context: &QueryContext<'_>) -> ResolveResult<Vec<VersionedRecord<T>>> {
        let found = match context {
            QueryContext::Remote(backend) | QueryContext::Host(backend) => {
                fetch_all(self, backend)?
            }
            QueryContext::Draft(draft, position) => draft
                .candidates::<T>(*position)?
                .into_iter()
                .filter(|c| self.is_pointing_to(c))
                .collect(),
        };
        debug!(context = context.kind(), found = found.len(), "plural resolution");
        Ok(found)
    }
}

fn live_builder<T: RecordState, R: Resolver<T> + ?Sized>(
    resolver: &R,
) -> ResolveResult<QueryBuilder> {
    let mut builder = QueryBuilder::for_type(T::RECORD_TYPE, resolver.status());
    resolver.criteria(&mut builder)?;
    Ok(builder)
}

/// Two rows are enough to tell zero, one, and many apart; the exact count
/// comes from `total_available`.
fn singular_page(max: u32) -> ResolveResult<PageSpec> {
    Ok(PageSpec::first(max.clamp(1, 2))?)
}

/// Page through every match in reference order, using the largest page the
/// backend accepts. Each page is its own read, so commits landing between
/// pages may be missed or seen twice.
fn fetch_all<T: RecordState, R: Resolver<T> + ?Sized>(
    resolver: &R,
    backend: &Arc<dyn QueryBackend>,
) -> ResolveResult<Vec<VersionedRecord<T>>> {
    let mut builder = live_builder(resolver)?;
    builder.sort(Sort::by(SortKey::Reference, SortDirection::Ascending));
    let service = QueryService::<T>::new(Arc::clone(backend));
    let mut paging = PageSpec::first(backend.max_page_size().max(1))?;
    let mut found = Vec::new();
    loop {
        builder.page(paging);
        let page = service.sequence(builder.build()).page()?;
        let exhausted = page.records.len() < paging.size() as usize;
        found.extend(page.records);
        if exhausted || found.len() as u64 >= page.total_available {
            return Ok(found);
        }
        paging = paging.next();
    }
}
