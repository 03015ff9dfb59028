use thiserror::Error;

use lql_criteria::ProjectionError;
use lql_service::QueryError;
use lql_types::TypeError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("expected at most one linked record, found {count}")]
    MultipleMatches { count: usize },

    #[error("{0}")]
    MissingDependency(String),

    #[error("query failed: {0}")]
    Query(#[from] QueryError),

    #[error("record type error: {0}")]
    Type(#[from] TypeError),
}

impl From<ProjectionError> for ResolveError {
    fn from(e: ProjectionError) -> Self {
        Self::Query(QueryError::Projection(e))
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;
