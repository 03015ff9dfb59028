use thiserror::Error;

use lql_backend::BackendError;
use lql_criteria::ProjectionError;
use lql_types::TypeError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("record type error: {0}")]
    Type(#[from] TypeError),

    #[error("expected at most one result, found {count}")]
    MultipleMatches { count: usize },

    #[error("expected at least one result, found none")]
    EmptyResult,

    #[error("observer failed: {0}")]
    Observer(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
