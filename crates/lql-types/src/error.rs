use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("malformed record reference: {0}")]
    MalformedReference(String),

    #[error("invalid page spec: number={number}, size={size}")]
    InvalidPage { number: u32, size: u32 },

    #[error("record of type {found} is not assignable to {expected}")]
    NotAssignable { expected: String, found: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
