use thiserror::Error;

/// An operator that needs a non-null operand received one.
///
/// Raised while compiling, before any backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("{operator} on {field} requires a non-null operand")]
    NullOperand {
        field: String,
        operator: &'static str,
    },

    #[error("{operator} on {field}: element {index} projects to null")]
    NullElement {
        field: String,
        operator: &'static str,
        index: usize,
    },

    #[error("{operator} on {field} requires a text pattern")]
    NonTextPattern {
        field: String,
        operator: &'static str,
    },
}
