//! Predicate algebra and criteria builder for the Ledger Query Layer.
//!
//! Application code describes *what* it wants with typed [`Predicate`]s bound
//! to [`Field`]s. The compiler turns each predicate into a backend-neutral
//! [`Expression`]; the [`QueryBuilder`] folds expressions and structural
//! filters into one [`Criteria`] tree plus paging and sort order.
//!
//! Nothing in this crate touches a backend. Compilation is pure and fails
//! early with [`ProjectionError`] when an operator has no null-safe meaning.

pub mod builder;
pub mod compile;
pub mod criteria;
pub mod error;
pub mod expression;
pub mod field;
pub mod predicate;
pub mod value;

pub use builder::{QueryBuilder, QuerySpec};
pub use compile::compile;
pub use criteria::{Criteria, LinearFilter, Relevancy, StatusFilter, StructuralFilter};
pub use error::ProjectionError;
pub use expression::{CompareOp, Expression};
pub use field::{Field, FieldPath, RecordAttribute};
pub use predicate::Predicate;
pub use value::{FieldValue, Projectable};
