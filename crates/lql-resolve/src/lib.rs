//! Cross-context resolution for the Ledger Query Layer.
//!
//! A resolver describes how one record links to others. The same resolver
//! runs against a live backend ([`QueryContext::Remote`] /
//! [`QueryContext::Host`]) by compiling criteria, or against a
//! [`DraftTransaction`] by filtering in memory. Both paths must agree.

pub mod chain;
pub mod context;
pub mod error;
pub mod resolver;

pub use chain::{PredecessorOf, SuccessorsOf};
pub use context::{DraftTransaction, Position, QueryContext};
pub use error::{ResolveError, ResolveResult};
pub use resolver::{PluralResolvable, Resolver, SingularResolvable};
