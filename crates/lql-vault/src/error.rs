use lql_types::{RecordRef, TransactionId, TypeError};

/// Errors produced by vault operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    #[error("vault lock poisoned")]
    LockPoisoned,

    #[error("record not found: {0}")]
    RecordNotFound(RecordRef),

    #[error("record already consumed: {0}")]
    AlreadyConsumed(RecordRef),

    #[error("transaction already recorded: {0}")]
    DuplicateTransaction(TransactionId),

    #[error("chain violation at {reference}: {reason}")]
    ChainViolation { reference: RecordRef, reason: String },

    #[error("page size {requested} exceeds maximum {max}")]
    PageTooLarge { requested: u32, max: u32 },

    #[error("record type error: {0}")]
    Type(#[from] TypeError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type VaultResult<T> = Result<T, VaultError>;
