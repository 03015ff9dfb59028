use thiserror::Error;

use lql_vault::VaultError;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    Framing(String),

    #[error("checksum mismatch: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("unexpected {0} message")]
    UnexpectedMessage(&'static str),

    #[error("feed registry lock poisoned")]
    LockPoisoned,

    #[error("unknown update feed: {0}")]
    UnknownFeed(u64),

    #[error("remote error: code={code}, message={message}")]
    Remote { code: u32, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type BackendResult<T> = Result<T, BackendError>;
