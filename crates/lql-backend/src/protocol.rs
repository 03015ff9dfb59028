use serde::{Deserialize, Serialize};

use lql_criteria::QuerySpec;
use lql_types::{Page, StoredRecord};
use lql_vault::VaultError;

pub const PROTOCOL_VERSION: u32 = 1;
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Error codes carried by [`LqlMessage::Error`].
pub mod codes {
    pub const BAD_REQUEST: u32 = 400;
    pub const NOT_FOUND: u32 = 404;
    pub const CONFLICT: u32 = 409;
    pub const INTERNAL: u32 = 500;
}

/// Messages exchanged between a remote backend and the node serving it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LqlMessage {
    QueryRequest { spec: QuerySpec },
    QueryResponse { page: Page<StoredRecord> },
    SubscribeRequest { spec: QuerySpec },
    SubscribeAck { page: Page<StoredRecord>, feed_id: u64 },
    Error { code: u32, message: String },
}

impl LqlMessage {
    pub fn type_tag(&self) -> u8 {
        match self {
            Self::QueryRequest { .. } => 1,
            Self::QueryResponse { .. } => 2,
            Self::SubscribeRequest { .. } => 3,
            Self::SubscribeAck { .. } => 4,
            Self::Error { .. } => 255,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::QueryRequest { .. } => "QueryRequest",
            Self::QueryResponse { .. } => "QueryResponse",
            Self::SubscribeRequest { .. } => "SubscribeRequest",
            Self::SubscribeAck { .. } => "SubscribeAck",
            Self::Error { .. } => "Error",
        }
    }

    pub fn from_vault_error(error: &VaultError) -> Self {
        let code = match error {
            VaultError::PageTooLarge { .. } | VaultError::Type(_) => codes::BAD_REQUEST,
            VaultError::RecordNotFound(_) => codes::NOT_FOUND,
            VaultError::AlreadyConsumed(_)
            | VaultError::DuplicateTransaction(_)
            | VaultError::ChainViolation { .. } => codes::CONFLICT,
            VaultError::LockPoisoned | VaultError::Config(_) => codes::INTERNAL,
        };
        Self::Error {
            code,
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_distinct() {
        let messages = [
            LqlMessage::QueryRequest {
                spec: QuerySpec::new(lql_criteria::Criteria::Structural(
                    lql_criteria::StructuralFilter::any(),
                )),
            },
            LqlMessage::QueryResponse { page: Page::empty() },
            LqlMessage::SubscribeAck {
                page: Page::empty(),
                feed_id: 1,
            },
            LqlMessage::Error {
                code: 1,
                message: String::new(),
            },
        ];
        let mut tags: Vec<u8> = messages.iter().map(LqlMessage::type_tag).collect();
        tags.dedup();
        assert_eq!(tags.len(), messages.len());
    }

    #[test]
    fn vault_errors_map_to_codes() {
        let error = VaultError::PageTooLarge {
            requested: 20,
            max: 10,
        };
        match LqlMessage::from_vault_error(&error) {
            LqlMessage::Error { code, message } => {
                assert_eq!(code, codes::BAD_REQUEST);
                assert!(message.contains("20"));
            }
            other => panic!("unexpected {}", other.type_name()),
        }
    }
}
