use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use lql_criteria::QuerySpec;
use lql_types::{Page, StoredRecord, DEFAULT_PAGE_SIZE};
use lql_vault::{UpdateStream, VaultService};

use crate::codec::LqlCodec;
use crate::error::{BackendError, BackendResult};
use crate::protocol::{LqlMessage, MAX_MESSAGE_SIZE};
use crate::transport::QueryTransport;

/// Where queries are answered. Object-safe so services can hold
/// `Arc<dyn QueryBackend>` without knowing which side of the wire they are on.
pub trait QueryBackend: Send + Sync {
    fn query(&self, spec: &QuerySpec) -> BackendResult<Page<StoredRecord>>;

    fn subscribe(&self, spec: &QuerySpec) -> BackendResult<(Page<StoredRecord>, UpdateStream)>;

    /// Largest page size worth requesting when paging through results.
    fn max_page_size(&self) -> u32;
}

/// Backend for code running on the node that hosts the vault.
#[derive(Clone)]
pub struct HostBackend {
    vault: Arc<dyn VaultService>,
}

impl HostBackend {
    pub fn new(vault: Arc<dyn VaultService>) -> Self {
        Self { vault }
    }
}

impl QueryBackend for HostBackend {
    fn query(&self, spec: &QuerySpec) -> BackendResult<Page<StoredRecord>> {
        Ok(self.vault.query(spec)?)
    }

    fn subscribe(&self, spec: &QuerySpec) -> BackendResult<(Page<StoredRecord>, UpdateStream)> {
        Ok(self.vault.track(spec)?)
    }

    fn max_page_size(&self) -> u32 {
        self.vault.max_page_size()
    }
}

/// Settings for a [`RemoteBackend`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub max_message_size: usize,
    pub verify_checksums: bool,
    /// Page size used when paging through results. Must not exceed what the
    /// serving vault accepts.
    pub page_size: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            max_message_size: MAX_MESSAGE_SIZE,
            verify_checksums: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl RemoteConfig {
    pub fn from_toml_str(text: &str) -> BackendResult<Self> {
        toml::from_str(text).map_err(|e| BackendError::Config(e.to_string()))
    }

    pub fn codec(&self) -> LqlCodec {
        LqlCodec {
            max_message_size: self.max_message_size,
            verify_checksums: self.verify_checksums,
        }
    }
}

/// Backend for clients that reach the vault through a [`QueryTransport`].
pub struct RemoteBackend<T> {
    transport: T,
    codec: LqlCodec,
    page_size: u32,
}

impl<T: QueryTransport> RemoteBackend<T> {
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, RemoteConfig::default())
    }

    pub fn with_config(transport: T, config: RemoteConfig) -> Self {
        Self {
            transport,
            codec: config.codec(),
            page_size: config.page_size.max(1),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn exchange(&self, request: &LqlMessage) -> BackendResult<LqlMessage> {
        let frame = self.codec.encode(request)?;
        let sent = frame.len();
        let reply = self.transport.call(frame)?;
        let (response, _) = self.codec.decode(&reply)?;
        debug!(
            request = request.type_name(),
            response = response.type_name(),
            sent,
            received = reply.len(),
            "remote exchange"
        );
        match response {
            LqlMessage::Error { code, message } => Err(BackendError::Remote { code, message }),
            other => Ok(other),
        }
    }
}

impl<T: QueryTransport> QueryBackend for RemoteBackend<T> {
    fn query(&self, spec: &QuerySpec) -> BackendResult<Page<StoredRecord>> {
        let request = LqlMessage::QueryRequest { spec: spec.clone() };
        match self.exchange(&request)? {
            LqlMessage::QueryResponse { page } => Ok(page),
            other => Err(BackendError::UnexpectedMessage(other.type_name())),
        }
    }

    fn subscribe(&self, spec: &QuerySpec) -> BackendResult<(Page<StoredRecord>, UpdateStream)> {
        let request = LqlMessage::SubscribeRequest { spec: spec.clone() };
        match self.exchange(&request)? {
            LqlMessage::SubscribeAck { page, feed_id } => {
                let stream = self.transport.open_feed(feed_id)?;
                Ok((page, stream))
            }
            other => Err(BackendError::UnexpectedMessage(other.type_name())),
        }
    }

    fn max_page_size(&self) -> u32 {
        self.page_size
    }
}
