use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::{debug, warn};

use lql_vault::{UpdateStream, VaultService};

use crate::codec::LqlCodec;
use crate::error::{BackendError, BackendResult};
use crate::protocol::{codes, LqlMessage};

/// Carries framed requests to a node and hands back its framed replies.
pub trait QueryTransport: Send + Sync {
    /// Send one framed request and wait for the framed response.
    fn call(&self, request: Bytes) -> BackendResult<Bytes>;

    /// Attach to the update feed announced in a `SubscribeAck`. Each feed can
    /// be opened once.
    fn open_feed(&self, feed_id: u64) -> BackendResult<UpdateStream>;
}

/// In-process transport that serves requests from a local vault through the
/// full encode / decode path.
pub struct LoopbackTransport {
    vault: Arc<dyn VaultService>,
    codec: LqlCodec,
    feeds: Mutex<HashMap<u64, UpdateStream>>,
    next_feed: AtomicU64,
}

impl LoopbackTransport {
    pub fn new(vault: Arc<dyn VaultService>) -> Self {
        Self::with_codec(vault, LqlCodec::default())
    }

    pub fn with_codec(vault: Arc<dyn VaultService>, codec: LqlCodec) -> Self {
        Self {
            vault,
            codec,
            feeds: Mutex::new(HashMap::new()),
            next_feed: AtomicU64::new(1),
        }
    }

    /// Number of announced feeds not yet opened.
    pub fn pending_feeds(&self) -> usize {
        self.feeds.lock().map(|f| f.len()).unwrap_or(0)
    }

    /// Answer one request. A subscription also yields its stream, which is
    /// registered only once the ack has been framed.
    fn handle(&self, request: LqlMessage) -> (LqlMessage, Option<(u64, UpdateStream)>) {
        match request {
            LqlMessage::QueryRequest { spec } => match self.vault.query(&spec) {
                Ok(page) => (LqlMessage::QueryResponse { page }, None),
                Err(e) => (LqlMessage::from_vault_error(&e), None),
            },
            LqlMessage::SubscribeRequest { spec } => match self.vault.track(&spec) {
                Ok((page, stream)) => {
                    let feed_id = self.next_feed.fetch_add(1, Ordering::Relaxed);
                    (
                        LqlMessage::SubscribeAck { page, feed_id },
                        Some((feed_id, stream)),
                    )
                }
                Err(e) => (LqlMessage::from_vault_error(&e), None),
            },
            other => (
                LqlMessage::Error {
                    code: codes::BAD_REQUEST,
                    message: format!("{} is not a request", other.type_name()),
                },
                None,
            ),
        }
    }

    fn register(&self, feed_id: u64, stream: UpdateStream) -> BackendResult<()> {
        self.feeds
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .insert(feed_id, stream);
        Ok(())
    }
}

impl QueryTransport for LoopbackTransport {
    fn call(&self, request: Bytes) -> BackendResult<Bytes> {
        let (response, feed) = match self.codec.decode(&request) {
            Ok((msg, _)) => {
                debug!(kind = msg.type_name(), "loopback request");
                self.handle(msg)
            }
            Err(e) => {
                warn!(error = %e, "rejecting malformed request");
                let error = LqlMessage::Error {
                    code: codes::BAD_REQUEST,
                    message: e.to_string(),
                };
                (error, None)
            }
        };
        match self.codec.encode(&response) {
            Ok(frame) => {
                if let Some((feed_id, stream)) = feed {
                    self.register(feed_id, stream)?;
                }
                Ok(frame)
            }
            Err(e) => {
                // Any stream is dropped here, which releases its tracker.
                warn!(kind = response.type_name(), error = %e, "response could not be framed");
                self.codec.encode(&LqlMessage::Error {
                    code: codes::INTERNAL,
                    message: e.to_string(),
                })
            }
        }
    }

    fn open_feed(&self, feed_id: u64) -> BackendResult<UpdateStream> {
        self.feeds
            .lock()
            .map_err(|_| BackendError::LockPoisoned)?
            .remove(&feed_id)
            .ok_or(BackendError::UnknownFeed(feed_id))
    }
}
