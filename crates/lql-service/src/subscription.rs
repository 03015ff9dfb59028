use std::collections::VecDeque;
use std::fmt;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

use lql_backend::UpdateStream;
use lql_criteria::StatusFilter;
use lql_types::{RecordState, VersionedRecord};

use crate::error::{QueryError, QueryResult};
use crate::notification::{translate, Notification};

/// The result of subscribing: what matched at subscription time, and a feed
/// of everything that changes afterwards.
pub struct Subscription<T> {
    pub snapshot: Vec<VersionedRecord<T>>,
    pub updates: NotificationFeed<T>,
}

/// Typed view over an update stream.
///
/// The underlying channel is bounded. A feed that falls behind loses its
/// oldest updates; the loss is logged and delivery resumes with the oldest
/// update still held.
pub struct NotificationFeed<T> {
    stream: UpdateStream,
    status: StatusFilter,
    pending: VecDeque<Notification<T>>,
}

impl<T: RecordState> NotificationFeed<T> {
    pub fn new(stream: UpdateStream, status: StatusFilter) -> Self {
        Self {
            stream,
            status,
            pending: VecDeque::new(),
        }
    }

    /// Block until the next notification. `None` once the source is gone.
    ///
    /// Must not be called from inside an async runtime.
    pub fn recv(&mut self) -> QueryResult<Option<Notification<T>>> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Ok(Some(next));
            }
            match self.stream.blocking_recv() {
                Ok(event) => self.pending.extend(translate(&event, self.status)?),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification feed lagged; oldest updates dropped");
                }
                Err(RecvError::Closed) => return Ok(None),
            }
        }
    }

    /// The next notification if one is already available.
    pub fn try_recv(&mut self) -> QueryResult<Option<Notification<T>>> {
        loop {
            if let Some(next) = self.pending.pop_front() {
                return Ok(Some(next));
            }
            match self.stream.try_recv() {
                Ok(event) => self.pending.extend(translate(&event, self.status)?),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification feed lagged; oldest updates dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(None),
            }
        }
    }

    /// Hand every notification to `observer` until the source closes.
    ///
    /// An observer error ends the feed and is returned as
    /// [`QueryError::Observer`].
    pub fn observe<E: fmt::Display>(
        mut self,
        mut observer: impl FnMut(Notification<T>) -> Result<(), E>,
    ) -> QueryResult<()> {
        let mut delivered = 0usize;
        while let Some(notification) = self.recv()? {
            observer(notification).map_err(|e| QueryError::Observer(e.to_string()))?;
            delivered += 1;
        }
        debug!(delivered, "notification feed closed");
        Ok(())
    }

    /// Deliver what is already buffered without blocking. Returns how many
    /// notifications were handed over.
    pub fn drain<E: fmt::Display>(
        &mut self,
        mut observer: impl FnMut(Notification<T>) -> Result<(), E>,
    ) -> QueryResult<usize> {
        let mut delivered = 0;
        while let Some(notification) = self.try_recv()? {
            observer(notification).map_err(|e| QueryError::Observer(e.to_string()))?;
            delivered += 1;
        }
        Ok(delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{stored, Item};
    use lql_types::{RecordStatus, TransactionId, UpdateEvent};
    use tokio::sync::broadcast;

    fn produced(amount: i64) -> UpdateEvent {
        UpdateEvent {
            transaction_id: TransactionId::from_bytes(&amount.to_be_bytes()),
            consumed: vec![stored(100, &Item { amount: -amount })],
            produced: vec![stored(amount as u32, &Item { amount })],
        }
    }

    #[test]
    fn unconsumed_feed_sees_only_produced() {
        let (tx, rx) = broadcast::channel(8);
        let mut feed = NotificationFeed::<Item>::new(rx, StatusFilter::Unconsumed);
        tx.send(produced(1)).unwrap();
        let n = feed.try_recv().unwrap().unwrap();
        assert_eq!(n.status, RecordStatus::Unconsumed);
        assert_eq!(n.record.state.amount, 1);
        assert!(feed.try_recv().unwrap().is_none());
    }

    #[test]
    fn lagging_feed_continues_with_retained_updates() {
        let (tx, rx) = broadcast::channel(2);
        let mut feed = NotificationFeed::<Item>::new(rx, StatusFilter::Unconsumed);
        for amount in 1..=4 {
            tx.send(produced(amount)).unwrap();
        }
        let mut seen = Vec::new();
        feed.drain(|n| {
            seen.push(n.record.state.amount);
            Ok::<_, String>(())
        })
        .unwrap();
        assert_eq!(seen, vec![3, 4]);
    }

    #[test]
    fn observe_runs_until_closed() {
        let (tx, rx) = broadcast::channel(8);
        let feed = NotificationFeed::<Item>::new(rx, StatusFilter::All);
        tx.send(produced(1)).unwrap();
        drop(tx);
        let mut statuses = Vec::new();
        feed.observe(|n| {
            statuses.push(n.status);
            Ok::<_, String>(())
        })
        .unwrap();
        assert_eq!(statuses, vec![RecordStatus::Consumed, RecordStatus::Unconsumed]);
    }

    #[test]
    fn observer_error_stops_the_feed() {
        let (tx, rx) = broadcast::channel(8);
        let feed = NotificationFeed::<Item>::new(rx, StatusFilter::Unconsumed);
        tx.send(produced(1)).unwrap();
        tx.send(produced(2)).unwrap();
        let mut calls = 0;
        let result = feed.observe(|_| {
            calls += 1;
            Err("refused")
        });
        assert!(matches!(result, Err(QueryError::Observer(m)) if m == "refused"));
        assert_eq!(calls, 1);
    }
}
