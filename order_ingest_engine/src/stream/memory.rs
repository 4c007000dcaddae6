use std::sync::Arc;

use log::*;
use tokio::sync::{Mutex, Notify};

use crate::stream::{AckToken, OrderPublisher, OrderStream, StreamError, StreamRecord};

const PARTITION: i32 = 0;

#[derive(Debug, Default)]
struct Log {
    records: Vec<StreamRecord>,
    committed: i64,
    closed: bool,
    failing_commits: u32,
}

#[derive(Debug, Default)]
struct Shared {
    log: Mutex<Log>,
    appended: Notify,
}

/// An in-process, single-partition message log with consumer-group semantics.
///
/// [`OrderStream::pull`] always returns the first uncommitted message and waits when there is none, so anything that
/// is not committed is redelivered. Producers append through a [`StreamProducer`]. Clones share the same log and
/// committed offset.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStream {
    shared: Arc<Shared>,
}

/// A cloneable handle that appends messages to a [`MemoryOrderStream`].
#[derive(Debug, Clone)]
pub struct StreamProducer {
    shared: Arc<Shared>,
}

impl MemoryOrderStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn producer(&self) -> StreamProducer {
        StreamProducer { shared: Arc::clone(&self.shared) }
    }

    /// The offset of the next message the consumer will receive.
    pub async fn committed_offset(&self) -> i64 {
        self.shared.log.lock().await.committed
    }

    /// The total number of messages ever appended.
    pub async fn len(&self) -> usize {
        self.shared.log.lock().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// The number of appended messages that have not been committed yet.
    pub async fn pending(&self) -> usize {
        let log = self.shared.log.lock().await;
        let committed = usize::try_from(log.committed).unwrap_or_default();
        log.records.len().saturating_sub(committed)
    }

    /// Makes the next `count` commits fail with [`StreamError::CommitRejected`]. Used to exercise commit-failure
    /// handling.
    pub async fn fail_next_commits(&self, count: u32) {
        self.shared.log.lock().await.failing_commits = count;
    }

    async fn next_uncommitted(&self) -> Result<Option<(StreamRecord, AckToken)>, StreamError> {
        let log = self.shared.log.lock().await;
        let index = usize::try_from(log.committed).unwrap_or_default();
        match log.records.get(index) {
            Some(record) => {
                let token = AckToken { partition: record.partition, offset: record.offset };
                Ok(Some((record.clone(), token)))
            },
            None if log.closed => Err(StreamError::Closed),
            None => Ok(None),
        }
    }
}

impl OrderStream for MemoryOrderStream {
    async fn pull(&self) -> Result<(StreamRecord, AckToken), StreamError> {
        loop {
            let appended = self.shared.appended.notified();
            tokio::pin!(appended);
            // Register interest before checking the log, so an append between the check and the await is not missed
            appended.as_mut().enable();
            if let Some(delivery) = self.next_uncommitted().await? {
                trace!("📥️ Delivering message {}", delivery.1);
                return Ok(delivery);
            }
            appended.await;
        }
    }

    async fn commit(&self, token: &AckToken) -> Result<(), StreamError> {
        let mut log = self.shared.log.lock().await;
        if token.partition != PARTITION {
            return Err(StreamError::CommitRejected(*token, "Unknown partition".into()));
        }
        if token.offset < 0 || token.offset >= log.records.len() as i64 {
            return Err(StreamError::CommitRejected(*token, "Offset has not been delivered".into()));
        }
        if log.failing_commits > 0 {
            log.failing_commits -= 1;
            return Err(StreamError::CommitRejected(*token, "Injected commit failure".into()));
        }
        log.committed = log.committed.max(token.offset + 1);
        trace!("📥️ Committed offset {token}");
        Ok(())
    }
}

impl StreamProducer {
    /// Appends a message to the log and returns its offset.
    pub async fn send(&self, key: Option<String>, payload: Vec<u8>) -> Result<i64, StreamError> {
        let offset = {
            let mut log = self.shared.log.lock().await;
            if log.closed {
                return Err(StreamError::Closed);
            }
            let offset = log.records.len() as i64;
            log.records.push(StreamRecord { key, payload, partition: PARTITION, offset });
            offset
        };
        self.shared.appended.notify_waiters();
        Ok(offset)
    }

    /// Closes the log. Pending messages can still be pulled; once they are committed, [`OrderStream::pull`] returns
    /// [`StreamError::Closed`].
    pub async fn close(&self) {
        self.shared.log.lock().await.closed = true;
        self.shared.appended.notify_waiters();
    }
}

impl OrderPublisher for StreamProducer {
    async fn publish(&self, key: Option<String>, payload: Vec<u8>) -> Result<i64, StreamError> {
        self.send(key, payload).await
    }

    async fn close(&self) {
        StreamProducer::close(self).await;
    }
}
