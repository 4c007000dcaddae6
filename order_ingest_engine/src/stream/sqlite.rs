use std::{
    fmt::Debug,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use sqlx::SqlitePool;
use tokio::sync::Notify;

use crate::{
    db::sqlite::stream_messages::{self, PARTITION},
    stream::{AckToken, OrderPublisher, OrderStream, StreamError, StreamRecord},
};

/// How often [`SqliteOrderStream::pull`] looks for messages written by other processes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct Shared {
    appended: Notify,
    closed: AtomicBool,
}

/// A durable, single-partition order stream kept in the order database.
///
/// Messages and the consumer group's committed offset live in the `stream_messages` and `stream_offsets` tables, so
/// anything that was published but not committed is redelivered after a restart. Committed messages are deleted.
/// Producers in this process wake a waiting [`OrderStream::pull`] immediately; rows written by anyone else are
/// picked up on the next poll.
#[derive(Clone)]
pub struct SqliteOrderStream {
    pool: SqlitePool,
    group: String,
    poll_interval: Duration,
    shared: Arc<Shared>,
}

impl Debug for SqliteOrderStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteOrderStream ({})", self.group)
    }
}

/// Appends messages to a [`SqliteOrderStream`].
#[derive(Clone)]
pub struct SqliteStreamProducer {
    pool: SqlitePool,
    shared: Arc<Shared>,
}

impl Debug for SqliteStreamProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteStreamProducer")
    }
}

impl SqliteOrderStream {
    /// Creates a stream over the order database behind `pool`. The tables are created by the order store's
    /// migrations.
    pub fn new(pool: SqlitePool, group: &str) -> Self {
        Self { pool, group: group.to_string(), poll_interval: DEFAULT_POLL_INTERVAL, shared: Arc::default() }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn producer(&self) -> SqliteStreamProducer {
        SqliteStreamProducer { pool: self.pool.clone(), shared: Arc::clone(&self.shared) }
    }

    /// The offset of the next message the consumer group will receive.
    pub async fn committed_offset(&self) -> Result<i64, StreamError> {
        let mut conn = self.pool.acquire().await?;
        let next = stream_messages::next_offset(&self.group, &mut conn).await?;
        Ok(next)
    }

    /// The number of messages that have not been committed yet.
    pub async fn pending(&self) -> Result<u64, StreamError> {
        let mut conn = self.pool.acquire().await?;
        let count = stream_messages::count_uncommitted(&self.group, &mut conn).await?;
        Ok(count)
    }

    async fn next_uncommitted(&self) -> Result<Option<(StreamRecord, AckToken)>, StreamError> {
        let mut conn = self.pool.acquire().await?;
        let record = stream_messages::first_uncommitted(&self.group, &mut conn).await?;
        match record {
            Some(record) => {
                let token = AckToken { partition: record.partition, offset: record.offset };
                Ok(Some((record, token)))
            },
            None if self.shared.closed.load(Ordering::SeqCst) => Err(StreamError::Closed),
            None => Ok(None),
        }
    }
}

impl OrderStream for SqliteOrderStream {
    async fn pull(&self) -> Result<(StreamRecord, AckToken), StreamError> {
        loop {
            let appended = self.shared.appended.notified();
            tokio::pin!(appended);
            appended.as_mut().enable();
            if let Some(delivery) = self.next_uncommitted().await? {
                trace!("📥️ Delivering message {}", delivery.1);
                return Ok(delivery);
            }
            let _ = tokio::time::timeout(self.poll_interval, appended).await;
        }
    }

    async fn commit(&self, token: &AckToken) -> Result<(), StreamError> {
        if token.partition != PARTITION {
            return Err(StreamError::CommitRejected(*token, "Unknown partition".into()));
        }
        let mut tx = self.pool.begin().await?;
        let next = stream_messages::next_offset(&self.group, &mut tx).await?;
        if token.offset < next {
            trace!("📥️ Offset {token} was already committed");
            return Ok(());
        }
        if !stream_messages::message_exists(token.offset, &mut tx).await? {
            return Err(StreamError::CommitRejected(*token, "Offset has not been delivered".into()));
        }
        stream_messages::advance_offset(&self.group, token.offset + 1, &mut tx).await?;
        let removed = stream_messages::delete_before(token.offset + 1, &mut tx).await?;
        tx.commit().await?;
        trace!("📥️ Committed offset {token}. {removed} message(s) removed from the log.");
        Ok(())
    }
}

impl SqliteStreamProducer {
    /// Appends a message to the stream and returns its offset.
    pub async fn send(&self, key: Option<String>, payload: Vec<u8>) -> Result<i64, StreamError> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(StreamError::Closed);
        }
        let mut conn = self.pool.acquire().await?;
        let offset = stream_messages::append(key.as_deref(), &payload, &mut conn).await?;
        self.shared.appended.notify_waiters();
        Ok(offset)
    }

    /// Stops accepting messages. Pending messages stay in the database and can still be pulled; once they are
    /// committed, [`OrderStream::pull`] returns [`StreamError::Closed`].
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.appended.notify_waiters();
    }
}

impl OrderPublisher for SqliteStreamProducer {
    async fn publish(&self, key: Option<String>, payload: Vec<u8>) -> Result<i64, StreamError> {
        self.send(key, payload).await
    }

    async fn close(&self) {
        SqliteStreamProducer::close(self);
    }
}
