use std::fmt::Display;

use thiserror::Error;

/// A single message as delivered by the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl StreamRecord {
    /// The payload as text, with invalid UTF-8 replaced. Only intended for log output.
    pub fn payload_lossy(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Identifies a delivered message for the purpose of committing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AckToken {
    pub partition: i32,
    pub offset: i64,
}

impl Display for AckToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.partition, self.offset)
    }
}

#[allow(async_fn_in_trait)]
pub trait OrderStream {
    /// Waits for the next message to process. Until a message is committed, the same message is returned again.
    ///
    /// Dropping the returned future before it completes must not lose or skip any message.
    async fn pull(&self) -> Result<(StreamRecord, AckToken), StreamError>;

    /// Marks the message identified by `token`, and every message before it in the same partition, as processed.
    async fn commit(&self, token: &AckToken) -> Result<(), StreamError>;
}

/// The producing side of an order stream.
#[allow(async_fn_in_trait)]
pub trait OrderPublisher {
    /// Appends a message and returns its offset.
    async fn publish(&self, key: Option<String>, payload: Vec<u8>) -> Result<i64, StreamError>;

    /// Stops accepting new messages. Messages already published are still delivered.
    async fn close(&self);
}

#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("The stream has been closed")]
    Closed,
    #[error("Stream transport error: {0}")]
    Transport(String),
    #[error("Could not commit offset {0}. {1}")]
    CommitRejected(AckToken, String),
    #[error("The message could not be delivered to the dead-letter sink. {0}")]
    DeadLetterRejected(String),
}

impl From<sqlx::Error> for StreamError {
    fn from(e: sqlx::Error) -> Self {
        StreamError::Transport(e.to_string())
    }
}
