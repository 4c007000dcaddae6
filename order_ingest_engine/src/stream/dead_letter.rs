use std::sync::Arc;

use log::*;
use tokio::sync::Mutex;

use crate::stream::{StreamError, StreamRecord};

/// A message that could not be processed, together with the reason and the number of delivery attempts made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetter {
    pub record: StreamRecord,
    pub reason: String,
    pub attempts: u32,
}

/// Destination for messages that will never succeed. The consumer only commits a dead-lettered message once the sink
/// has accepted it.
#[allow(async_fn_in_trait)]
pub trait DeadLetterSink {
    async fn publish(&self, letter: DeadLetter) -> Result<(), StreamError>;
}

/// Keeps dead letters in memory so they can be inspected. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct MemoryDeadLetterQueue {
    letters: Arc<Mutex<Vec<DeadLetter>>>,
}

impl MemoryDeadLetterQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn letters(&self) -> Vec<DeadLetter> {
        self.letters.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.letters.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.letters.lock().await.is_empty()
    }
}

impl DeadLetterSink for MemoryDeadLetterQueue {
    async fn publish(&self, letter: DeadLetter) -> Result<(), StreamError> {
        debug!("📥️ Message {} moved to the dead-letter queue", letter.record.offset);
        self.letters.lock().await.push(letter);
        Ok(())
    }
}

/// Writes dead letters to the error log and accepts them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeadLetterSink;

impl DeadLetterSink for LogDeadLetterSink {
    async fn publish(&self, letter: DeadLetter) -> Result<(), StreamError> {
        error!(
            "📥️ DEAD LETTER. Message at {}@{} gave up after {} attempts. Reason: {}. Payload: {}",
            letter.record.partition,
            letter.record.offset,
            letter.attempts,
            letter.reason,
            letter.record.payload_lossy()
        );
        Ok(())
    }
}
