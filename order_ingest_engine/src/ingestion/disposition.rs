use std::time::Duration;

use crate::ingestion::IngestError;

pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// What the consumer does with a message once it has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Commit,
    Retry,
    DeadLetter,
}

/// Governs how often a permanently failing message is redelivered before it is dead-lettered.
///
/// Transient failures (the store being unavailable) are always retried, no matter how many attempts have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The number of deliveries a malformed or invalid message gets. `None` retries forever.
    pub max_attempts: Option<u32>,
    /// Pause before the next pull after a retry.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: Some(DEFAULT_MAX_DELIVERY_ATTEMPTS), backoff: DEFAULT_RETRY_BACKOFF }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: Option<u32>, backoff: Duration) -> Self {
        Self { max_attempts, backoff }
    }

    pub fn retry_forever(backoff: Duration) -> Self {
        Self { max_attempts: None, backoff }
    }

    /// Decides the disposition of a message that failed with `error` on its `attempt`th delivery (counting from 1).
    pub fn disposition_for(&self, error: &IngestError, attempt: u32) -> Disposition {
        if !error.is_permanent() {
            return Disposition::Retry;
        }
        match self.max_attempts {
            Some(max) if attempt >= max => Disposition::DeadLetter,
            _ => Disposition::Retry,
        }
    }
}
