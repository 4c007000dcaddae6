use std::time::Duration;

use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    db::traits::{OrderCache, OrderStore},
    db_types::{Order, OrderId},
    ingestion::{Disposition, IngestError, RetryPolicy},
    oie_api::{errors::OrderServiceError, order_service::OrderService, service_objects::CreateOrderOutcome},
    stream::{AckToken, DeadLetter, DeadLetterSink, OrderStream, StreamError, StreamRecord},
};

/// The furthest a message got through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageState {
    Received,
    Validated,
    Persisted,
    Cached,
    Committed,
    /// The message could not be parsed or failed validation.
    Rejected,
    /// The message was valid but could not be stored.
    Failed,
}

/// What happened to a single message.
#[derive(Debug, Clone)]
pub struct MessageReport {
    pub token: AckToken,
    pub attempt: u32,
    pub state: MessageState,
    pub disposition: Disposition,
    pub order_id: Option<OrderId>,
    pub error: Option<IngestError>,
}

impl MessageReport {
    /// True if the offset of this message was committed, either after storing it or after dead-lettering it.
    pub fn is_committed(&self) -> bool {
        match self.disposition {
            Disposition::Commit => self.state == MessageState::Committed,
            Disposition::DeadLetter => !matches!(self.error, Some(IngestError::CommitFailure(..))),
            Disposition::Retry => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub processed: u64,
    pub committed: u64,
    pub retried: u64,
    pub dead_lettered: u64,
    pub commit_failures: u64,
}

/// Reads orders from a stream and persists them through the [`OrderService`], one message at a time.
pub struct IngestionConsumer<T, S, C, D> {
    stream: T,
    service: OrderService<S, C>,
    dead_letters: D,
    policy: RetryPolicy,
    head_of_line: Option<(AckToken, u32)>,
    stats: ConsumerStats,
}

impl<T, S, C, D> IngestionConsumer<T, S, C, D> {
    pub fn new(stream: T, service: OrderService<S, C>, dead_letters: D, policy: RetryPolicy) -> Self {
        Self { stream, service, dead_letters, policy, head_of_line: None, stats: ConsumerStats::default() }
    }

    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Counts delivery attempts of the message at the head of the line. The count restarts whenever a different
    /// message is delivered.
    fn register_attempt(&mut self, token: &AckToken) -> u32 {
        match &mut self.head_of_line {
            Some((head, attempts)) if head == token => {
                *attempts += 1;
                *attempts
            },
            _ => {
                self.head_of_line = Some((*token, 1));
                1
            },
        }
    }
}

impl<T, S, C, D> IngestionConsumer<T, S, C, D>
where
    T: OrderStream,
    S: OrderStore,
    C: OrderCache,
    D: DeadLetterSink,
{
    /// Runs the consumer loop until `shutdown` is cancelled or the stream closes.
    ///
    /// Cancellation is checked before every pull. A message that has already been pulled is always processed to
    /// completion before the loop exits.
    pub async fn run(mut self, shutdown: CancellationToken) -> ConsumerStats {
        info!("📥️ Ingestion consumer started. {:?}", self.policy);
        loop {
            let delivery = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("📥️ Shutdown requested. Ingestion consumer is stopping.");
                    break;
                },
                delivery = self.stream.pull() => delivery,
            };
            let pause = match delivery {
                Ok((record, token)) => {
                    let report = self.process(record, token).await;
                    let commit_failed = matches!(report.error, Some(IngestError::CommitFailure(..)));
                    report.disposition == Disposition::Retry || commit_failed
                },
                Err(StreamError::Closed) => {
                    info!("📥️ The order stream has closed. Ingestion consumer is stopping.");
                    break;
                },
                Err(e) => {
                    warn!("📥️ Could not pull from the order stream. {e}");
                    true
                },
            };
            if pause && !self.backoff(&shutdown).await {
                info!("📥️ Shutdown requested during backoff. Ingestion consumer is stopping.");
                break;
            }
        }
        info!("📥️ Ingestion consumer stopped. {:?}", self.stats);
        self.stats
    }

    /// Sleeps for the retry backoff. Returns false if shutdown was requested in the meantime.
    async fn backoff(&self, shutdown: &CancellationToken) -> bool {
        if self.policy.backoff == Duration::ZERO {
            return !shutdown.is_cancelled();
        }
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.policy.backoff) => true,
        }
    }

    /// Pulls and processes exactly one message.
    pub async fn process_next(&mut self) -> Result<MessageReport, StreamError> {
        let (record, token) = self.stream.pull().await?;
        Ok(self.process(record, token).await)
    }

    /// Drives a single delivered message through the pipeline and applies its disposition.
    pub async fn process(&mut self, record: StreamRecord, token: AckToken) -> MessageReport {
        let attempt = self.register_attempt(&token);
        self.stats.processed += 1;
        trace!("📥️ Processing message {token} (attempt {attempt})");
        let mut report = MessageReport {
            token,
            attempt,
            state: MessageState::Received,
            disposition: Disposition::Retry,
            order_id: None,
            error: None,
        };
        match self.ingest(&record, &mut report).await {
            Ok(outcome) => {
                report.disposition = Disposition::Commit;
                debug!(
                    "📥️ Order {} from {token} ingested (inserted: {}, cached: {})",
                    outcome.order_id,
                    outcome.inserted(),
                    outcome.cache.is_written()
                );
                self.commit(&mut report).await;
            },
            Err(e) => {
                report.disposition = self.policy.disposition_for(&e, attempt);
                match report.disposition {
                    Disposition::DeadLetter => self.dead_letter(record, e, &mut report).await,
                    _ => {
                        warn!("📥️ Message {token} will be redelivered (attempt {attempt}). {e}");
                        self.stats.retried += 1;
                        report.error = Some(e);
                    },
                }
            },
        }
        report
    }

    async fn ingest(
        &self,
        record: &StreamRecord,
        report: &mut MessageReport,
    ) -> Result<CreateOrderOutcome, IngestError> {
        let order = serde_json::from_slice::<Order>(&record.payload).map_err(|e| {
            report.state = MessageState::Rejected;
            IngestError::MalformedMessage(e.to_string())
        })?;
        let order_id = order.order_id.clone();
        report.order_id = Some(order_id.clone());
        if let Err(e) = self.service.validator().validate(&order) {
            report.state = MessageState::Rejected;
            return Err(IngestError::ValidationFailure(order_id, e));
        }
        report.state = MessageState::Validated;
        let outcome = self.service.store_validated(&order).await.map_err(|e| match e {
            OrderServiceError::ValidationError(e) => {
                report.state = MessageState::Rejected;
                IngestError::ValidationFailure(order_id.clone(), e)
            },
            OrderServiceError::PersistenceError(id, e) | OrderServiceError::LookupError(id, e) => {
                report.state = MessageState::Failed;
                IngestError::PersistenceFailure(id, e)
            },
        })?;
        report.state = if outcome.cache.is_written() { MessageState::Cached } else { MessageState::Persisted };
        Ok(outcome)
    }

    async fn commit(&mut self, report: &mut MessageReport) {
        match self.stream.commit(&report.token).await {
            Ok(()) => {
                report.state = MessageState::Committed;
                self.stats.committed += 1;
                self.head_of_line = None;
            },
            Err(e) => {
                warn!("📥️ Could not commit {}. The message will be redelivered. {e}", report.token);
                self.stats.commit_failures += 1;
                report.error = Some(IngestError::CommitFailure(report.token, e));
            },
        }
    }

    async fn dead_letter(&mut self, record: StreamRecord, error: IngestError, report: &mut MessageReport) {
        let token = report.token;
        let letter = DeadLetter { record, reason: error.to_string(), attempts: report.attempt };
        report.error = Some(error);
        if let Err(e) = self.dead_letters.publish(letter).await {
            error!("📥️ The dead-letter sink refused message {token}. It will be redelivered. {e}");
            report.disposition = Disposition::Retry;
            self.stats.retried += 1;
            return;
        }
        match self.stream.commit(&token).await {
            Ok(()) => {
                warn!("📥️ Message {token} was dead-lettered after {} attempts", report.attempt);
                self.stats.dead_lettered += 1;
                self.head_of_line = None;
            },
            Err(e) => {
                warn!("📥️ Message {token} was dead-lettered but could not be committed. {e}");
                self.stats.commit_failures += 1;
                report.error = Some(IngestError::CommitFailure(token, e));
            },
        }
    }
}
