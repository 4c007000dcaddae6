use std::time::Duration;

use log::*;
use order_ingest_engine::{
    stream::{LogDeadLetterSink, SqliteOrderStream},
    ConsumerStats,
    IngestionConsumer,
    MemoryOrderCache,
    OrderService,
    RetryPolicy,
    SqliteOrderStore,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Starts the ingestion consumer in the background. It runs until `shutdown` is cancelled or the stream closes, and
/// the returned handle yields the consumer's final statistics.
pub fn start_ingestion_worker(
    stream: SqliteOrderStream,
    service: OrderService<SqliteOrderStore, MemoryOrderCache>,
    policy: RetryPolicy,
    shutdown: CancellationToken,
) -> JoinHandle<ConsumerStats> {
    tokio::spawn(async move {
        let consumer = IngestionConsumer::new(stream, service, LogDeadLetterSink, policy);
        consumer.run(shutdown).await
    })
}

/// Asks the ingestion worker to stop and waits up to `grace` for it to finish its in-flight message. A worker that is
/// still busy after that is aborted.
pub async fn stop_ingestion_worker(
    mut handle: JoinHandle<ConsumerStats>,
    shutdown: &CancellationToken,
    grace: Duration,
) -> Option<ConsumerStats> {
    shutdown.cancel();
    match tokio::time::timeout(grace, &mut handle).await {
        Ok(Ok(stats)) => {
            info!(
                "📥️ Ingestion worker finished. {} messages processed, {} committed, {} retried, {} dead-lettered, {} \
                 commit failures.",
                stats.processed, stats.committed, stats.retried, stats.dead_lettered, stats.commit_failures
            );
            Some(stats)
        },
        Ok(Err(e)) => {
            error!("📥️ Ingestion worker crashed. {e}");
            None
        },
        Err(_) => {
            warn!("📥️ Ingestion worker did not stop within {grace:?}. Aborting it.");
            handle.abort();
            None
        },
    }
}
