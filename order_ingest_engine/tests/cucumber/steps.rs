use std::time::Duration;

use cucumber::{given, then, when};
use order_ingest_engine::{
    db_types::OrderId,
    ingestion::MessageState,
    stream::OrderStream,
    Disposition,
    OrderCache,
    OrderStore,
    RetryPolicy,
};
use serde_json::Value;

use crate::{
    cucumber::{world::IngestionSystem, IngestWorld},
    support::fixtures::{order_payload, order_payload_with, sample_order},
};

#[given(expr = "an ingestion pipeline allowing {int} delivery attempts")]
async fn pipeline(world: &mut IngestWorld, attempts: u32) {
    let policy = RetryPolicy::new(Some(attempts), Duration::ZERO);
    world.system = Some(IngestionSystem::new(policy).await);
}

#[given(expr = "the store fails the next {int} inserts")]
async fn store_fails_inserts(world: &mut IngestWorld, count: u32) {
    world.system().store.fail_next_inserts(count);
}

#[given(expr = "order {word} is already stored")]
async fn order_already_stored(world: &mut IngestWorld, id: String) {
    world.system().db.insert_order(&sample_order(&id)).await.expect("Error storing order");
}

#[when(expr = "order {word} is published")]
async fn publish_order(world: &mut IngestWorld, id: String) {
    publish(world, Some(id.clone()), order_payload(&id)).await;
}

#[when(expr = "order {word} is published {int} times")]
async fn publish_order_repeatedly(world: &mut IngestWorld, id: String, times: usize) {
    for _ in 0..times {
        publish(world, Some(id.clone()), order_payload(&id)).await;
    }
}

#[when(expr = "order {word} is published with {word} {string}")]
async fn publish_order_with(world: &mut IngestWorld, id: String, field: String, value: String) {
    let payload = order_payload_with(&id, &field, Value::String(value));
    publish(world, Some(id), payload).await;
}

#[when(expr = "the raw message {string} is published")]
async fn publish_raw(world: &mut IngestWorld, message: String) {
    publish(world, None, message.into_bytes()).await;
}

async fn publish(world: &mut IngestWorld, key: Option<String>, payload: Vec<u8>) {
    world.system().stream.producer().send(key, payload).await.expect("Error publishing message");
}

#[when(expr = "the consumer processes the next message")]
async fn process_next(world: &mut IngestWorld) {
    process(world, 1).await;
}

#[when(expr = "the consumer processes {int} messages")]
async fn process_many(world: &mut IngestWorld, count: usize) {
    process(world, count).await;
}

async fn process(world: &mut IngestWorld, count: usize) {
    for _ in 0..count {
        let next = world.system().consumer.process_next();
        let report = tokio::time::timeout(Duration::from_secs(5), next)
            .await
            .expect("No message was delivered")
            .expect("Error pulling from the stream");
        world.reports.push(report);
    }
}

#[when(expr = "the order service restarts")]
async fn restart(world: &mut IngestWorld) {
    world.system().restart().await;
}

#[then(expr = "the message is committed")]
async fn message_committed(world: &mut IngestWorld) {
    let report = world.last_report();
    assert_eq!(report.state, MessageState::Committed, "{report:?}");
    assert!(report.is_committed());
}

#[then(expr = "the message is not committed")]
async fn message_not_committed(world: &mut IngestWorld) {
    let report = world.last_report().clone();
    assert!(!report.is_committed(), "{report:?}");
    assert!(world.system().stream.committed_offset().await <= report.token.offset);
}

#[then(expr = "the message is dead-lettered")]
async fn message_dead_lettered(world: &mut IngestWorld) {
    let report = world.last_report();
    assert_eq!(report.disposition, Disposition::DeadLetter, "{report:?}");
    assert!(report.is_committed());
}

#[then(expr = "all messages are committed")]
async fn all_committed(world: &mut IngestWorld) {
    assert_eq!(world.system().stream.pending().await, 0);
}

#[then(expr = "the next message to be delivered is at offset {int}")]
async fn next_offset(world: &mut IngestWorld, offset: i64) {
    let (record, token) = world.system().stream.pull().await.expect("Error pulling from the stream");
    assert_eq!(record.offset, offset);
    assert_eq!(token.offset, offset);
}

#[then(expr = "the dead-letter queue holds {int} message(s)")]
async fn dead_letter_count(world: &mut IngestWorld, count: usize) {
    assert_eq!(world.system().dead_letters.len().await, count);
}

#[then(expr = "order {word} is in the store")]
async fn order_stored(world: &mut IngestWorld, id: String) {
    let order = world.system().db.fetch_order_by_id(&OrderId::from(id.as_str())).await.expect("Error fetching order");
    assert_eq!(order, Some(sample_order(&id)));
}

#[then(expr = "order {word} is not in the store")]
async fn order_not_stored(world: &mut IngestWorld, id: String) {
    let order = world.system().db.fetch_order_by_id(&OrderId::from(id)).await.expect("Error fetching order");
    assert!(order.is_none());
}

#[then(expr = "order {word} is in the cache")]
async fn order_cached(world: &mut IngestWorld, id: String) {
    let order = world.system().cache.get(&OrderId::from(id.as_str())).await.expect("Error reading cache");
    assert_eq!(order, Some(sample_order(&id)));
}

#[then(expr = "the store holds {int} order(s)")]
async fn store_count(world: &mut IngestWorld, count: u64) {
    assert_eq!(world.system().db.count_orders().await.unwrap(), count);
}

#[then(expr = "looking up order {word} returns customer {string}")]
async fn lookup(world: &mut IngestWorld, id: String, customer: String) {
    let order = world.system().service.get_order_by_id(&OrderId::from(id)).await.expect("Error looking up order");
    assert_eq!(order.map(|o| o.customer_id), Some(customer));
}
