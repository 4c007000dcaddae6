//! Store, cache and sink doubles that fail on demand.
use std::{
    sync::{
        atomic::{AtomicBool, AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use order_ingest_engine::{
    db_types::{Order, OrderId},
    stream::{DeadLetter, DeadLetterSink, StreamError},
    CacheError,
    InsertOrderResult,
    MemoryOrderCache,
    MemoryOrderStore,
    OrderCache,
    OrderStore,
    StoreError,
};

fn unavailable() -> StoreError {
    StoreError::DatabaseError("injected store failure".into())
}

#[derive(Debug, Default)]
struct StoreFaults {
    failing_inserts: AtomicU32,
    failing_reads: AtomicBool,
    reads: AtomicU32,
}

/// Wraps an [`OrderStore`] and fails inserts or reads on request. Counts point reads.
#[derive(Debug, Clone, Default)]
pub struct FlakyStore<S = MemoryOrderStore> {
    inner: S,
    faults: Arc<StoreFaults>,
}

impl<S> FlakyStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, faults: Arc::default() }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn fail_next_inserts(&self, count: u32) {
        self.faults.failing_inserts.store(count, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.faults.failing_reads.store(fail, Ordering::SeqCst);
    }

    /// The number of `fetch_order_by_id` calls made so far.
    pub fn point_reads(&self) -> u32 {
        self.faults.reads.load(Ordering::SeqCst)
    }

    fn take_insert_failure(&self) -> bool {
        self.faults.failing_inserts.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok()
    }

    fn reads_fail(&self) -> bool {
        self.faults.failing_reads.load(Ordering::SeqCst)
    }
}

impl<S: OrderStore> OrderStore for FlakyStore<S> {
    async fn insert_order(&self, order: &Order) -> Result<InsertOrderResult, StoreError> {
        if self.take_insert_failure() {
            return Err(unavailable());
        }
        self.inner.insert_order(order).await
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.faults.reads.fetch_add(1, Ordering::SeqCst);
        if self.reads_fail() {
            return Err(unavailable());
        }
        self.inner.fetch_order_by_id(order_id).await
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        if self.reads_fail() {
            return Err(unavailable());
        }
        self.inner.fetch_all_orders().await
    }

    async fn fetch_orders_page(&self, after: Option<OrderId>, limit: usize) -> Result<Vec<Order>, StoreError> {
        if self.reads_fail() {
            return Err(unavailable());
        }
        self.inner.fetch_orders_page(after, limit).await
    }

    async fn count_orders(&self) -> Result<u64, StoreError> {
        self.inner.count_orders().await
    }
}

#[derive(Debug, Default)]
struct CacheFaults {
    failing_sets: AtomicU32,
    failing_gets: AtomicBool,
}

/// Wraps a [`MemoryOrderCache`] and fails writes or reads on request.
#[derive(Debug, Clone, Default)]
pub struct FlakyCache {
    inner: MemoryOrderCache,
    faults: Arc<CacheFaults>,
}

impl FlakyCache {
    pub fn new(inner: MemoryOrderCache) -> Self {
        Self { inner, faults: Arc::default() }
    }

    pub fn inner(&self) -> &MemoryOrderCache {
        &self.inner
    }

    pub fn fail_next_sets(&self, count: u32) {
        self.faults.failing_sets.store(count, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.faults.failing_gets.store(fail, Ordering::SeqCst);
    }
}

impl OrderCache for FlakyCache {
    async fn set(&self, order_id: &OrderId, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        let fail =
            self.faults.failing_sets.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if fail {
            return Err(CacheError::Unavailable("injected cache failure".into()));
        }
        self.inner.set(order_id, order, ttl).await
    }

    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>, CacheError> {
        if self.faults.failing_gets.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("injected cache failure".into()));
        }
        self.inner.get(order_id).await
    }

    async fn delete(&self, order_id: &OrderId) -> Result<(), CacheError> {
        self.inner.delete(order_id).await
    }
}

/// A dead-letter sink that refuses everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingSink;

impl DeadLetterSink for RejectingSink {
    async fn publish(&self, _letter: DeadLetter) -> Result<(), StreamError> {
        Err(StreamError::DeadLetterRejected("injected sink failure".into()))
    }
}
