use std::{
    fmt::Debug,
    sync::Arc,
    time::{Duration, Instant},
};

use log::*;
use moka::{future::Cache, Expiry};

use crate::{
    db::traits::{CacheError, OrderCache},
    db_types::{Order, OrderId},
};

/// Upper bound on the number of orders held when no capacity is given.
pub const DEFAULT_CACHE_CAPACITY: u64 = 100_000;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Arc<str>,
    ttl: Duration,
}

impl CacheEntry {
    fn time_to_live(&self) -> Option<Duration> {
        (!self.ttl.is_zero()).then_some(self.ttl)
    }
}

/// Each entry lives for the TTL it was written with. Overwriting an entry restarts its clock.
struct PerEntryTtl;

impl Expiry<OrderId, CacheEntry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &OrderId, value: &CacheEntry, _created_at: Instant) -> Option<Duration> {
        value.time_to_live()
    }

    fn expire_after_update(
        &self,
        _key: &OrderId,
        value: &CacheEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.time_to_live()
    }
}

/// A bounded, expiring key-value cache held in process memory, backed by [`moka`].
///
/// Entries are stored serialized, as they would be in an external key-value store, so a read always returns a fresh
/// copy. A `ttl` of zero means the entry never expires. Expired entries are evicted by the cache's own housekeeping
/// whether or not they are read again, and the least useful entries are evicted once the capacity is reached.
///
/// Clones share the same underlying cache.
#[derive(Clone)]
pub struct MemoryOrderCache {
    entries: Cache<OrderId, CacheEntry>,
}

impl Debug for MemoryOrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MemoryOrderCache ({} entries)", self.entries.entry_count())
    }
}

impl Default for MemoryOrderCache {
    fn default() -> Self {
        Self::with_max_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl MemoryOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder().max_capacity(max_entries).expire_after(PerEntryTtl).build();
        Self { entries }
    }

    /// The number of live entries. Pending evictions are applied first, so expired entries are not counted.
    pub async fn len(&self) -> usize {
        self.entries.run_pending_tasks().await;
        usize::try_from(self.entries.entry_count()).unwrap_or(usize::MAX)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl OrderCache for MemoryOrderCache {
    async fn set(&self, order_id: &OrderId, order: &Order, ttl: Duration) -> Result<(), CacheError> {
        let payload = Arc::from(serde_json::to_string(order)?);
        self.entries.insert(order_id.clone(), CacheEntry { payload, ttl }).await;
        trace!("⚡️ Cached order {order_id}");
        Ok(())
    }

    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>, CacheError> {
        match self.entries.get(order_id).await {
            Some(entry) => Ok(Some(serde_json::from_str(&entry.payload)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, order_id: &OrderId) -> Result<(), CacheError> {
        self.entries.invalidate(order_id).await;
        Ok(())
    }
}
