use std::time::Duration;

use thiserror::Error;

use crate::db_types::{Order, OrderId};

/// A fast key-value side store holding a derived, expiring projection of the durable store.
#[allow(async_fn_in_trait)]
pub trait OrderCache {
    /// Writes `order` under `order_id`, replacing any existing entry. Entries expire after `ttl`.
    async fn set(&self, order_id: &OrderId, order: &Order, ttl: Duration) -> Result<(), CacheError>;

    /// Reads an entry. A missing or expired entry is `Ok(None)`.
    async fn get(&self, order_id: &OrderId) -> Result<Option<Order>, CacheError>;

    async fn delete(&self, order_id: &OrderId) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("The cache backend is unavailable. {0}")]
    Unavailable(String),
    #[error("Could not encode or decode the cache entry. {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::Serialization(e.to_string())
    }
}
