use thiserror::Error;

use crate::{
    db::traits::InsertOrderResult,
    db_types::{Order, OrderId},
};

/// The durable system of record for orders.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Stores a new order. This call is idempotent: if an order with the same id already exists, nothing is written
    /// and [`InsertOrderResult::AlreadyExists`] is returned. Existing orders are never updated.
    async fn insert_order(&self, order: &Order) -> Result<InsertOrderResult, StoreError>;

    /// Fetches a single order. Returns `None` if no order with this id exists.
    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;

    /// Fetches every stored order. The size of the result is bounded only by the number of rows in the store.
    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;

    /// Keyset range read: at most `limit` orders with ids strictly greater than `after` (or from the start if `None`),
    /// in ascending id order.
    async fn fetch_orders_page(&self, after: Option<OrderId>, limit: usize) -> Result<Vec<Order>, StoreError>;

    async fn count_orders(&self) -> Result<u64, StoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("We have an internal database engine (configuration/uptime etc.) error: {0}")]
    DatabaseError(String),
    #[error("The stored record for order {0} could not be decoded. {1}")]
    CorruptRecord(OrderId, String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::DatabaseError(e.to_string())
    }
}
