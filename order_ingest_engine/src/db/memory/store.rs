use std::{collections::BTreeMap, ops::Bound, sync::Arc};

use log::*;
use tokio::sync::RwLock;

use crate::{
    db::traits::{InsertOrderResult, OrderStore, StoreError},
    db_types::{Order, OrderId},
};

/// A non-durable [`OrderStore`] holding orders in a sorted map. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryOrderStore {
    orders: Arc<RwLock<BTreeMap<OrderId, Order>>>,
}

impl MemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderStore for MemoryOrderStore {
    async fn insert_order(&self, order: &Order) -> Result<InsertOrderResult, StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_id) {
            debug!("🗃️ Order {} already exists. Insert skipped.", order.order_id);
            return Ok(InsertOrderResult::AlreadyExists);
        }
        orders.insert(order.order_id.clone(), order.clone());
        debug!("🗃️ Order {} has been saved in memory", order.order_id);
        Ok(InsertOrderResult::Inserted)
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.read().await.get(order_id).cloned())
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.read().await.values().cloned().collect())
    }

    async fn fetch_orders_page(&self, after: Option<OrderId>, limit: usize) -> Result<Vec<Order>, StoreError> {
        let orders = self.orders.read().await;
        let lower = match after {
            Some(id) => Bound::Excluded(id),
            None => Bound::Unbounded,
        };
        Ok(orders.range((lower, Bound::Unbounded)).take(limit).map(|(_, o)| o.clone()).collect())
    }

    async fn count_orders(&self) -> Result<u64, StoreError> {
        Ok(self.orders.read().await.len() as u64)
    }
}
