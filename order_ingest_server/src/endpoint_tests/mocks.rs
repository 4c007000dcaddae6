use std::time::Duration;

use mockall::mock;
use order_ingest_engine::{
    db_types::{Order, OrderId},
    CacheError,
    InsertOrderResult,
    OrderCache,
    OrderStore,
    StoreError,
};

mock! {
    pub Store {}
    impl OrderStore for Store {
        async fn insert_order(&self, order: &Order) -> Result<InsertOrderResult, StoreError>;
        async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError>;
        async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError>;
        async fn fetch_orders_page(&self, after: Option<OrderId>, limit: usize) -> Result<Vec<Order>, StoreError>;
        async fn count_orders(&self) -> Result<u64, StoreError>;
    }
}

mock! {
    pub Cache {}
    impl OrderCache for Cache {
        async fn set(&self, order_id: &OrderId, order: &Order, ttl: Duration) -> Result<(), CacheError>;
        async fn get(&self, order_id: &OrderId) -> Result<Option<Order>, CacheError>;
        async fn delete(&self, order_id: &OrderId) -> Result<(), CacheError>;
    }
}
