use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::{new_pool, orders, SqliteDatabaseError};
use crate::{
    db::traits::{InsertOrderResult, OrderStore, StoreError},
    db_types::{Order, OrderId},
};

/// The SQLite-backed system of record.
#[derive(Clone)]
pub struct SqliteOrderStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteOrderStore ({:?})", self.pool)
    }
}

impl SqliteOrderStore {
    /// Creates a new store backed by the database at `url`, creating the database file if necessary.
    /// Migrations are not run; call [`SqliteOrderStore::run_migrations`] for that.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Applies the embedded schema migrations. Already-applied migrations are skipped.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl OrderStore for SqliteOrderStore {
    async fn insert_order(&self, order: &Order) -> Result<InsertOrderResult, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::idempotent_insert(order, &mut conn).await?;
        Ok(result)
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_all_orders(&self) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_all_orders(&mut conn).await?;
        Ok(orders)
    }

    async fn fetch_orders_page(&self, after: Option<OrderId>, limit: usize) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_page(after.as_ref(), limit, &mut conn).await?;
        trace!("🗃️ Fetched a page of {} orders after {after:?}", orders.len());
        Ok(orders)
    }

    async fn count_orders(&self) -> Result<u64, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let count = orders::count_orders(&mut conn).await?;
        Ok(count)
    }
}
