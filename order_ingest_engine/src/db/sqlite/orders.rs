//! Query functions for the `orders` table.
//!
//! Each function takes a bare connection, so calls can be composed inside a transaction by passing `&mut *tx`.
use log::{debug, trace};
use serde::{de::DeserializeOwned, Serialize};
use sqlx::{FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::InsertOrderResult},
    db_types::{Order, OrderId},
};

const SELECT_ORDERS: &str = r#"
    SELECT
        order_uid,
        track_number,
        entry,
        delivery,
        payment,
        items,
        locale,
        internal_signature,
        customer_id,
        delivery_service,
        shardkey,
        sm_id,
        date_created,
        oof_shard
    FROM orders
"#;

#[derive(Debug, FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    delivery: String,
    payment: String,
    items: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: Option<i64>,
    date_created: String,
    oof_shard: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = SqliteDatabaseError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_id = OrderId::from(row.order_uid);
        Ok(Order {
            delivery: from_json(&order_id, "delivery", &row.delivery)?,
            payment: from_json(&order_id, "payment", &row.payment)?,
            items: from_json(&order_id, "items", &row.items)?,
            order_id,
            track_number: row.track_number,
            entry: row.entry,
            locale: row.locale,
            internal_signature: row.internal_signature,
            customer_id: row.customer_id,
            delivery_service: row.delivery_service,
            shard_key: row.shardkey,
            sm_id: row.sm_id,
            date_created: row.date_created,
            oof_shard: row.oof_shard,
        })
    }
}

fn from_json<T: DeserializeOwned>(order_id: &OrderId, column: &str, value: &str) -> Result<T, SqliteDatabaseError> {
    serde_json::from_str(value)
        .map_err(|e| SqliteDatabaseError::DecodingError(order_id.clone(), format!("Column '{column}': {e}")))
}

fn to_json<T: Serialize>(order_id: &OrderId, value: &T) -> Result<String, SqliteDatabaseError> {
    serde_json::to_string(value).map_err(|e| SqliteDatabaseError::EncodingError(order_id.clone(), e.to_string()))
}

/// Inserts the order if no order with the same `order_uid` exists. A conflicting insert is silently ignored by the
/// database, so concurrent duplicate inserts cannot race each other into an error.
pub async fn idempotent_insert(
    order: &Order,
    conn: &mut SqliteConnection,
) -> Result<InsertOrderResult, SqliteDatabaseError> {
    let id = &order.order_id;
    let delivery = to_json(id, &order.delivery)?;
    let payment = to_json(id, &order.payment)?;
    let items = to_json(id, &order.items)?;
    let result = sqlx::query(
        r#"
            INSERT INTO orders (
                order_uid,
                track_number,
                entry,
                delivery,
                payment,
                items,
                locale,
                internal_signature,
                customer_id,
                delivery_service,
                shardkey,
                sm_id,
                date_created,
                oof_shard
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (order_uid) DO NOTHING;
        "#,
    )
    .bind(id.as_str())
    .bind(&order.track_number)
    .bind(&order.entry)
    .bind(delivery)
    .bind(payment)
    .bind(items)
    .bind(&order.locale)
    .bind(&order.internal_signature)
    .bind(&order.customer_id)
    .bind(&order.delivery_service)
    .bind(&order.shard_key)
    .bind(order.sm_id)
    .bind(&order.date_created)
    .bind(&order.oof_shard)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        debug!("🗃️ Order {id} already exists. Insert skipped.");
        Ok(InsertOrderResult::AlreadyExists)
    } else {
        debug!("🗃️ Order {id} has been saved in the DB");
        Ok(InsertOrderResult::Inserted)
    }
}

pub async fn fetch_order_by_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(SELECT_ORDERS);
    builder.push(" WHERE order_uid = ");
    builder.push_bind(order_id.as_str());
    let row = builder.build_query_as::<OrderRow>().fetch_optional(conn).await?;
    row.map(Order::try_from).transpose()
}

pub async fn fetch_all_orders(conn: &mut SqliteConnection) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(SELECT_ORDERS);
    builder.push(" ORDER BY order_uid ASC");
    let rows = builder.build_query_as::<OrderRow>().fetch_all(conn).await?;
    trace!("🗃️ fetch_all_orders returned {} rows", rows.len());
    rows.into_iter().map(Order::try_from).collect()
}

/// Returns at most `limit` orders whose id sorts strictly after `after`, in ascending id order.
pub async fn fetch_orders_page(
    after: Option<&OrderId>,
    limit: usize,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new(SELECT_ORDERS);
    if let Some(id) = after {
        builder.push(" WHERE order_uid > ");
        builder.push_bind(id.as_str());
    }
    builder.push(" ORDER BY order_uid ASC LIMIT ");
    builder.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderRow>().fetch_all(conn).await?;
    rows.into_iter().map(Order::try_from).collect()
}

pub async fn count_orders(conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(conn).await?;
    Ok(u64::try_from(count).unwrap_or_default())
}
