//! Query functions for the `stream_messages` and `stream_offsets` tables.
use log::trace;
use sqlx::{FromRow, SqliteConnection};

use crate::{db::sqlite::SqliteDatabaseError, stream::StreamRecord};

pub const PARTITION: i32 = 0;

#[derive(Debug, FromRow)]
struct MessageRow {
    msg_offset: i64,
    msg_key: Option<String>,
    payload: Vec<u8>,
}

impl From<MessageRow> for StreamRecord {
    fn from(row: MessageRow) -> Self {
        StreamRecord { key: row.msg_key, payload: row.payload, partition: PARTITION, offset: row.msg_offset }
    }
}

/// Appends a message and returns its offset.
pub async fn append(
    key: Option<&str>,
    payload: &[u8],
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let result = sqlx::query("INSERT INTO stream_messages (msg_key, payload) VALUES ($1, $2)")
        .bind(key)
        .bind(payload)
        .execute(conn)
        .await?;
    let offset = result.last_insert_rowid();
    trace!("📥️ Appended stream message at offset {offset}");
    Ok(offset)
}

/// The offset of the next message `group` will receive. A group that has never committed starts at the beginning.
pub async fn next_offset(group: &str, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let next = sqlx::query_scalar::<_, i64>("SELECT next_offset FROM stream_offsets WHERE consumer_group = $1")
        .bind(group)
        .fetch_optional(conn)
        .await?;
    Ok(next.unwrap_or_default())
}

pub async fn first_uncommitted(
    group: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<StreamRecord>, SqliteDatabaseError> {
    let row = sqlx::query_as::<_, MessageRow>(
        r#"
            SELECT msg_offset, msg_key, payload FROM stream_messages
            WHERE msg_offset >= COALESCE((SELECT next_offset FROM stream_offsets WHERE consumer_group = $1), 0)
            ORDER BY msg_offset ASC
            LIMIT 1
        "#,
    )
    .bind(group)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(StreamRecord::from))
}

pub async fn message_exists(offset: i64, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM stream_messages WHERE msg_offset = $1)")
        .bind(offset)
        .fetch_one(conn)
        .await?;
    Ok(exists)
}

/// Moves the committed position of `group` forward to `next`. The position never moves backwards.
pub async fn advance_offset(group: &str, next: i64, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query(
        r#"
            INSERT INTO stream_offsets (consumer_group, next_offset) VALUES ($1, $2)
            ON CONFLICT (consumer_group) DO UPDATE SET next_offset = MAX(next_offset, excluded.next_offset)
        "#,
    )
    .bind(group)
    .bind(next)
    .execute(conn)
    .await?;
    Ok(())
}

/// Deletes every message before `next`. Returns the number of messages removed.
pub async fn delete_before(next: i64, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM stream_messages WHERE msg_offset < $1").bind(next).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn count_uncommitted(group: &str, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
            SELECT COUNT(*) FROM stream_messages
            WHERE msg_offset >= COALESCE((SELECT next_offset FROM stream_offsets WHERE consumer_group = $1), 0)
        "#,
    )
    .bind(group)
    .fetch_one(conn)
    .await?;
    Ok(u64::try_from(count).unwrap_or_default())
}
