pub mod db;
mod errors;

pub mod orders;
pub mod stream_messages;

use std::str::FromStr;

pub use errors::SqliteDatabaseError;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

/// Opens a connection pool against `url`. The database file is created if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqliteDatabaseError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| SqliteDatabaseError::InvalidUrl(format!("{url}: {e}")))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    info!("🗃️ Connected to {url} with up to {max_connections} connections");
    Ok(pool)
}
