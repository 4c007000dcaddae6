use thiserror::Error;

use crate::{db::traits::StoreError, db_types::OrderId, stream::StreamError};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
    #[error("Order {0} could not be encoded for storage. {1}")]
    EncodingError(OrderId, String),
    #[error("Order {0} could not be decoded from storage. {1}")]
    DecodingError(OrderId, String),
}

impl From<SqliteDatabaseError> for StoreError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::DecodingError(id, msg) => StoreError::CorruptRecord(id, msg),
            e => StoreError::DatabaseError(e.to_string()),
        }
    }
}

impl From<SqliteDatabaseError> for StreamError {
    fn from(e: SqliteDatabaseError) -> Self {
        StreamError::Transport(e.to_string())
    }
}
