use thiserror::Error;

use crate::{db::traits::StoreError, db_types::OrderId, validation::ValidationError};

#[derive(Debug, Clone, Error)]
pub enum OrderServiceError {
    #[error("{0}")]
    ValidationError(#[from] ValidationError),
    #[error("Could not persist order {0}. {1}")]
    PersistenceError(OrderId, StoreError),
    #[error("Could not look up order {0}. {1}")]
    LookupError(OrderId, StoreError),
}
