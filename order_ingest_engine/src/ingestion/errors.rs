use thiserror::Error;

use crate::{
    db::traits::StoreError,
    db_types::OrderId,
    stream::{AckToken, StreamError},
    validation::ValidationError,
};

#[derive(Debug, Clone, Error)]
pub enum IngestError {
    #[error("The message payload is not a valid order. {0}")]
    MalformedMessage(String),
    #[error("Order {0} was rejected. {1}")]
    ValidationFailure(OrderId, ValidationError),
    #[error("Order {0} could not be stored. {1}")]
    PersistenceFailure(OrderId, StoreError),
    #[error("Offset {0} could not be committed. {1}")]
    CommitFailure(AckToken, StreamError),
}

impl IngestError {
    /// Permanent failures are properties of the message itself; redelivering it will not help.
    pub fn is_permanent(&self) -> bool {
        matches!(self, IngestError::MalformedMessage(_) | IngestError::ValidationFailure(..))
    }
}
