//! # Stream ingestion
//!
//! The [`IngestionConsumer`] reads one message at a time from an [`crate::stream::OrderStream`], turns it into an
//! [`crate::db_types::Order`] and hands it to the [`crate::OrderService`]. The stream offset is only committed once
//! the order is durably stored, so delivery is at-least-once and the idempotent store makes redelivery harmless.
//!
//! Every message ends with a [`Disposition`]:
//! * `Commit` when the order was stored (or already existed).
//! * `Retry` when the store failed, or when a malformed or invalid message has not used up its attempts yet. The
//!   offset is not committed and the same message comes back on the next pull.
//! * `DeadLetter` when a malformed or invalid message has used up its [`RetryPolicy`] attempts. The message is handed
//!   to the dead-letter sink, and committed only if the sink accepted it.
mod consumer;
mod disposition;
mod errors;

pub use consumer::{ConsumerStats, IngestionConsumer, MessageReport, MessageState};
pub use disposition::{Disposition, RetryPolicy};
pub use errors::IngestError;
