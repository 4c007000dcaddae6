//! # Order stream subscription
//!
//! The consumer reads orders through the [`OrderStream`] trait. The stream is assumed to deliver at least once, in
//! order within a partition, and to redeliver anything that has not been committed. Two single-partition logs with
//! exactly those semantics are provided: `SqliteOrderStream` keeps messages and the committed offset in the order
//! database, so they survive a restart, and [`MemoryOrderStream`] lives in process memory. Producers publish through
//! [`OrderPublisher`].
//!
//! Messages that can never be processed are handed to a [`DeadLetterSink`].
mod dead_letter;
mod memory;
#[cfg(feature = "sqlite")]
mod sqlite;
mod traits;

pub use dead_letter::{DeadLetter, DeadLetterSink, LogDeadLetterSink, MemoryDeadLetterQueue};
pub use memory::{MemoryOrderStream, StreamProducer};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteOrderStream, SqliteStreamProducer, DEFAULT_POLL_INTERVAL};
pub use traits::{AckToken, OrderPublisher, OrderStream, StreamError, StreamRecord};
