//! Order Ingestion Engine
//!
//! The order ingestion engine takes order records off a message stream, stores them durably and serves fast lookups
//! through a cache that is kept coherent with the store. It is transport-agnostic: the stream, the store and the cache
//! are all reached through narrow traits.
//!
//! The library is divided into the following sections:
//! 1. The data model ([`mod@db_types`]) and the order validator ([`mod@validation`]).
//! 2. Storage ([`mod@db`]). The [`OrderStore`] trait is the system of record and [`OrderCache`] is the expiring side
//!    store. SQLite and in-memory backends are provided.
//! 3. The order stream ([`mod@stream`]), which delivers messages at least once and redelivers anything that has not
//!    been committed.
//! 4. The public API ([`OrderService`]), which persists new orders before caching them, and reads cache-first.
//! 5. Ingestion ([`mod@ingestion`]). The [`IngestionConsumer`] pulls messages one at a time, hands them to the
//!    `OrderService`, and commits the stream offset only once the order is durably stored.
mod db;
mod oie_api;

pub mod db_types;
pub mod ingestion;
pub mod stream;
pub mod validation;

#[cfg(feature = "sqlite")]
pub use db::sqlite::{db::SqliteOrderStore, SqliteDatabaseError};
pub use db::{
    memory::{MemoryOrderCache, MemoryOrderStore, DEFAULT_CACHE_CAPACITY},
    traits::{CacheError, InsertOrderResult, OrderCache, OrderStore, StoreError},
};
pub use ingestion::{ConsumerStats, Disposition, IngestError, IngestionConsumer, MessageReport, RetryPolicy};
pub use oie_api::{errors::OrderServiceError, order_service::OrderService, service_objects};
pub use validation::{OrderValidator, ValidationError};
