//! # Storage capability contracts
//!
//! The order service talks to its storage through two narrow traits, so that backends can be swapped without any
//! behaviour depending on the concrete type:
//!
//! * [`OrderStore`] is the system of record. Writes are insert-only and idempotent on the order id; a duplicate
//!   insert is reported as [`InsertOrderResult::AlreadyExists`], never as an error.
//! * [`OrderCache`] is a fast, expiring side store. It may be empty, cold or unreachable at any time and is never
//!   authoritative. A miss is `Ok(None)`, not an error.
//!
//! Both must be safe to call concurrently from the ingestion task and the HTTP workers.
mod data_objects;
mod order_cache;
mod order_store;

pub use data_objects::InsertOrderResult;
pub use order_cache::{CacheError, OrderCache};
pub use order_store::{OrderStore, StoreError};
