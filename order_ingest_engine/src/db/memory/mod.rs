//! In-process implementations of the storage traits. [`MemoryOrderCache`] is the cache used by the server;
//! [`MemoryOrderStore`] is a non-durable store for tests and local development.
mod cache;
mod store;

pub use cache::{MemoryOrderCache, DEFAULT_CACHE_CAPACITY};
pub use store::MemoryOrderStore;
