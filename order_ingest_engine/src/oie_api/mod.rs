//! # Order ingestion engine public API
//!
//! [`order_service::OrderService`] is the only component that touches both the durable store and the cache. It
//! enforces the write ordering (persist first, then cache) and the read discipline (cache first, store on a miss).
pub mod errors;
pub mod order_service;
pub mod service_objects;
