//! # Order ingestion server
//! This crate hosts the order ingestion engine. It is responsible for:
//! * Opening the order database and warming the order cache at startup.
//! * Running the ingestion consumer in the background, and giving it time to finish its current message at shutdown.
//! * Serving order lookups over HTTP.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `GET /order/{order_uid}`: Look up an order, cache first.
//! * `POST /orders`: Publish an order payload onto the order stream.
//! * `DELETE /order/{order_uid}/cache`: Drop an order from the cache.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod ingest_worker;
pub mod routes;
pub mod server;
