use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use order_ingest_engine::{
    stream::{SqliteOrderStream, SqliteStreamProducer},
    MemoryOrderCache,
    OrderService,
    OrderValidator,
    SqliteOrderStore,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    ingest_worker::{start_ingestion_worker, stop_ingestion_worker},
    routes::{health, EvictOrderRoute, OrderByIdRoute, SubmitOrderRoute},
};

pub type OrderApi = OrderService<SqliteOrderStore, MemoryOrderCache>;

/// The consumer group the ingestion worker commits its offset under.
pub const CONSUMER_GROUP: &str = "order-ingest";

/// Runs the whole service: opens and migrates the order database, warms the cache, starts the ingestion worker and
/// serves HTTP until the process is asked to stop. The ingestion worker is then given `shutdown_grace` to finish.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    prepare_database_dir(&config.database_url)?;
    let store = SqliteOrderStore::new_with_url(&config.database_url, config.db_max_connections).await?;
    store.run_migrations().await?;
    let stream = SqliteOrderStream::new(store.pool().clone(), CONSUMER_GROUP);
    match stream.pending().await {
        Ok(0) => {},
        Ok(n) => info!("📥️ {n} order message(s) from a previous run are waiting to be ingested"),
        Err(e) => warn!("📥️ Could not count pending order messages. {e}"),
    }
    let cache = MemoryOrderCache::with_max_capacity(config.cache_max_entries);
    let (api, report) = OrderService::start(store, cache, OrderValidator::new(), config.order_service_config()).await;
    if !report.is_complete() {
        warn!("🚀️ The cache was not fully warmed at startup. Lookups will fill it in. {report:?}");
    }

    let producer = stream.producer();
    let shutdown = CancellationToken::new();
    let worker = start_ingestion_worker(stream, api.clone(), config.retry_policy, shutdown.clone());

    let grace = config.shutdown_grace;
    let srv = create_server_instance(config, api, producer.clone())?;
    let result = srv.await;
    info!("🚀️ HTTP server has stopped. Shutting down the ingestion worker.");
    producer.close();
    stop_ingestion_worker(worker, &shutdown, grace).await;
    result.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    api: OrderApi,
    producer: SqliteStreamProducer,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("ois::access_log"))
            .app_data(web::Data::new(api.clone()))
            .app_data(web::Data::new(producer.clone()))
            .service(health)
            .service(SubmitOrderRoute::<SqliteStreamProducer>::new())
            .service(OrderByIdRoute::<SqliteOrderStore, MemoryOrderCache>::new())
            .service(EvictOrderRoute::<SqliteOrderStore, MemoryOrderCache>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// SQLite creates the database file on demand, but not the directory it lives in.
fn prepare_database_dir(url: &str) -> Result<(), ServerError> {
    let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            info!("🗃️ Creating database directory {}", dir.display());
            std::fs::create_dir_all(dir)?;
            Ok(())
        },
        _ => Ok(()),
    }
}
