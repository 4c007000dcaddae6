use log::*;
use order_ingest_engine::SqliteOrderStore;
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/ois_test_store_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("Nothing to drop at {url}: {e:?}");
    }
    Sqlite::create_database(url).await.expect("Error creating database");
    info!("Created Sqlite database {url}");
}

/// Creates a fresh, migrated database at a random path and returns a store connected to it.
pub async fn prepare_test_store() -> SqliteOrderStore {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_path();
    create_database(&url).await;
    let store = SqliteOrderStore::new_with_url(&url, 5).await.expect("Error creating connection to database");
    store.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    store
}

pub async fn remove_test_store(store: SqliteOrderStore) {
    let url = store.url().to_string();
    store.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("Could not remove test database {url}: {e}");
    }
}
