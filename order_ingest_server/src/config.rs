use std::{env, fmt::Display, str::FromStr, time::Duration};

use log::*;
use order_ingest_engine::{
    ingestion::RetryPolicy,
    service_objects::{BootstrapMode, OrderServiceConfig, DEFAULT_BOOTSTRAP_PAGE_SIZE, DEFAULT_CACHE_TTL},
    DEFAULT_CACHE_CAPACITY,
};

const DEFAULT_OIS_HOST: &str = "127.0.0.1";
const DEFAULT_OIS_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/orders.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// How long an order stays in the cache after it was written.
    pub cache_ttl: Duration,
    /// The most orders the cache holds at once.
    pub cache_max_entries: u64,
    pub bootstrap: BootstrapMode,
    /// Delivery attempts and backoff for the ingestion consumer.
    pub retry_policy: RetryPolicy,
    /// How long the ingestion consumer gets to finish its in-flight message once the HTTP server has stopped.
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OIS_HOST.to_string(),
            port: DEFAULT_OIS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache_max_entries: DEFAULT_CACHE_CAPACITY,
            bootstrap: BootstrapMode::default(),
            retry_policy: RetryPolicy::default(),
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("OIS_HOST").ok().unwrap_or_else(|| DEFAULT_OIS_HOST.into());
        let port = env_or_default("OIS_PORT", DEFAULT_OIS_PORT);
        let database_url = env::var("OIS_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ OIS_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env_or_default("OIS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let cache_ttl = Duration::from_secs(env_or_default("OIS_CACHE_TTL_SECS", DEFAULT_CACHE_TTL.as_secs()));
        let cache_max_entries = env_or_default("OIS_CACHE_MAX_ENTRIES", DEFAULT_CACHE_CAPACITY);
        let bootstrap = configure_bootstrap();
        let retry_policy = configure_retry_policy();
        let shutdown_grace =
            Duration::from_secs(env_or_default("OIS_SHUTDOWN_GRACE_SECS", DEFAULT_SHUTDOWN_GRACE.as_secs()));
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            cache_ttl,
            cache_max_entries,
            bootstrap,
            retry_policy,
            shutdown_grace,
        }
    }

    pub fn order_service_config(&self) -> OrderServiceConfig {
        OrderServiceConfig { cache_ttl: self.cache_ttl, bootstrap: self.bootstrap }
    }
}

/// Reads and parses `name`, falling back to `default` (with a log message) when it is missing or invalid.
fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

fn configure_bootstrap() -> BootstrapMode {
    let page_size = env_or_default("OIS_BOOTSTRAP_PAGE_SIZE", DEFAULT_BOOTSTRAP_PAGE_SIZE);
    let mode = env::var("OIS_BOOTSTRAP_MODE").ok();
    let mode = parse_bootstrap_mode(mode.as_deref(), page_size).unwrap_or_else(|e| {
        warn!("🪛️ Invalid configuration value for OIS_BOOTSTRAP_MODE. {e}. Using a full bootstrap.");
        BootstrapMode::Full
    });
    info!("🪛️ Cache bootstrap mode: {mode}");
    mode
}

fn parse_bootstrap_mode(mode: Option<&str>, page_size: usize) -> Result<BootstrapMode, String> {
    match mode.map(BootstrapMode::from_str).transpose()? {
        None => Ok(BootstrapMode::default()),
        Some(BootstrapMode::Paged { .. }) if page_size == 0 => Err("Page size must be greater than zero".into()),
        Some(BootstrapMode::Paged { .. }) => Ok(BootstrapMode::Paged { page_size }),
        Some(mode) => Ok(mode),
    }
}

fn configure_retry_policy() -> RetryPolicy {
    let default = RetryPolicy::default();
    let max_attempts = match env::var("OIS_MAX_DELIVERY_ATTEMPTS") {
        Ok(s) => parse_max_attempts(&s).unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for OIS_MAX_DELIVERY_ATTEMPTS. {e}");
            default.max_attempts
        }),
        Err(_) => default.max_attempts,
    };
    match max_attempts {
        Some(n) => info!("🪛️ Messages that cannot be ingested are dead-lettered after {n} attempts"),
        None => warn!("🪛️ Messages that cannot be ingested are retried forever and will block the stream"),
    }
    let backoff_ms = env_or_default("OIS_RETRY_BACKOFF_MS", default.backoff.as_millis() as u64);
    RetryPolicy::new(max_attempts, Duration::from_millis(backoff_ms))
}

fn parse_max_attempts(s: &str) -> Result<Option<u32>, String> {
    match s.trim().to_lowercase().as_str() {
        "none" | "forever" | "0" => Ok(None),
        n => n.parse::<u32>().map(Some).map_err(|e| format!("{s} is not a number of attempts. {e}")),
    }
}
