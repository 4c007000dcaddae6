use std::{fmt::Display, str::FromStr, time::Duration};

use crate::{
    db::traits::{CacheError, InsertOrderResult, StoreError},
    db_types::OrderId,
};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_BOOTSTRAP_PAGE_SIZE: usize = 500;

/// The secondary, best-effort result of writing an order to the cache.
#[derive(Debug, Clone)]
pub enum CacheWriteStatus {
    Written,
    Failed(CacheError),
    /// The order was a duplicate and the stored copy could not be read back to refresh the cache.
    Skipped,
}

impl CacheWriteStatus {
    pub fn is_written(&self) -> bool {
        matches!(self, CacheWriteStatus::Written)
    }
}

/// The result of [`crate::OrderService::create_order`]. Persistence succeeded; the cache write may not have.
#[derive(Debug, Clone)]
pub struct CreateOrderOutcome {
    pub order_id: OrderId,
    pub insert: InsertOrderResult,
    pub cache: CacheWriteStatus,
}

impl CreateOrderOutcome {
    pub fn inserted(&self) -> bool {
        self.insert == InsertOrderResult::Inserted
    }

    pub fn already_existed(&self) -> bool {
        self.insert == InsertOrderResult::AlreadyExists
    }
}

/// How the cache is warmed when the order service starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootstrapMode {
    /// Load every stored order in a single read.
    #[default]
    Full,
    /// Walk the store in id order, `page_size` orders at a time.
    Paged { page_size: usize },
    /// Start with a cold cache and rely on read-through.
    Disabled,
}

impl Display for BootstrapMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootstrapMode::Full => write!(f, "full"),
            BootstrapMode::Paged { page_size } => write!(f, "paged ({page_size} per page)"),
            BootstrapMode::Disabled => write!(f, "disabled"),
        }
    }
}

impl FromStr for BootstrapMode {
    type Err = String;

    /// Parses `full`, `disabled` or `paged`. `paged` uses the default page size.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(BootstrapMode::Full),
            "paged" => Ok(BootstrapMode::Paged { page_size: DEFAULT_BOOTSTRAP_PAGE_SIZE }),
            "disabled" | "off" | "none" => Ok(BootstrapMode::Disabled),
            other => Err(format!("Unknown bootstrap mode: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderServiceConfig {
    pub cache_ttl: Duration,
    pub bootstrap: BootstrapMode,
}

impl Default for OrderServiceConfig {
    fn default() -> Self {
        Self { cache_ttl: DEFAULT_CACHE_TTL, bootstrap: BootstrapMode::default() }
    }
}

/// Summary of a cache bootstrap run. A store read failure ends the run early and is recorded in `error`; the orders
/// cached up to that point stay cached.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
    pub loaded: usize,
    pub cached: usize,
    pub cache_failures: usize,
    pub error: Option<StoreError>,
}

impl BootstrapReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.cache_failures == 0
    }
}
