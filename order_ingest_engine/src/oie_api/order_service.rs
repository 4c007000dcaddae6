use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{CacheError, InsertOrderResult, OrderCache, OrderStore},
    db_types::{Order, OrderId},
    oie_api::{
        errors::OrderServiceError,
        service_objects::{
            BootstrapMode,
            BootstrapReport,
            CacheWriteStatus,
            CreateOrderOutcome,
            OrderServiceConfig,
        },
    },
    validation::OrderValidator,
};

/// `OrderService` coordinates the durable store and the cache.
///
/// The store is the system of record. The cache is written only after the store has accepted an order, and is
/// consulted first on reads. Cache failures are never fatal: they are logged and the service falls back to the store.
///
/// The service holds no locks of its own, so clones can be shared between the ingestion task and HTTP workers as long
/// as the store and cache handles are themselves safe to share.
#[derive(Clone)]
pub struct OrderService<S, C> {
    store: S,
    cache: C,
    validator: OrderValidator,
    config: OrderServiceConfig,
}

impl<S, C> Debug for OrderService<S, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderService ({:?})", self.config)
    }
}

impl<S, C> OrderService<S, C> {
    /// Creates a service without warming the cache. Use [`OrderService::start`] for the normal startup path.
    pub fn new(store: S, cache: C, validator: OrderValidator, config: OrderServiceConfig) -> Self {
        Self { store, cache, validator, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn validator(&self) -> &OrderValidator {
        &self.validator
    }

    pub fn config(&self) -> &OrderServiceConfig {
        &self.config
    }
}

impl<S, C> OrderService<S, C>
where
    S: OrderStore,
    C: OrderCache,
{
    /// Creates the service and warms the cache according to the configured [`BootstrapMode`].
    ///
    /// A failure to read from the store during bootstrap is not fatal. The service starts with whatever was cached
    /// and fills the rest lazily on lookup. The returned report says what happened.
    pub async fn start(
        store: S,
        cache: C,
        validator: OrderValidator,
        config: OrderServiceConfig,
    ) -> (Self, BootstrapReport) {
        let service = Self::new(store, cache, validator, config);
        let report = service.bootstrap().await;
        (service, report)
    }

    /// Pushes stored orders into the cache.
    pub async fn bootstrap(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();
        match self.config.bootstrap {
            BootstrapMode::Disabled => {
                info!("⚡️ Cache bootstrap is disabled. Orders will be cached on first lookup.");
                return report;
            },
            BootstrapMode::Full => match self.store.fetch_all_orders().await {
                Ok(orders) => self.cache_orders(&orders, &mut report).await,
                Err(e) => report.error = Some(e),
            },
            BootstrapMode::Paged { page_size } => {
                let page_size = page_size.max(1);
                let mut after = None;
                loop {
                    let page = match self.store.fetch_orders_page(after.take(), page_size).await {
                        Ok(page) => page,
                        Err(e) => {
                            report.error = Some(e);
                            break;
                        },
                    };
                    self.cache_orders(&page, &mut report).await;
                    if page.len() < page_size {
                        break;
                    }
                    after = page.last().map(|o| o.order_id.clone());
                }
            },
        }
        match &report.error {
            Some(e) => warn!(
                "⚡️ Cache bootstrap could not read from the store and stopped early. The service will start with a \
                 partially warm cache. {} orders cached. {e}",
                report.cached
            ),
            None => info!(
                "⚡️ Cache bootstrap complete. {} orders loaded, {} cached, {} cache failures.",
                report.loaded, report.cached, report.cache_failures
            ),
        }
        report
    }

    async fn cache_orders(&self, orders: &[Order], report: &mut BootstrapReport) {
        report.loaded += orders.len();
        for order in orders {
            match self.cache.set(&order.order_id, order, self.config.cache_ttl).await {
                Ok(()) => report.cached += 1,
                Err(e) => {
                    report.cache_failures += 1;
                    warn!("⚡️ Could not cache order {} during bootstrap. {e}", order.order_id);
                },
            }
        }
    }

    /// Validates and persists a new order, then writes it to the cache.
    ///
    /// Persisting is idempotent: an order id that is already stored is not an error, and the stored copy is left
    /// untouched. In that case the cache is refreshed from the stored copy rather than from `order`.
    ///
    /// The cache write is best-effort. Its result is reported in [`CreateOrderOutcome::cache`] and never turns a
    /// successful persist into an error.
    pub async fn create_order(&self, order: &Order) -> Result<CreateOrderOutcome, OrderServiceError> {
        self.validator.validate(order)?;
        self.store_validated(order).await
    }

    /// The persist-then-cache half of [`OrderService::create_order`], for callers that have already run `order`
    /// through [`OrderService::validator`].
    pub(crate) async fn store_validated(&self, order: &Order) -> Result<CreateOrderOutcome, OrderServiceError> {
        let order_id = order.order_id.clone();
        let insert = self
            .store
            .insert_order(order)
            .await
            .map_err(|e| OrderServiceError::PersistenceError(order_id.clone(), e))?;
        let cache = match insert {
            InsertOrderResult::Inserted => self.write_cache(order).await,
            InsertOrderResult::AlreadyExists => self.refresh_cache(&order_id).await,
        };
        debug!("🗃️ Order {order_id} processed ({insert:?}, cache: {cache:?})");
        Ok(CreateOrderOutcome { order_id, insert, cache })
    }

    /// Looks up an order, cache first.
    ///
    /// * A cache hit returns immediately without touching the store.
    /// * On a miss or a cache error, the store is queried. A stored order is written back to the cache before it is
    ///   returned.
    /// * `Ok(None)` means the order exists in neither.
    pub async fn get_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderServiceError> {
        match self.cache.get(order_id).await {
            Ok(Some(order)) => {
                trace!("🔎️ Cache hit for order {order_id}");
                return Ok(Some(order));
            },
            Ok(None) => trace!("🔎️ Cache miss for order {order_id}"),
            Err(e) => warn!("⚡️ Cache read for order {order_id} failed. Falling back to the store. {e}"),
        }
        let order = self
            .store
            .fetch_order_by_id(order_id)
            .await
            .map_err(|e| OrderServiceError::LookupError(order_id.clone(), e))?;
        match &order {
            Some(o) => {
                let _ = self.write_cache(o).await;
            },
            None => debug!("🔎️ Order {order_id} was not found"),
        }
        Ok(order)
    }

    /// Removes an order from the cache. The stored order is not affected.
    pub async fn evict(&self, order_id: &OrderId) -> Result<(), CacheError> {
        self.cache.delete(order_id).await.map_err(|e| {
            warn!("⚡️ Could not evict order {order_id} from the cache. {e}");
            e
        })
    }

    async fn write_cache(&self, order: &Order) -> CacheWriteStatus {
        match self.cache.set(&order.order_id, order, self.config.cache_ttl).await {
            Ok(()) => CacheWriteStatus::Written,
            Err(e) => {
                warn!("⚡️ Order {} is stored but could not be cached. {e}", order.order_id);
                CacheWriteStatus::Failed(e)
            },
        }
    }

    async fn refresh_cache(&self, order_id: &OrderId) -> CacheWriteStatus {
        match self.store.fetch_order_by_id(order_id).await {
            Ok(Some(stored)) => self.write_cache(&stored).await,
            Ok(None) => {
                warn!("🗃️ Order {order_id} was reported as a duplicate but could not be read back");
                CacheWriteStatus::Skipped
            },
            Err(e) => {
                warn!("🗃️ Could not read back duplicate order {order_id} to refresh the cache. {e}");
                CacheWriteStatus::Skipped
            },
        }
    }
}
