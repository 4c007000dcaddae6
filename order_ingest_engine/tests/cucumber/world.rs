use std::fmt::Debug;

use cucumber::World;
use log::*;
use order_ingest_engine::{
    service_objects::{BootstrapMode, OrderServiceConfig},
    stream::{MemoryDeadLetterQueue, MemoryOrderStream},
    IngestionConsumer,
    MemoryOrderCache,
    MessageReport,
    OrderService,
    OrderValidator,
    RetryPolicy,
    SqliteOrderStore,
};

use crate::support::{faults::FlakyStore, prepare_env::prepare_test_store};

pub type TestStore = FlakyStore<SqliteOrderStore>;
pub type TestService = OrderService<TestStore, MemoryOrderCache>;
pub type TestConsumer = IngestionConsumer<MemoryOrderStream, TestStore, MemoryOrderCache, MemoryDeadLetterQueue>;

#[derive(Default, Debug, World)]
pub struct IngestWorld {
    pub system: Option<IngestionSystem>,
    pub reports: Vec<MessageReport>,
}

impl IngestWorld {
    pub fn system(&mut self) -> &mut IngestionSystem {
        self.system.as_mut().expect("Ingestion system not initialised")
    }

    pub fn last_report(&self) -> &MessageReport {
        self.reports.last().expect("No message has been processed yet")
    }
}

pub struct IngestionSystem {
    pub db: SqliteOrderStore,
    pub store: TestStore,
    pub cache: MemoryOrderCache,
    pub stream: MemoryOrderStream,
    pub dead_letters: MemoryDeadLetterQueue,
    pub service: TestService,
    pub consumer: TestConsumer,
    pub policy: RetryPolicy,
}

impl Debug for IngestionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IngestionSystem ({})", self.db.url())
    }
}

impl IngestionSystem {
    pub async fn new(policy: RetryPolicy) -> Self {
        let db = prepare_test_store().await;
        debug!("Created database: {}", db.url());
        let store = FlakyStore::new(db.clone());
        let cache = MemoryOrderCache::new();
        let stream = MemoryOrderStream::new();
        let dead_letters = MemoryDeadLetterQueue::new();
        let (service, _) = OrderService::start(store.clone(), cache.clone(), OrderValidator::new(), config()).await;
        let consumer = IngestionConsumer::new(stream.clone(), service.clone(), dead_letters.clone(), policy);
        Self { db, store, cache, stream, dead_letters, service, consumer, policy }
    }

    /// Simulates a process restart: the store and the stream survive, the cache starts empty and is bootstrapped.
    pub async fn restart(&mut self) {
        self.cache = MemoryOrderCache::new();
        let (service, report) =
            OrderService::start(self.store.clone(), self.cache.clone(), OrderValidator::new(), config()).await;
        info!("🚀️ Restarted order service. {report:?}");
        self.consumer =
            IngestionConsumer::new(self.stream.clone(), service.clone(), self.dead_letters.clone(), self.policy);
        self.service = service;
    }
}

fn config() -> OrderServiceConfig {
    OrderServiceConfig { bootstrap: BootstrapMode::Full, ..Default::default() }
}
