//! Cache facade used by the UI layer
//!
//! Owns the expiring store, the recently-viewed ledger and the metrics
//! recorder behind a single lock, so a `write` updates store and ledger
//! together. Durable persistence is handed to a [`PersistenceWorker`] while
//! the lock is held, which keeps the queued ledger blobs in call order
//! without making callers wait for storage.

use crate::cache::{
    clock::{Clock, SystemClock},
    config::CacheConfig,
    eviction::{logging_listener, EvictionListener},
    ledger::RecentlyViewed,
    metrics::{MetricsRecorder, MetricsSnapshot},
    store::ExpiringStore,
    types::{ArticleDetail, ArticleUri, StoreStats},
};
use crate::error::Result;
use crate::storage::{DurableStorage, PersistenceWorker};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Outcome of resolving one uri against the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(ArticleDetail),
    /// The caller should fetch the article and hand it to `write`
    Miss,
}

impl Lookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    pub fn into_detail(self) -> Option<ArticleDetail> {
        match self {
            Lookup::Hit(detail) => Some(detail),
            Lookup::Miss => None,
        }
    }
}

struct CacheState {
    store: ExpiringStore,
    ledger: RecentlyViewed,
    metrics: MetricsRecorder,
}

/// Article detail cache with a durable recently-viewed ledger
///
/// Must be constructed inside a tokio runtime: construction spawns the
/// persistence task. Call [`restore_from_durable_storage`] once at startup
/// and [`shutdown`] before exit to flush pending writes.
///
/// [`restore_from_durable_storage`]: ArticleDetailCache::restore_from_durable_storage
/// [`shutdown`]: ArticleDetailCache::shutdown
pub struct ArticleDetailCache {
    config: CacheConfig,
    state: RwLock<CacheState>,
    storage: Arc<dyn DurableStorage>,
    worker: PersistenceWorker,
}

impl ArticleDetailCache {
    /// Create a cache on the system clock
    pub fn new(config: CacheConfig, storage: Arc<dyn DurableStorage>) -> Result<Self> {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    /// Create a cache reading time from `clock`
    pub fn with_clock(
        config: CacheConfig,
        storage: Arc<dyn DurableStorage>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        info!(
            "Initializing article cache (capacity: {}, ttl: {:?}, recent: {})",
            config.capacity, config.ttl, config.recent_capacity
        );

        let mut store = ExpiringStore::with_clock(config.capacity, config.ttl, clock);
        store.set_eviction_listener(logging_listener());

        let state = CacheState {
            store,
            ledger: RecentlyViewed::new(config.recent_capacity),
            metrics: MetricsRecorder::new(config.sample_window),
        };

        let worker = PersistenceWorker::spawn(storage.clone());

        Ok(Self {
            config,
            state: RwLock::new(state),
            storage,
            worker,
        })
    }

    /// Builder-style variant of [`set_eviction_listener`](Self::set_eviction_listener)
    pub fn with_eviction_listener(mut self, listener: EvictionListener) -> Self {
        self.state.get_mut().store.set_eviction_listener(listener);
        self
    }

    /// Replace the eviction listener (the default logs at debug level)
    pub async fn set_eviction_listener(&self, listener: EvictionListener) {
        self.state.write().await.store.set_eviction_listener(listener);
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Resolve `uri`, recording a hit or a miss
    ///
    /// Never touches the recently-viewed ledger.
    pub async fn lookup(&self, uri: &str) -> Lookup {
        let mut state = self.state.write().await;

        let started = Instant::now();
        let found = state.store.get(uri);
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match found {
            Some(detail) => {
                state.metrics.record_hit(latency_ms);
                debug!("Cache hit: {}", uri);
                Lookup::Hit(detail)
            }
            None => {
                state.metrics.record_miss(latency_ms, None);
                debug!("Cache miss: {}", uri);
                Lookup::Miss
            }
        }
    }

    /// Cached detail for `uri`, or `None` when the caller must fetch it
    pub async fn read(&self, uri: &str) -> Option<ArticleDetail> {
        self.lookup(uri).await.into_detail()
    }

    /// Store a freshly fetched detail and record it as viewed
    ///
    /// Returns once memory is updated; persistence happens in the
    /// background and its failures are only logged.
    pub async fn write(&self, uri: &str, detail: ArticleDetail) {
        if detail.uri != uri {
            warn!(
                "Writing detail with uri {} under key {}; ledger dedupes by the detail's uri",
                detail.uri, uri
            );
        }

        // One encoding feeds both the payload sample and the durable mirror
        let detail_json = serde_json::to_vec(&detail);

        let mut state = self.state.write().await;

        state.store.set(uri, detail.clone());
        if state.ledger.record(detail) {
            debug!("Recorded {} as recently viewed", uri);
        }

        match &detail_json {
            Ok(bytes) => state.metrics.record_payload(bytes.len()),
            Err(e) => error!("Failed to serialize article {}: {}", uri, e),
        }

        let ledger: Vec<&ArticleDetail> = state.ledger.iter().collect();
        match serde_json::to_vec(&ledger) {
            Ok(blob) => self.persist(&self.config.recent_key, blob),
            Err(e) => error!("Failed to serialize recently viewed articles: {}", e),
        }

        if self.config.persist_details {
            if let Ok(bytes) = detail_json {
                self.persist(&self.config.detail_key(uri), bytes);
            }
        }
    }

    /// Load the persisted ledger and seed the store with it
    ///
    /// Missing, unreadable, malformed or empty data leaves the cache as it
    /// was. Returns the number of articles restored.
    pub async fn restore_from_durable_storage(&self) -> usize {
        let key = &self.config.recent_key;

        let bytes = match self.storage.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("No recently viewed articles in storage");
                return 0;
            }
            Err(e) => {
                error!("Failed to load recently viewed from storage: {}", e);
                return 0;
            }
        };

        let items: Vec<ArticleDetail> = match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(e) => {
                warn!("Ignoring malformed recently viewed data: {}", e);
                return 0;
            }
        };

        if items.is_empty() {
            return 0;
        }

        self.restore_recently_viewed(items).await
    }

    /// Replace the ledger with `items` and seed the store with each of them
    ///
    /// The oldest item is inserted first so the newest ends up most
    /// recently used.
    pub async fn restore_recently_viewed(&self, items: Vec<ArticleDetail>) -> usize {
        let mut state = self.state.write().await;

        let restored: Vec<ArticleDetail> = state.ledger.restore(items).iter().cloned().collect();
        for detail in restored.iter().rev() {
            state.store.set(detail.uri.clone(), detail.clone());
        }

        info!(
            "Restored {} recently viewed articles from storage",
            restored.len()
        );
        restored.len()
    }

    /// Recently viewed articles, most recent first
    pub async fn recently_viewed(&self) -> Vec<ArticleDetail> {
        self.state.read().await.ledger.list()
    }

    /// Hit/miss/latency/payload statistics
    pub async fn stats(&self) -> MetricsSnapshot {
        self.state.read().await.metrics.snapshot()
    }

    pub async fn store_stats(&self) -> StoreStats {
        self.state.read().await.store.stats()
    }

    /// Whether a live entry exists, without counting a request
    pub async fn contains(&self, uri: &str) -> bool {
        self.state.read().await.store.contains(uri)
    }

    /// Sweep stale entries from the store
    pub async fn purge_expired(&self) -> Vec<ArticleUri> {
        self.state.write().await.store.purge_expired()
    }

    /// Persistence commands the storage rejected so far
    pub fn failed_persists(&self) -> u64 {
        self.worker.failed()
    }

    /// Wait for every queued persistence command to be applied
    pub async fn flush(&self) -> Result<()> {
        self.worker.flush().await
    }

    /// Flush pending persistence and stop the worker
    pub async fn shutdown(self) -> Result<()> {
        let ArticleDetailCache { worker, .. } = self;
        worker.shutdown().await?;
        info!("Article cache shut down");
        Ok(())
    }

    fn persist(&self, key: &str, value: Vec<u8>) {
        if let Err(e) = self.worker.enqueue_write(key, value) {
            error!("Failed to queue persistence of {}: {}", key, e);
        }
    }
}

impl std::fmt::Debug for ArticleDetailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleDetailCache")
            .field("config", &self.config)
            .field("worker", &self.worker)
            .finish()
    }
}
