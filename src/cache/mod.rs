//! # Article Detail Cache
//!
//! In-memory caching for article detail payloads with a small durable
//! "recently viewed" history.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: entries older than the configured ttl are never served
//! - **LRU Eviction**: the least recently used entry makes room when the store is full
//! - **Recently Viewed Ledger**: deduplicated, newest first, restored on startup
//! - **Metrics**: hit/miss counts plus latency and payload-size samples
//! - **Background Persistence**: durable writes never block the caller
//!
//! ## Example
//!
//! ```no_run
//! use article_cache::cache::{ArticleDetailCache, CacheConfig};
//! use article_cache::storage::FileStorage;
//! use std::sync::Arc;
//!
//! # async fn example(detail: article_cache::cache::ArticleDetail) -> anyhow::Result<()> {
//! let cache = ArticleDetailCache::new(
//!     CacheConfig::default(),
//!     Arc::new(FileStorage::new("./data")),
//! )?;
//! cache.restore_from_durable_storage().await;
//!
//! let uri = detail.uri.clone();
//! if cache.read(&uri).await.is_none() {
//!     cache.write(&uri, detail).await;
//! }
//!
//! println!("{}", cache.stats().await);
//! cache.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod entry;
pub mod eviction;
pub mod facade;
pub mod ledger;
pub mod metrics;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use eviction::{logging_listener, EvictionListener, EvictionReason};
pub use facade::{ArticleDetailCache, Lookup};
pub use ledger::RecentlyViewed;
pub use metrics::{MetricsRecorder, MetricsSnapshot, SampleWindow};
pub use store::ExpiringStore;
pub use types::{ArticleDetail, ArticleSource, ArticleUri, StoreStats};
