//! # article-cache
//!
//! Caching layer for article detail screens: a bounded, expiring in-memory
//! store, a recently-viewed history mirrored to durable storage, and
//! request metrics.
//!
//! ## Reading and writing
//!
//! The UI asks the cache first and fetches on a miss:
//!
//! ```no_run
//! use article_cache::{ArticleDetail, ArticleDetailCache, CacheConfig, MemoryStorage};
//! use std::sync::Arc;
//!
//! # async fn fetch(uri: &str) -> ArticleDetail { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ArticleDetailCache::new(CacheConfig::default(), Arc::new(MemoryStorage::new()))?;
//!
//!     let uri = "https://news.example.com/1";
//!     let detail = match cache.read(uri).await {
//!         Some(detail) => detail,
//!         None => {
//!             let detail = fetch(uri).await;
//!             cache.write(uri, detail.clone()).await;
//!             detail
//!         }
//!     };
//!     println!("{}", detail.title);
//!
//!     cache.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Restoring after a restart
//!
//! ```no_run
//! use article_cache::{ArticleDetailCache, CacheConfig, FileStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ArticleDetailCache::new(
//!         CacheConfig::from_env(),
//!         Arc::new(FileStorage::new("./data")),
//!     )?;
//!
//!     let restored = cache.restore_from_durable_storage().await;
//!     println!("Restored {} articles", restored);
//!
//!     for article in cache.recently_viewed().await {
//!         println!("{}", article.title);
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod storage;

// Re-export main types for convenience
pub use cache::{
    ArticleDetail, ArticleDetailCache, ArticleSource, ArticleUri, CacheConfig, CacheConfigBuilder,
    Clock, EvictionReason, ExpiringStore, Lookup, ManualClock, MetricsRecorder, MetricsSnapshot,
    RecentlyViewed, StoreStats, SystemClock,
};
pub use error::{CacheError, Result};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, PersistenceWorker};
