//! Cache entry management with TTL support

use crate::cache::types::ArticleDetail;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// A stored article detail with its timing metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached article
    pub detail: ArticleDetail,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

/// Timing metadata associated with a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetadata {
    /// When the value was stored; the ttl is measured from here
    pub inserted_at: DateTime<Utc>,

    /// Last successful lookup (for diagnostics; recency order lives in the store)
    pub last_accessed_at: DateTime<Utc>,

    /// Number of successful lookups since insertion
    pub access_count: u64,
}

impl CacheEntry {
    /// Create a new entry stamped at `now`
    pub fn new(detail: ArticleDetail, now: DateTime<Utc>) -> Self {
        Self {
            detail,
            metadata: CacheMetadata {
                inserted_at: now,
                last_accessed_at: now,
                access_count: 0,
            },
        }
    }

    /// Age of the entry at `now`
    ///
    /// Clock skew (a `now` before insertion) yields zero.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.metadata.inserted_at)
            .to_std()
            .unwrap_or(Duration::from_secs(0))
    }

    /// An entry is stale once its age strictly exceeds the ttl
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) > ttl
    }

    /// Record a lookup; does not touch `inserted_at`
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.metadata.last_accessed_at = now;
        self.metadata.access_count += 1;
    }
}
