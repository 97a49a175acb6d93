//! Bounded expiring store with LRU eviction
//!
//! The store is a plain synchronous structure; the facade owns it behind a
//! lock. Recency order is kept by `lru::LruCache`, so `get` and `set` are
//! O(1). Expiry is checked lazily on lookup and by explicit sweeps.

use crate::cache::{
    clock::{Clock, SystemClock},
    entry::CacheEntry,
    eviction::{EvictionListener, EvictionReason},
    types::{ArticleDetail, ArticleUri, StoreStats},
};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Fixed-capacity, ttl-bounded map from article uri to detail
pub struct ExpiringStore {
    entries: LruCache<ArticleUri, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    listener: Option<EvictionListener>,
    stats: StoreStats,
}

impl ExpiringStore {
    /// Create a store using the system clock
    ///
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    /// Create a store reading time from `clock`
    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            entries: LruCache::new(capacity),
            ttl,
            clock,
            listener: None,
            stats: StoreStats {
                capacity: capacity.get(),
                ..Default::default()
            },
        }
    }

    /// Register a callback for every entry leaving the store
    pub fn set_eviction_listener(&mut self, listener: EvictionListener) {
        self.listener = Some(listener);
    }

    /// Look up a detail, refreshing its recency but not its ttl
    ///
    /// A stale entry is evicted and reported as absent.
    pub fn get(&mut self, uri: &str) -> Option<ArticleDetail> {
        let now = self.clock.now();

        let expired = self.entries.peek(uri)?.is_expired(now, self.ttl);
        if expired {
            self.evict(uri, EvictionReason::Expired);
            return None;
        }

        let entry = self.entries.get_mut(uri)?;
        entry.mark_accessed(now);
        Some(entry.detail.clone())
    }

    /// Look up a detail without touching recency or access metadata
    pub fn peek(&self, uri: &str) -> Option<&ArticleDetail> {
        let now = self.clock.now();
        self.entries
            .peek(uri)
            .filter(|entry| !entry.is_expired(now, self.ttl))
            .map(|entry| &entry.detail)
    }

    /// Insert or overwrite a detail
    ///
    /// A new key arriving at a full store first evicts the least recently
    /// used entry. Overwriting restarts the entry's ttl.
    pub fn set(&mut self, uri: impl Into<ArticleUri>, detail: ArticleDetail) {
        let uri = uri.into();
        let now = self.clock.now();

        if !self.entries.contains(uri.as_str()) && self.entries.len() >= self.entries.cap().get() {
            if let Some((evicted_uri, evicted)) = self.entries.pop_lru() {
                self.stats.evictions_capacity += 1;
                self.notify(&evicted_uri, &evicted.detail, EvictionReason::Capacity);
            }
        }

        if let Some(previous) = self.entries.put(uri.clone(), CacheEntry::new(detail, now)) {
            self.stats.replacements += 1;
            self.notify(&uri, &previous.detail, EvictionReason::Replaced);
        }
    }

    /// Remove a specific entry
    pub fn remove(&mut self, uri: &str) -> Option<ArticleDetail> {
        self.evict(uri, EvictionReason::Removed)
    }

    /// Whether a live (non-expired) entry exists for `uri`
    pub fn contains(&self, uri: &str) -> bool {
        self.peek(uri).is_some()
    }

    /// Remove every stale entry, returning the evicted uris
    pub fn purge_expired(&mut self) -> Vec<ArticleUri> {
        let now = self.clock.now();
        let expired: Vec<ArticleUri> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, self.ttl))
            .map(|(uri, _)| uri.clone())
            .collect();

        for uri in &expired {
            self.evict(uri, EvictionReason::Expired);
        }

        if !expired.is_empty() {
            debug!("Purged {} expired entries", expired.len());
        }

        expired
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        while let Some((uri, entry)) = self.entries.pop_lru() {
            self.stats.removals += 1;
            self.notify(&uri, &entry.detail, EvictionReason::Removed);
        }
    }

    /// Uris from most to least recently used (stale entries included)
    pub fn uris(&self) -> Vec<ArticleUri> {
        self.entries.iter().map(|(uri, _)| uri.clone()).collect()
    }

    /// Number of held entries, including stale ones not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current statistics
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.entries.len(),
            ..self.stats.clone()
        }
    }

    fn evict(&mut self, uri: &str, reason: EvictionReason) -> Option<ArticleDetail> {
        let entry = self.entries.pop(uri)?;

        match reason {
            EvictionReason::Expired => self.stats.evictions_ttl += 1,
            EvictionReason::Removed => self.stats.removals += 1,
            EvictionReason::Capacity => self.stats.evictions_capacity += 1,
            EvictionReason::Replaced => self.stats.replacements += 1,
        }

        self.notify(uri, &entry.detail, reason);
        Some(entry.detail)
    }

    fn notify(&self, uri: &str, detail: &ArticleDetail, reason: EvictionReason) {
        if let Some(listener) = &self.listener {
            listener(uri, detail, reason);
        }
    }
}

impl std::fmt::Debug for ExpiringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpiringStore")
            .field("entries", &self.entries.len())
            .field("capacity", &self.entries.cap())
            .field("ttl", &self.ttl)
            .field("stats", &self.stats)
            .finish()
    }
}
