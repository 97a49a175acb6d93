//! Eviction reasons and listeners
//!
//! Listeners exist for diagnostics. They run while the store is being
//! mutated and must not call back into the cache.

use crate::cache::types::ArticleDetail;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Why an entry left the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionReason {
    /// Evicted as least recently used to make room for a new key
    Capacity,

    /// Outlived its ttl (found stale on lookup or by a sweep)
    Expired,

    /// Removed explicitly by key or by `clear`
    Removed,

    /// Value overwritten by a later `set` for the same key
    Replaced,
}

impl std::fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvictionReason::Capacity => write!(f, "capacity"),
            EvictionReason::Expired => write!(f, "ttl expired"),
            EvictionReason::Removed => write!(f, "explicit removal"),
            EvictionReason::Replaced => write!(f, "replaced"),
        }
    }
}

/// Callback invoked for every entry that leaves the store
pub type EvictionListener = Arc<dyn Fn(&str, &ArticleDetail, EvictionReason) + Send + Sync>;

/// Default listener: debug-level log line per eviction
pub fn logging_listener() -> EvictionListener {
    Arc::new(|uri: &str, _detail: &ArticleDetail, reason: EvictionReason| {
        debug!(uri, %reason, "Evicted article");
    })
}
