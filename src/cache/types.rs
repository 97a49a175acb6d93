//! Core type definitions for the article cache

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Article identifier assigned by the remote news source
pub type ArticleUri = String;

/// Full article payload as returned by the news API
///
/// The cache treats this as opaque and never mutates a stored detail.
/// Field names serialize in camelCase so persisted blobs match the API shape.
/// Only `uri` and `title` are required; the presentation fields accept
/// `null` or absence and fall back to empty values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleDetail {
    /// Globally unique identifier
    pub uri: ArticleUri,

    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    /// Image reference (usually a URL)
    #[serde(default, deserialize_with = "null_as_default")]
    pub image: String,

    /// Canonical article URL
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,

    /// Publication timestamp, kept verbatim as delivered by the API
    #[serde(default, deserialize_with = "null_as_default")]
    pub date_time: String,

    /// Source attribution
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: ArticleSource,
}

/// Publisher attribution for an article
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArticleSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Statistics for the bounded expiring store
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of entries currently held (expired-but-unswept entries included)
    pub entries: usize,

    /// Maximum number of entries
    pub capacity: usize,

    /// Evictions because the store was full
    pub evictions_capacity: u64,

    /// Evictions because an entry outlived its ttl
    pub evictions_ttl: u64,

    /// Explicit removals
    pub removals: u64,

    /// Values overwritten by a later `set` for the same uri
    pub replacements: u64,
}

impl StoreStats {
    /// Total evictions of any kind except overwrites
    pub fn total_evictions(&self) -> u64 {
        self.evictions_capacity + self.evictions_ttl + self.removals
    }

    /// Fill ratio in the range 0.0 - 1.0
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.entries as f64 / self.capacity as f64
        }
    }
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreStats {{ entries: {}/{}, evictions: {} (capacity: {}, ttl: {}, removed: {}), replacements: {} }}",
            self.entries,
            self.capacity,
            self.total_evictions(),
            self.evictions_capacity,
            self.evictions_ttl,
            self.removals,
            self.replacements
        )
    }
}
