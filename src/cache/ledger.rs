//! Recently-viewed ledger
//!
//! Most recent first, deduplicated by uri, bounded in length. Recording a
//! uri that is already present is a no-op: the first write decides its
//! position.

use crate::cache::types::ArticleDetail;
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct RecentlyViewed {
    items: VecDeque<ArticleDetail>,
    capacity: usize,
}

impl RecentlyViewed {
    /// Create an empty ledger; a zero capacity is raised to one
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Prepend `detail` unless its uri is already listed
    ///
    /// Returns `true` when the ledger changed.
    pub fn record(&mut self, detail: ArticleDetail) -> bool {
        if self.contains(&detail.uri) {
            return false;
        }

        self.items.push_front(detail);
        if self.items.len() > self.capacity {
            self.items.pop_back();
        }
        true
    }

    /// Owned snapshot, most recent first
    pub fn list(&self) -> Vec<ArticleDetail> {
        self.items.iter().cloned().collect()
    }

    /// Replace the whole ledger with `items`, kept in the given order
    ///
    /// Later duplicates of a uri are dropped and the sequence is cut to
    /// capacity. Returns the details actually kept.
    pub fn restore(&mut self, items: Vec<ArticleDetail>) -> &VecDeque<ArticleDetail> {
        let mut seen = HashSet::new();
        self.items = items
            .into_iter()
            .filter(|detail| seen.insert(detail.uri.clone()))
            .take(self.capacity)
            .collect();
        &self.items
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.items.iter().any(|detail| detail.uri == uri)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterate without cloning, most recent first
    pub fn iter(&self) -> impl Iterator<Item = &ArticleDetail> {
        self.items.iter()
    }
}
