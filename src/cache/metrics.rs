//! Hit/miss counters and latency/payload sampling
//!
//! Means are computed from running sums so they cover every sample since
//! construction, while only the most recent `window` samples are retained.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Running mean plus a bounded ring of recent samples
#[derive(Debug, Clone)]
pub struct SampleWindow {
    count: u64,
    sum: f64,
    recent: VecDeque<f64>,
    window: usize,
}

impl SampleWindow {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            count: 0,
            sum: 0.0,
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Add a sample; non-finite values are dropped
    pub fn push(&mut self, sample: f64) {
        if !sample.is_finite() {
            return;
        }

        self.count += 1;
        self.sum += sample;

        if self.recent.len() == self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(sample);
    }

    /// Mean over every sample ever pushed, 0 when empty
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Mean over the retained window, 0 when empty
    pub fn recent_mean(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f64>() / self.recent.len() as f64
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Retained samples, oldest first
    pub fn recent(&self) -> impl Iterator<Item = f64> + '_ {
        self.recent.iter().copied()
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.sum = 0.0;
        self.recent.clear();
    }
}

/// Records cache outcomes for one facade instance
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    hits: u64,
    misses: u64,
    latency_ms: SampleWindow,
    payload_bytes: SampleWindow,
}

impl MetricsRecorder {
    pub fn new(sample_window: usize) -> Self {
        Self {
            hits: 0,
            misses: 0,
            latency_ms: SampleWindow::new(sample_window),
            payload_bytes: SampleWindow::new(sample_window),
        }
    }

    /// A lookup found a live entry
    pub fn record_hit(&mut self, latency_ms: f64) {
        self.hits += 1;
        self.latency_ms.push(latency_ms);
    }

    /// A lookup came back empty; the payload size is only known when the
    /// caller already has fresh data
    pub fn record_miss(&mut self, latency_ms: f64, payload_bytes: Option<usize>) {
        self.misses += 1;
        self.latency_ms.push(latency_ms);
        if let Some(bytes) = payload_bytes {
            self.payload_bytes.push(bytes as f64);
        }
    }

    /// Payload size of a freshly written detail; counters are unchanged
    ///
    /// Sizes are UTF-8 byte lengths of the JSON encoding, so non-ASCII
    /// text counts more than one unit per character.
    pub fn record_payload(&mut self, payload_bytes: usize) {
        self.payload_bytes.push(payload_bytes as f64);
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }

    /// Derive aggregate statistics
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total = self.total_requests();
        let (hit_rate, miss_rate) = if total == 0 {
            (0.0, 0.0)
        } else {
            (
                self.hits as f64 / total as f64,
                self.misses as f64 / total as f64,
            )
        };

        MetricsSnapshot {
            hits: self.hits,
            misses: self.misses,
            total_requests: total,
            hit_rate,
            miss_rate,
            avg_latency_ms: self.latency_ms.mean(),
            recent_avg_latency_ms: self.latency_ms.recent_mean(),
            avg_memory_bytes: self.payload_bytes.mean(),
            latency_samples: self.latency_ms.count(),
            memory_samples: self.payload_bytes.count(),
        }
    }

    pub fn reset(&mut self) {
        self.hits = 0;
        self.misses = 0;
        self.latency_ms.clear();
        self.payload_bytes.clear();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Point-in-time view of cache performance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub total_requests: u64,
    /// Fraction of lookups that hit, 0.0 - 1.0
    pub hit_rate: f64,
    /// Fraction of lookups that missed, 0.0 - 1.0
    pub miss_rate: f64,
    pub avg_latency_ms: f64,
    pub recent_avg_latency_ms: f64,
    pub avg_memory_bytes: f64,
    pub latency_samples: u64,
    pub memory_samples: u64,
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hitRate: {:.2}, missRate: {:.2}, avgLatency: {:.2} ms, avgMemoryUsage: {:.2} bytes, totalRequests: {}",
            self.hit_rate,
            self.miss_rate,
            self.avg_latency_ms,
            self.avg_memory_bytes,
            self.total_requests
        )
    }
}
