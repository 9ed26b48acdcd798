//! Hooks counting how lookups are served: index hits, misses and full scans.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for tracking how queries are served by the index layer.
///
/// Implementations must be cheap: the hooks run on every lookup.
pub trait IndexMetrics: Send + Sync {
    /// A lookup was answered by a registered index.
    fn index_hit(&self);

    /// A lookup named a key with no registered index.
    fn index_miss(&self);

    /// A lookup fell back to scanning `scanned` elements.
    fn scan_fallback(&self, scanned: usize);
}

/// A no-op implementation of [`IndexMetrics`].
#[derive(Default)]
pub struct NoopMetrics;

impl IndexMetrics for NoopMetrics {
    fn index_hit(&self) {}
    fn index_miss(&self) {}
    fn scan_fallback(&self, _scanned: usize) {}
}

/// Atomic counter implementation of [`IndexMetrics`].
#[derive(Default)]
pub struct CounterMetrics {
    /// Lookups served by an index.
    pub index_hits: AtomicU64,

    /// Lookups for unindexed keys.
    pub index_misses: AtomicU64,

    /// Full scans performed.
    pub scans: AtomicU64,

    /// Elements visited by full scans.
    pub scanned_elements: AtomicU64,
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MetricsSnapshot {
    /// Lookups served by an index.
    pub index_hits: u64,
    /// Lookups for unindexed keys.
    pub index_misses: u64,
    /// Full scans performed.
    pub scans: u64,
    /// Elements visited by full scans.
    pub scanned_elements: u64,
}

impl CounterMetrics {
    /// Reads all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            index_hits: self.index_hits.load(Ordering::Relaxed),
            index_misses: self.index_misses.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            scanned_elements: self.scanned_elements.load(Ordering::Relaxed),
        }
    }
}

impl IndexMetrics for CounterMetrics {
    fn index_hit(&self) {
        self.index_hits.fetch_add(1, Ordering::Relaxed);
    }

    fn index_miss(&self) {
        self.index_misses.fetch_add(1, Ordering::Relaxed);
    }

    fn scan_fallback(&self, scanned: usize) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        self.scanned_elements
            .fetch_add(scanned as u64, Ordering::Relaxed);
    }
}

/// Returns the default metrics implementation, [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn IndexMetrics> {
    Arc::new(NoopMetrics)
}
