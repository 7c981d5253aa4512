//! Container Metrics System
//!
//! Provides counters for the containers and a common [`ContainerMetrics`]
//! trait that reports them as a `BTreeMap<String, f64>`.
//!
//! # Why Atomics?
//!
//! Most container operations only hold a *shared* lock (cache reads, TTL
//! renewals), so the counters cannot live behind the container lock as plain
//! integers. Each counter is an `AtomicU64` updated with `Relaxed` ordering:
//! the numbers are for monitoring, not for synchronisation, and a snapshot
//! may be slightly inconsistent across counters under concurrent load.
//!
//! # Why BTreeMap over HashMap?
//!
//! - **Deterministic ordering**: Metrics always appear in consistent order
//! - **Reproducible output**: Logs and test assertions stay stable

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod expiring;
pub mod queue;

pub use expiring::ExpiringCacheMetrics;
pub use queue::BlockingQueueMetrics;

/// A monotonically increasing event counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    /// Creates a counter starting at zero.
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Adds one.
    #[inline]
    pub fn incr(&self) {
        self.add(1);
    }

    /// Adds `n`.
    #[inline]
    pub fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    /// Returns the current value.
    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Returns `part / whole`, or 0.0 when `whole` is zero.
pub(crate) fn ratio(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64
    } else {
        0.0
    }
}

/// Trait implemented by containers that report metrics.
///
/// # Example
///
/// ```
/// use threaded_collections::metrics::ContainerMetrics;
/// use threaded_collections::BlockingQueue;
///
/// let queue = BlockingQueue::new();
/// queue.enqueue(1);
/// let metrics = queue.metrics();
/// assert_eq!(metrics["enqueued"], 1.0);
/// assert_eq!(queue.container_name(), "BlockingQueue");
/// ```
pub trait ContainerMetrics {
    /// Returns all metrics as key-value pairs sorted by name.
    fn metrics(&self) -> BTreeMap<String, f64>;

    /// Container name for identification in reports.
    fn container_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter() {
        let counter = Counter::new();
        counter.incr();
        counter.add(4);
        assert_eq!(counter.get(), 5);
    }

    #[test]
    fn test_ratio() {
        assert_eq!(ratio(1, 4), 0.25);
        assert_eq!(ratio(3, 0), 0.0);
    }
}
