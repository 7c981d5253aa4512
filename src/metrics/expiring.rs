//! Expiring Cache Metrics
//!
//! Besides the usual hit/miss accounting, the expiring cache tracks how its
//! entries leave the cache (sweep expirations) and how often the background
//! sweep found another sweep already running.

use super::{ratio, ContainerMetrics, Counter};
use std::collections::BTreeMap;
use std::string::ToString;

/// Counters maintained by an [`ExpiringCache`](crate::ExpiringCache).
#[derive(Debug, Default)]
pub struct ExpiringCacheMetrics {
    /// Lookups that found a value.
    pub hits: Counter,
    /// Lookups that found nothing (or only an expired entry).
    pub misses: Counter,
    /// New entries created.
    pub insertions: Counter,
    /// Existing entries whose value and TTL were replaced.
    pub renewals: Counter,
    /// Producer invocations by `get_or_insert_with` and friends.
    pub producer_calls: Counter,
    /// Entries removed by a sweep.
    pub expirations: Counter,
    /// Completed sweeps.
    pub sweeps: Counter,
    /// Sweeps dropped because another sweep was in progress.
    pub skipped_sweeps: Counter,
}

impl ExpiringCacheMetrics {
    /// Fraction of lookups that were hits.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.get();
        ratio(hits, hits + self.misses.get())
    }

    /// Converts the counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();

        metrics.insert("cache_hits".to_string(), self.hits.get() as f64);
        metrics.insert("cache_misses".to_string(), self.misses.get() as f64);
        metrics.insert("expirations".to_string(), self.expirations.get() as f64);
        metrics.insert("insertions".to_string(), self.insertions.get() as f64);
        metrics.insert(
            "producer_calls".to_string(),
            self.producer_calls.get() as f64,
        );
        metrics.insert("renewals".to_string(), self.renewals.get() as f64);
        metrics.insert(
            "skipped_sweeps".to_string(),
            self.skipped_sweeps.get() as f64,
        );
        metrics.insert("sweeps".to_string(), self.sweeps.get() as f64);

        metrics.insert("hit_rate".to_string(), self.hit_rate());

        metrics
    }
}

impl ContainerMetrics for ExpiringCacheMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn container_name(&self) -> &'static str {
        "ExpiringCache"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let metrics = ExpiringCacheMetrics::default();
        assert_eq!(metrics.hit_rate(), 0.0);

        metrics.hits.add(3);
        metrics.misses.incr();
        assert_eq!(metrics.hit_rate(), 0.75);
        assert_eq!(metrics.to_btreemap()["cache_hits"], 3.0);
    }
}
