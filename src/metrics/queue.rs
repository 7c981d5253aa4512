//! Blocking Queue Metrics

use super::{ContainerMetrics, Counter};
use std::collections::BTreeMap;
use std::string::ToString;

/// Counters maintained by a [`BlockingQueue`](crate::BlockingQueue).
#[derive(Debug, Default)]
pub struct BlockingQueueMetrics {
    /// Elements appended.
    pub enqueued: Counter,
    /// Elements handed to a consumer.
    pub dequeued: Counter,
    /// Timed dequeues that gave up.
    pub timeouts: Counter,
    /// Dequeues that had to park at least once before getting an element.
    pub waits: Counter,
}

impl BlockingQueueMetrics {
    /// Converts the counters to a BTreeMap for reporting.
    pub fn to_btreemap(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::new();
        metrics.insert("dequeued".to_string(), self.dequeued.get() as f64);
        metrics.insert("enqueued".to_string(), self.enqueued.get() as f64);
        metrics.insert("timeouts".to_string(), self.timeouts.get() as f64);
        metrics.insert("waits".to_string(), self.waits.get() as f64);
        metrics
    }
}

impl ContainerMetrics for BlockingQueueMetrics {
    fn metrics(&self) -> BTreeMap<String, f64> {
        self.to_btreemap()
    }

    fn container_name(&self) -> &'static str {
        "BlockingQueue"
    }
}
