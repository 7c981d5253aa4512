//! Configuration for the blocking queue.

use core::fmt;

/// Configuration for a [`BlockingQueue`](crate::BlockingQueue).
///
/// # Examples
///
/// ```
/// use threaded_collections::config::BlockingQueueConfig;
/// use threaded_collections::BlockingQueue;
///
/// let config = BlockingQueueConfig { capacity: 256 };
/// let queue: BlockingQueue<u32> = BlockingQueue::init(config);
/// assert!(queue.is_empty());
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockingQueueConfig {
    /// Number of elements the queue can hold before its buffer reallocates.
    /// This is not a bound; `enqueue` never blocks.
    pub capacity: usize,
}

impl fmt::Debug for BlockingQueueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingQueueConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_config_default() {
        assert_eq!(BlockingQueueConfig::default().capacity, 0);
    }
}
