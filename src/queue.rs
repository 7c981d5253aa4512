//! Blocking Queue Implementation
//!
//! A FIFO queue whose consumers block until an element arrives, optionally
//! bounded by a timeout.
//!
//! # How It Works
//!
//! A single `parking_lot::Mutex` guards the buffer and a `Condvar` carries the
//! "element available" signal:
//!
//! ```text
//!   enqueue ──▶ lock ──▶ push_back ──▶ notify_one ──▶ unlock
//!
//!   dequeue ──▶ lock ──▶ ┌─ pop_front? ── yes ──▶ return
//!                        │      no
//!                        │      ▼
//!                        │  closed? ── yes ──▶ Err(Closed)
//!                        │      no
//!                        │      ▼
//!                        └─ wait_until(deadline) ── timed out ──▶ Err(Timeout)
//! ```
//!
//! The wait is always against a fixed deadline computed once per call, so a
//! spurious wakeup simply loops and waits again for whatever budget remains.
//!
//! # Teardown
//!
//! [`BlockingQueue::close`] wakes every blocked consumer. Consumers drain any
//! elements that are still queued and then get [`Error::Closed`] instead of
//! waiting forever. Enqueueing after close still succeeds.
//!
//! # Example
//!
//! ```rust
//! use threaded_collections::BlockingQueue;
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//!
//! let queue = Arc::new(BlockingQueue::new());
//!
//! let producer = {
//!     let queue = Arc::clone(&queue);
//!     thread::spawn(move || {
//!         for i in 0..3 {
//!             queue.enqueue(i);
//!         }
//!     })
//! };
//!
//! for expected in 0..3 {
//!     assert_eq!(queue.dequeue_with_timeout(Duration::from_secs(5)), Ok(expected));
//! }
//! producer.join().unwrap();
//! ```

use crate::config::BlockingQueueConfig;
use crate::error::{Error, Result};
use crate::metrics::{BlockingQueueMetrics, ContainerMetrics};
use core::fmt;
use parking_lot::{Condvar, Mutex};
use std::collections::{BTreeMap, VecDeque};
use std::time::{Duration, Instant};

struct State<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A thread-safe FIFO queue with blocking, timeout-aware dequeue.
///
/// Dequeue order equals the order in which enqueues completed. `enqueue`
/// never blocks and never fails.
pub struct BlockingQueue<T> {
    state: Mutex<State<T>>,
    available: Condvar,
    metrics: BlockingQueueMetrics,
}

impl<T> BlockingQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::init(BlockingQueueConfig::default())
    }

    /// Creates an empty queue from a configuration.
    pub fn init(config: BlockingQueueConfig) -> Self {
        Self::from_deque(VecDeque::with_capacity(config.capacity))
    }

    /// Creates an empty queue with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::init(BlockingQueueConfig { capacity })
    }

    fn from_deque(items: VecDeque<T>) -> Self {
        Self {
            state: Mutex::new(State {
                items,
                closed: false,
            }),
            available: Condvar::new(),
            metrics: BlockingQueueMetrics::default(),
        }
    }

    /// Appends `value` to the tail and wakes at most one waiting consumer.
    pub fn enqueue(&self, value: T) {
        let mut state = self.state.lock();
        state.items.push_back(value);
        self.metrics.enqueued.incr();
        self.available.notify_one();
    }

    /// Removes and returns the head, blocking until an element is available.
    ///
    /// Only fails with [`Error::Closed`] once the queue has been closed and
    /// drained.
    pub fn dequeue(&self) -> Result<T> {
        self.dequeue_until(None)
    }

    /// Removes and returns the head, waiting at most `timeout`.
    ///
    /// On [`Error::Timeout`] the queue is left untouched.
    pub fn dequeue_with_timeout(&self, timeout: Duration) -> Result<T> {
        // An unrepresentable deadline is as good as no deadline.
        self.dequeue_until(Instant::now().checked_add(timeout))
    }

    /// Removes and returns the head if one is available, without blocking.
    pub fn try_dequeue(&self) -> Option<T> {
        let mut state = self.state.lock();
        let value = state.items.pop_front();
        if value.is_some() {
            self.metrics.dequeued.incr();
        }
        value
    }

    fn dequeue_until(&self, deadline: Option<Instant>) -> Result<T> {
        let mut state = self.state.lock();
        let mut waited = false;

        loop {
            if let Some(value) = state.items.pop_front() {
                self.metrics.dequeued.incr();
                if waited {
                    self.metrics.waits.incr();
                }
                return Ok(value);
            }
            if state.closed {
                return Err(Error::Closed);
            }

            waited = true;
            match deadline {
                Some(deadline) => {
                    if self.available.wait_until(&mut state, deadline).timed_out() {
                        self.metrics.timeouts.incr();
                        tracing::trace!("dequeue timed out");
                        return Err(Error::Timeout);
                    }
                }
                None => self.available.wait(&mut state),
            }
        }
    }

    /// Returns the current number of queued elements.
    ///
    /// Advisory only: other threads may change the length right after the
    /// lock is released.
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Returns `true` if nothing is queued at the moment of the call.
    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    /// Returns `true` if an element equal to `value` is currently queued.
    pub fn contains(&self, value: &T) -> bool
    where
        T: PartialEq,
    {
        self.state.lock().items.contains(value)
    }

    /// Drops every queued element.
    pub fn clear(&self) {
        self.state.lock().items.clear();
    }

    /// Returns a copy of the queued elements, head first.
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.state.lock().items.iter().cloned().collect()
    }

    /// Closes the queue and wakes every blocked consumer.
    ///
    /// Queued elements remain available. Once they are drained, dequeues
    /// return [`Error::Closed`] instead of blocking. Closing twice is a no-op.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            state.closed = true;
            tracing::debug!(remaining = state.items.len(), "blocking queue closed");
        }
        self.available.notify_all();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for BlockingQueue<T> {
    /// Seeds the queue; the first vector element is dequeued first.
    fn from(items: Vec<T>) -> Self {
        Self::from_deque(VecDeque::from(items))
    }
}

impl<T> FromIterator<T> for BlockingQueue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_deque(iter.into_iter().collect())
    }
}

impl<T> ContainerMetrics for BlockingQueue<T> {
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.metrics.to_btreemap();
        metrics.insert("len".to_string(), self.len() as f64);
        metrics
    }

    fn container_name(&self) -> &'static str {
        self.metrics.container_name()
    }
}

impl<T> fmt::Debug for BlockingQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("BlockingQueue")
            .field("len", &state.items.len())
            .field("closed", &state.closed)
            .finish()
    }
}
