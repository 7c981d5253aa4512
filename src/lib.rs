#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Container Selection Guide
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 Which Container Should I Use?                        │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                                                                      │
//! │  Handing work from producers to consumers? ──Yes──▶ BlockingQueue    │
//! │           │                                                          │
//! │          No                                                          │
//! │           ▼                                                          │
//! │  Values that go stale after a while? ──────Yes──▶ ExpiringCache      │
//! │           │                                                          │
//! │          No                                                          │
//! │           ▼                                                          │
//! │  Need lookup by two different ids? ────────Yes──▶ DualKeyMap         │
//! │           │                                                          │
//! │          No                                                          │
//! │           ▼                                                          │
//! │  Ordered, mostly-read collection ─────────────▶ RwList              │
//! │                                                                      │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Reference
//!
//! | Container | Locking | Reads return |
//! |-----------|---------|--------------|
//! | [`BlockingQueue`] | one mutex + condition variable | owned elements |
//! | [`ExpiringCache`] | upgradable rwlock + per-entry mutex | clones |
//! | [`DualKeyMap`] | upgradable rwlock over both indexes | clones |
//! | [`RwList`] | upgradable rwlock | clones / snapshots |
//!
//! Every container is `Send + Sync` when its element types are, and is meant
//! to be shared behind an `Arc`. All methods take `&self`.
//!
//! ## Code Examples
//!
//! ### BlockingQueue
//!
//! ```rust
//! use threaded_collections::{BlockingQueue, Error};
//! use std::time::Duration;
//!
//! let jobs = BlockingQueue::from(vec!["resize", "upload"]);
//! assert_eq!(jobs.dequeue(), Ok("resize"));
//! assert_eq!(jobs.dequeue(), Ok("upload"));
//! assert_eq!(jobs.dequeue_with_timeout(Duration::from_millis(10)), Err(Error::Timeout));
//! ```
//!
//! ### ExpiringCache
//!
//! ```rust
//! use threaded_collections::ExpiringCache;
//! use std::time::Duration;
//!
//! let tokens: ExpiringCache<u32, String> = ExpiringCache::new(Duration::from_secs(300));
//! let token = tokens.get_or_insert_with(7, Duration::from_secs(60), || "t-7".to_string());
//! assert_eq!(token, "t-7");
//! assert!(tokens.remaining_ttl(&7).unwrap() <= Duration::from_secs(60));
//! ```
//!
//! ### DualKeyMap
//!
//! ```rust
//! use threaded_collections::DualKeyMap;
//!
//! let conns = DualKeyMap::new();
//! conns.insert("peer-a".to_string(), 4u64, "10.0.0.4:443").unwrap();
//! assert_eq!(conns.get_by_key2(&4), Ok("10.0.0.4:443"));
//! assert_eq!(conns.key1_for(&4), Some("peer-a".to_string()));
//! ```
//!
//! ### RwList
//!
//! ```rust
//! use threaded_collections::RwList;
//!
//! let listeners = RwList::from(vec![1, 2, 3]);
//! let snapshot = listeners.iter();
//! listeners.push(4);
//! assert_eq!(snapshot.count(), 3);
//! ```

/// Upgradable reader/writer lock.
///
/// Wraps `parking_lot`'s upgradable read into owned guard types describing
/// the shared → exclusive → shared cycle used by the cache, the dual-key map
/// and the list.
pub mod lock;

/// Error type shared by every container.
pub mod error;

/// Container configuration structures.
pub mod config;

/// Expiring cache entry: a value with its expiry deadline.
pub mod entry;

/// Container metrics.
///
/// Atomic counters and the [`ContainerMetrics`](metrics::ContainerMetrics)
/// reporting trait.
pub mod metrics;

/// Blocking FIFO queue with timeout-aware dequeue.
pub mod queue;

/// Key/value cache with per-entry TTL and a background sweep thread.
pub mod expiring;

/// Map addressable by either of two bijectively paired keys.
pub mod dual_key;

/// Reader/writer-locked list with snapshot iteration.
pub mod list;

pub use dual_key::DualKeyMap;
pub use entry::CacheEntry;
pub use error::{Error, Result};
pub use expiring::ExpiringCache;
pub use list::RwList;
pub use lock::UpgradableRwLock;
pub use metrics::ContainerMetrics;
pub use queue::BlockingQueue;
