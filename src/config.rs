//! Container Configuration Module
//!
//! This module provides the construction-time configuration for every
//! container in the crate. Each container has its own configuration struct
//! with public fields.
//!
//! # Design Philosophy
//!
//! Configuration structs have all public fields for simple instantiation:
//!
//! - **Simple**: Just create the struct with all fields set, or start from
//!   `Default` and override what matters
//! - **Construction-time only**: Nothing is read from files or the
//!   environment, and nothing can be changed after the container is built
//!
//! # Configs
//!
//! | Config | Container | Description |
//! |--------|-----------|-------------|
//! | `BlockingQueueConfig` | [`BlockingQueue`](crate::BlockingQueue) | Initial buffer capacity |
//! | `ExpiringCacheConfig` | [`ExpiringCache`](crate::ExpiringCache) | Default TTL, sweep interval, read-time expiry |
//! | `DualKeyMapConfig` | [`DualKeyMap`](crate::DualKeyMap) | Initial capacity of both maps |
//! | `RwListConfig` | [`RwList`](crate::RwList) | Initial capacity |
//!
//! # Examples
//!
//! ```
//! use threaded_collections::config::ExpiringCacheConfig;
//! use threaded_collections::ExpiringCache;
//! use std::time::Duration;
//!
//! // Sessions live 15 minutes; sweep twice a second
//! let config = ExpiringCacheConfig {
//!     default_ttl: Duration::from_secs(15 * 60),
//!     sweep_interval: Some(Duration::from_millis(500)),
//!     ..ExpiringCacheConfig::default()
//! };
//! let cache: ExpiringCache<String, u64> = ExpiringCache::init(config);
//! ```

pub mod dual_key;
pub mod expiring;
pub mod list;
pub mod queue;

pub use dual_key::DualKeyMapConfig;
pub use expiring::ExpiringCacheConfig;
pub use list::RwListConfig;
pub use queue::BlockingQueueConfig;
