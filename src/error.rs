//! Error Types
//!
//! Every fallible container operation reports one of the [`Error`] variants
//! below. All of them are returned synchronously to the caller; no container
//! retries or swallows an error internally, and no error leaves a container
//! in a partially updated state.
//!
//! | Variant | Raised by | Meaning |
//! |---------|-----------|---------|
//! | [`Error::Timeout`] | [`BlockingQueue`](crate::BlockingQueue) | Timed dequeue elapsed |
//! | [`Error::Closed`] | [`BlockingQueue`](crate::BlockingQueue) | Queue closed and drained |
//! | [`Error::NotFound`] | [`ExpiringCache`](crate::ExpiringCache), [`DualKeyMap`](crate::DualKeyMap) | Key absent |
//! | [`Error::InvariantViolation`] | [`DualKeyMap`](crate::DualKeyMap) | Insert would break the key pairing |
//! | [`Error::AlreadyExists`] | [`RwList`](crate::RwList) | Duplicate value rejected |
//! | [`Error::IndexOutOfBounds`] | [`RwList`](crate::RwList) | Positional access past the end |
//!
//! `Timeout`, `Closed`, `NotFound` and `AlreadyExists` are ordinary control
//! flow. `InvariantViolation` signals a bug at the call site.

use thiserror::Error;

/// Errors returned by the containers in this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The dequeue wait exceeded the caller-specified timeout.
    #[error("timed out waiting for an element")]
    Timeout,

    /// The queue was closed and holds no more elements.
    #[error("queue is closed")]
    Closed,

    /// The requested key is not present.
    #[error("key not found")]
    NotFound,

    /// The operation would leave a key without its paired partner.
    #[error("dual-key invariant violated: {0}")]
    InvariantViolation(&'static str),

    /// An equal value is already stored.
    #[error("value already exists")]
    AlreadyExists,

    /// A positional operation addressed an index past the end.
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The length at the time of the call.
        len: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
