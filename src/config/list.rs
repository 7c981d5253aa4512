//! Configuration for the reader/writer-locked list.

use core::fmt;

/// Configuration for a [`RwList`](crate::RwList).
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RwListConfig {
    /// Number of elements the list can hold before reallocating.
    pub capacity: usize,
}

impl fmt::Debug for RwListConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RwListConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
