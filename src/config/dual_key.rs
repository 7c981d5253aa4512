//! Configuration for the dual-key map.

use core::fmt;

/// Configuration for a [`DualKeyMap`](crate::DualKeyMap).
///
/// The capacity is applied to both the key1 and the key2 side.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct DualKeyMapConfig {
    /// Number of pairs both internal maps can hold without rehashing.
    pub capacity: usize,
}

impl fmt::Debug for DualKeyMapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualKeyMapConfig")
            .field("capacity", &self.capacity)
            .finish()
    }
}
