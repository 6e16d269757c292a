//! Pool error types.

use crate::id::Handle;

/// Errors returned by identity pools and visibility trackers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Every slot in the pool is occupied.
    #[error("pool exhausted: all {capacity} slots are in use")]
    Exhausted {
        /// The pool's fixed capacity.
        capacity: usize,
    },

    /// The handle does not name a live slot: it was released, belongs to an
    /// older generation, or is out of range.
    #[error("no live entity for handle {0}")]
    NotFound(Handle),

    /// A raw ID lies outside the pool's range.
    #[error("id {id} is out of range for capacity {capacity}")]
    OutOfRange {
        /// The rejected ID.
        id: usize,
        /// The pool's fixed capacity.
        capacity: usize,
    },
}
