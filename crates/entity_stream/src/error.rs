//! Streaming error types.

use entity_net::EntityKind;
use entity_pool::{PlayerId, PoolError, VehicleId};

/// Errors returned by entity operations. None of them are fatal: the caller
/// decides whether to retry or report upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Allocation failed or a handle was stale.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// A raw pool ID names no live entity.
    #[error("no live {kind:?} with id {id}")]
    UnknownId {
        /// Kind that was looked up.
        kind: EntityKind,
        /// The rejected ID.
        id: u16,
    },

    /// A player-scoped entity was requested for a player who is not connected.
    #[error("{0} is not connected")]
    PlayerNotConnected(PlayerId),

    /// A vehicle was referenced that is not spawned.
    #[error("{0} is not spawned")]
    VehicleNotFound(VehicleId),
}
