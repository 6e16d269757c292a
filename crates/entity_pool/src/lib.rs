//! # entity_pool
//!
//! Identity and visibility bookkeeping for streamed world entities.
//!
//! This crate provides:
//!
//! - [`IdentityPool`] — lowest-free ID allocation over a fixed range, with
//!   generation counters so recycled IDs are detectable.
//! - [`EntityPool`] — an arena of records keyed by generational [`Handle`]s.
//! - [`VisibilityTracker`] — the bounded set of players an entity is streamed
//!   in for.
//! - [`Attachment`] — the weak, ID-based reference to a host player or vehicle.
//! - [`PoolLimits`] — capacities read once at startup.

pub mod attachment;
pub mod error;
pub mod id;
pub mod limits;
pub mod pool;
pub mod tracker;

pub use attachment::Attachment;
pub use error::PoolError;
pub use id::{Handle, INVALID_PLAYER_ID, INVALID_VEHICLE_ID, PlayerId, VehicleId};
pub use limits::PoolLimits;
pub use pool::{EntityPool, IdentityPool};
pub use tracker::VisibilityTracker;
