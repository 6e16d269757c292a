//! Identifier types shared by every pool.
//!
//! Player and vehicle IDs are owned by their registries and only referenced
//! here. A [`Handle`] is what the pools hand out: the wire-visible slot index
//! plus a generation counter that detects reuse of the slot.

use serde::{Deserialize, Serialize};

/// Wire value meaning "no player".
pub const INVALID_PLAYER_ID: u16 = 0xFFFF;

/// Wire value meaning "no vehicle".
pub const INVALID_VEHICLE_ID: u16 = 0xFFFF;

/// A connected player's identifier, as assigned by the player registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u16);

impl PlayerId {
    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the ID as a slot index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// A vehicle's identifier, as assigned by the vehicle registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VehicleId(pub u16);

impl VehicleId {
    /// Returns the raw wire value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Vehicle({})", self.0)
    }
}

/// A generational reference to a pool slot.
///
/// `index` is the pool ID sent over the wire. `generation` changes every time
/// the slot is released, so a handle kept past its entity's destruction no
/// longer matches the slot and is rejected instead of aliasing the next
/// occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Handle {
    /// Slot index, `[0, capacity)`.
    pub index: u16,
    /// Slot generation at allocation time.
    pub generation: u32,
}

impl Handle {
    /// Create a handle from its parts.
    #[must_use]
    pub const fn new(index: u16, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The pool ID as it appears on the wire.
    #[must_use]
    pub const fn id(self) -> u16 {
        self.index
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
