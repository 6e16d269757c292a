//! Positional delegation from an entity to a host.
//!
//! Hosts are referenced by ID only and resolved through their registry on
//! every use; an ID whose host is gone resolves to "absent".

use serde::{Deserialize, Serialize};

use crate::id::{INVALID_PLAYER_ID, INVALID_VEHICLE_ID, PlayerId, VehicleId};

/// The host an entity's position follows, if any. At most one host is
/// active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Attachment {
    /// The entity uses its own stored position.
    #[default]
    None,
    /// The stored position is an offset from this player's live position.
    Player(PlayerId),
    /// The stored position is an offset from this vehicle's live position.
    Vehicle(VehicleId),
}

impl Attachment {
    /// Returns `true` if a host is set.
    #[must_use]
    pub const fn is_attached(self) -> bool {
        !matches!(self, Self::None)
    }

    /// The host player, if attached to one.
    #[must_use]
    pub const fn player(self) -> Option<PlayerId> {
        match self {
            Self::Player(id) => Some(id),
            _ => None,
        }
    }

    /// The host vehicle, if attached to one.
    #[must_use]
    pub const fn vehicle(self) -> Option<VehicleId> {
        match self {
            Self::Vehicle(id) => Some(id),
            _ => None,
        }
    }

    /// Host player ID as sent on the wire.
    #[must_use]
    pub const fn wire_player_id(self) -> u16 {
        match self {
            Self::Player(id) => id.0,
            _ => INVALID_PLAYER_ID,
        }
    }

    /// Host vehicle ID as sent on the wire.
    #[must_use]
    pub const fn wire_vehicle_id(self) -> u16 {
        match self {
            Self::Vehicle(id) => id.0,
            _ => INVALID_VEHICLE_ID,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_ids() {
        let none = Attachment::None;
        assert_eq!(none.wire_player_id(), INVALID_PLAYER_ID);
        assert_eq!(none.wire_vehicle_id(), INVALID_VEHICLE_ID);

        let on_player = Attachment::Player(PlayerId(4));
        assert_eq!(on_player.wire_player_id(), 4);
        assert_eq!(on_player.wire_vehicle_id(), INVALID_VEHICLE_ID);

        let on_vehicle = Attachment::Vehicle(VehicleId(9));
        assert_eq!(on_vehicle.wire_player_id(), INVALID_PLAYER_ID);
        assert_eq!(on_vehicle.wire_vehicle_id(), 9);
    }

    #[test]
    fn test_host_accessors() {
        assert!(!Attachment::default().is_attached());
        assert_eq!(Attachment::Player(PlayerId(1)).player(), Some(PlayerId(1)));
        assert_eq!(Attachment::Player(PlayerId(1)).vehicle(), None);
        assert_eq!(Attachment::Vehicle(VehicleId(2)).vehicle(), Some(VehicleId(2)));
    }

    #[test]
    fn test_serialization_roundtrip() {
        let attachment = Attachment::Vehicle(VehicleId(12));
        let bytes = rmp_serde::to_vec(&attachment).unwrap();
        let restored: Attachment = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(attachment, restored);
    }
}
