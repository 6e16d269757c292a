//! Effective position of possibly-attached entities.
//!
//! An attached entity's stored position is an offset; its world position is
//! the host's live position plus that offset. Resolution goes through the
//! registries every time it is asked for.

use entity_pool::Attachment;
use glam::Vec3;

use crate::registry::{PlayerRegistry, VehicleRegistry};

/// Resolve the world position of an entity.
///
/// Returns `None` when the entity is attached to a host that is no longer
/// present. Callers fall back to the last position they resolved.
pub fn effective_position<P, V>(
    stored: Vec3,
    attachment: Attachment,
    players: &P,
    vehicles: &V,
) -> Option<Vec3>
where
    P: PlayerRegistry + ?Sized,
    V: VehicleRegistry + ?Sized,
{
    match attachment {
        Attachment::None => Some(stored),
        Attachment::Player(id) => players.player(id).map(|host| host.position + stored),
        Attachment::Vehicle(id) => vehicles.vehicle_position(id).map(|host| host + stored),
    }
}
