//! Collaborator interfaces for players and vehicles.
//!
//! The streaming engine never owns a player or a vehicle. It reads their live
//! state through these traits on every decision, so a host that disappeared
//! simply resolves to `None`.
//!
//! [`Players`] and [`Vehicles`] are the in-memory implementations the server
//! binary keeps up to date from host commands.

use std::collections::BTreeMap;

use entity_pool::{PlayerId, VehicleId};
use glam::Vec3;

/// The parts of a connected player the engine reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    /// Live world position.
    pub position: Vec3,
    /// Current virtual world.
    pub virtual_world: i32,
}

/// Read access to connected players.
pub trait PlayerRegistry {
    /// State of a connected player, `None` if the ID is not connected.
    fn player(&self, id: PlayerId) -> Option<PlayerState>;

    /// Every connected player, ascending.
    fn connected_players(&self) -> Vec<PlayerId>;
}

/// Read access to spawned vehicles.
pub trait VehicleRegistry {
    /// Live position of a vehicle, `None` if the ID names no vehicle.
    fn vehicle_position(&self, id: VehicleId) -> Option<Vec3>;
}

/// In-memory player registry.
#[derive(Debug, Default, Clone)]
pub struct Players {
    players: BTreeMap<PlayerId, PlayerState>,
}

impl Players {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a connection. Returns `false` if the ID was already connected,
    /// in which case the stored state is replaced.
    pub fn connect(&mut self, id: PlayerId, position: Vec3, virtual_world: i32) -> bool {
        self.players
            .insert(
                id,
                PlayerState {
                    position,
                    virtual_world,
                },
            )
            .is_none()
    }

    /// Forget a player. Returns the last known state.
    pub fn disconnect(&mut self, id: PlayerId) -> Option<PlayerState> {
        self.players.remove(&id)
    }

    /// Update a player's position. Returns `false` for unknown IDs.
    pub fn set_position(&mut self, id: PlayerId, position: Vec3) -> bool {
        self.players
            .get_mut(&id)
            .map(|p| p.position = position)
            .is_some()
    }

    /// Update a player's virtual world. Returns `false` for unknown IDs.
    pub fn set_virtual_world(&mut self, id: PlayerId, virtual_world: i32) -> bool {
        self.players
            .get_mut(&id)
            .map(|p| p.virtual_world = virtual_world)
            .is_some()
    }

    /// Number of connected players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Returns `true` if nobody is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PlayerRegistry for Players {
    fn player(&self, id: PlayerId) -> Option<PlayerState> {
        self.players.get(&id).copied()
    }

    fn connected_players(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }
}

/// In-memory vehicle registry.
#[derive(Debug, Default, Clone)]
pub struct Vehicles {
    vehicles: BTreeMap<VehicleId, Vec3>,
}

impl Vehicles {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a spawned vehicle, replacing any previous position.
    pub fn spawn(&mut self, id: VehicleId, position: Vec3) {
        self.vehicles.insert(id, position);
    }

    /// Update a vehicle's position. Returns `false` for unknown IDs.
    pub fn set_position(&mut self, id: VehicleId, position: Vec3) -> bool {
        self.vehicles
            .get_mut(&id)
            .map(|p| *p = position)
            .is_some()
    }

    /// Forget a vehicle. Returns its last position.
    pub fn destroy(&mut self, id: VehicleId) -> Option<Vec3> {
        self.vehicles.remove(&id)
    }

    /// Number of spawned vehicles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    /// Returns `true` if no vehicle is spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }
}

impl VehicleRegistry for Vehicles {
    fn vehicle_position(&self, id: VehicleId) -> Option<Vec3> {
        self.vehicles.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_lifecycle() {
        let mut players = Players::new();
        assert!(players.connect(PlayerId(2), Vec3::ZERO, 0));
        assert!(players.connect(PlayerId(1), Vec3::X, 3));
        assert_eq!(players.connected_players(), vec![PlayerId(1), PlayerId(2)]);

        assert!(players.set_position(PlayerId(1), Vec3::Y));
        assert!(players.set_virtual_world(PlayerId(1), 7));
        assert_eq!(
            players.player(PlayerId(1)),
            Some(PlayerState {
                position: Vec3::Y,
                virtual_world: 7
            })
        );

        assert!(players.disconnect(PlayerId(1)).is_some());
        assert!(players.player(PlayerId(1)).is_none());
        assert!(!players.set_position(PlayerId(1), Vec3::Z));
        assert_eq!(players.len(), 1);
    }

    #[test]
    fn test_vehicle_lifecycle() {
        let mut vehicles = Vehicles::new();
        vehicles.spawn(VehicleId(5), Vec3::ONE);
        assert!(vehicles.set_position(VehicleId(5), Vec3::Z));
        assert_eq!(vehicles.vehicle_position(VehicleId(5)), Some(Vec3::Z));
        assert_eq!(vehicles.destroy(VehicleId(5)), Some(Vec3::Z));
        assert!(vehicles.vehicle_position(VehicleId(5)).is_none());
        assert!(!vehicles.set_position(VehicleId(5), Vec3::X));
    }
}
