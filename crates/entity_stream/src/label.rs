//! Attributes shared by global and player-scoped text labels.

use entity_net::messages::{LabelChange, LabelSpec};
use entity_net::{ClientMessage, Colour, EntityKind, HideTextLabel, ShowTextLabel};
use entity_pool::{Attachment, PlayerId, VehicleId};
use glam::Vec3;

use crate::error::StreamError;
use crate::registry::{PlayerRegistry, VehicleRegistry};

/// Reject an attach whose host is not currently in the registries.
pub(crate) fn require_host<P, V>(change: &LabelChange, players: &P, vehicles: &V) -> Result<(), StreamError>
where
    P: PlayerRegistry + ?Sized,
    V: VehicleRegistry + ?Sized,
{
    match *change {
        LabelChange::AttachToPlayer { player, .. } if players.player(player).is_none() => {
            Err(StreamError::PlayerNotConnected(player))
        }
        LabelChange::AttachToVehicle { vehicle, .. } if vehicles.vehicle_position(vehicle).is_none() => {
            Err(StreamError::VehicleNotFound(vehicle))
        }
        _ => Ok(()),
    }
}

/// The common state of a text label.
///
/// `position` is absolute while unattached and the offset from the host while
/// attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelData {
    pub(crate) text: String,
    pub(crate) position: Vec3,
    pub(crate) colour: Colour,
    pub(crate) draw_distance: f32,
    pub(crate) attachment: Attachment,
    pub(crate) test_los: bool,
}

impl LabelData {
    /// Build the initial state from creation parameters. Labels start
    /// unattached.
    #[must_use]
    pub fn from_spec(spec: &LabelSpec) -> Self {
        Self {
            text: spec.text.clone(),
            position: spec.position,
            colour: spec.colour,
            draw_distance: spec.draw_distance,
            attachment: Attachment::None,
            test_los: spec.test_los,
        }
    }

    pub(crate) fn attach_to_player(&mut self, player: PlayerId, offset: Vec3) {
        self.position = offset;
        self.attachment = Attachment::Player(player);
    }

    pub(crate) fn attach_to_vehicle(&mut self, vehicle: VehicleId, offset: Vec3) {
        self.position = offset;
        self.attachment = Attachment::Vehicle(vehicle);
    }

    /// Position always moves; only a player host is dropped.
    pub(crate) fn detach_from_player(&mut self, position: Vec3) {
        self.position = position;
        if self.attachment.player().is_some() {
            self.attachment = Attachment::None;
        }
    }

    /// Position always moves; only a vehicle host is dropped.
    pub(crate) fn detach_from_vehicle(&mut self, position: Vec3) {
        self.position = position;
        if self.attachment.vehicle().is_some() {
            self.attachment = Attachment::None;
        }
    }

    /// Apply every change that is not kind-specific. Returns the change back
    /// if the caller has to handle it.
    pub(crate) fn apply(&mut self, change: LabelChange) -> Option<LabelChange> {
        match change {
            LabelChange::Text(text) => self.text = text,
            LabelChange::Colour(colour) => self.colour = colour,
            LabelChange::Position(position) => self.position = position,
            LabelChange::DrawDistance(distance) => self.draw_distance = distance,
            LabelChange::TestLos(test_los) => self.test_los = test_los,
            LabelChange::AttachToPlayer { player, offset } => self.attach_to_player(player, offset),
            LabelChange::AttachToVehicle { vehicle, offset } => {
                self.attach_to_vehicle(vehicle, offset);
            }
            LabelChange::DetachFromPlayer { position } => self.detach_from_player(position),
            LabelChange::DetachFromVehicle { position } => self.detach_from_vehicle(position),
            other @ LabelChange::VirtualWorld(_) => return Some(other),
        }
        None
    }

    pub(crate) fn show(&self, kind: EntityKind, id: u16) -> ClientMessage {
        ClientMessage::ShowTextLabel(ShowTextLabel {
            kind,
            id,
            colour: self.colour,
            position: self.position,
            draw_distance: self.draw_distance,
            test_los: self.test_los,
            attached_player: self.attachment.wire_player_id(),
            attached_vehicle: self.attachment.wire_vehicle_id(),
            text: self.text.clone(),
        })
    }

    pub(crate) fn hide(kind: EntityKind, id: u16) -> ClientMessage {
        ClientMessage::HideTextLabel(HideTextLabel { kind, id })
    }
}

#[cfg(test)]
mod tests {
    use entity_pool::INVALID_VEHICLE_ID;

    use super::*;
    use crate::registry::{Players, Vehicles};

    fn data() -> LabelData {
        LabelData::from_spec(&LabelSpec {
            text: "Bank".into(),
            position: Vec3::new(1.0, 2.0, 3.0),
            ..LabelSpec::default()
        })
    }

    #[test]
    fn test_attach_replaces_host() {
        let mut d = data();
        d.attach_to_player(PlayerId(1), Vec3::Z);
        d.attach_to_vehicle(VehicleId(2), Vec3::X);
        assert_eq!(d.attachment, Attachment::Vehicle(VehicleId(2)));
        assert_eq!(d.position, Vec3::X);
    }

    #[test]
    fn test_detach_only_drops_matching_host() {
        let mut d = data();
        d.attach_to_vehicle(VehicleId(2), Vec3::X);
        d.detach_from_player(Vec3::Y);
        assert_eq!(d.attachment, Attachment::Vehicle(VehicleId(2)));
        assert_eq!(d.position, Vec3::Y);

        d.detach_from_vehicle(Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(d.attachment, Attachment::None);
        assert_eq!(d.position, Vec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_attach_needs_live_host() {
        let mut players = Players::new();
        players.connect(PlayerId(1), Vec3::ZERO, 0);
        let mut vehicles = Vehicles::new();
        vehicles.spawn(VehicleId(2), Vec3::ZERO);

        let to_player = |player| LabelChange::AttachToPlayer {
            player,
            offset: Vec3::Z,
        };
        let to_vehicle = |vehicle| LabelChange::AttachToVehicle {
            vehicle,
            offset: Vec3::Z,
        };
        assert_eq!(require_host(&to_player(PlayerId(1)), &players, &vehicles), Ok(()));
        assert_eq!(require_host(&to_vehicle(VehicleId(2)), &players, &vehicles), Ok(()));
        assert_eq!(
            require_host(&to_player(PlayerId(7)), &players, &vehicles),
            Err(StreamError::PlayerNotConnected(PlayerId(7)))
        );
        assert_eq!(
            require_host(&to_vehicle(VehicleId(8)), &players, &vehicles),
            Err(StreamError::VehicleNotFound(VehicleId(8)))
        );
        assert_eq!(
            require_host(&LabelChange::DetachFromVehicle { position: Vec3::ZERO }, &players, &vehicles),
            Ok(())
        );
    }

    #[test]
    fn test_show_message_fields() {
        let mut d = data();
        d.attach_to_player(PlayerId(6), Vec3::new(0.0, 0.0, 0.5));
        match d.show(EntityKind::TextLabel, 11) {
            ClientMessage::ShowTextLabel(show) => {
                assert_eq!(show.id, 11);
                assert_eq!(show.text, "Bank");
                assert_eq!(show.position, Vec3::new(0.0, 0.0, 0.5));
                assert_eq!(show.attached_player, 6);
                assert_eq!(show.attached_vehicle, INVALID_VEHICLE_ID);
            }
            other => panic!("unexpected {other:?}"),
        }
        let hide = LabelData::hide(EntityKind::PlayerTextLabel, 11);
        assert_eq!(hide.kind(), EntityKind::PlayerTextLabel);
    }

    #[test]
    fn test_apply_defers_virtual_world() {
        let mut d = data();
        assert_eq!(
            d.apply(LabelChange::VirtualWorld(3)),
            Some(LabelChange::VirtualWorld(3))
        );
        assert_eq!(d.apply(LabelChange::Text("ATM".into())), None);
        assert_eq!(d.text, "ATM");
    }
}
