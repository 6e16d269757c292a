//! Message types exchanged with clients and with the scripting host.
//!
//! [`ClientMessage`] is what the streaming engine emits: one creation or
//! destruction per (entity, player) transition. [`Command`] and
//! [`CommandReply`] are the request/response pair the host uses to drive the
//! server from outside the tick task.

use entity_pool::{PlayerId, VehicleId};
use glam::Vec3;
use serde::{Deserialize, Serialize};

// ── Shared attribute types ──────────────────────────────────────────────────

/// The kind of streamed entity a message refers to.
///
/// Global and player-scoped labels share the ID range on the wire, so the
/// client needs the kind to tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// A text label visible to every player in range.
    TextLabel,
    /// A text label that exists for a single owning player.
    PlayerTextLabel,
}

/// A packed `0xRRGGBBAA` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour(pub u32);

impl Colour {
    /// Opaque white.
    pub const WHITE: Colour = Colour(0xFFFF_FFFF);

    /// Pack a colour from its channels.
    #[must_use]
    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// The packed `0xRRGGBBAA` value.
    #[must_use]
    pub const fn rgba(self) -> u32 {
        self.0
    }

    /// The alpha channel.
    #[must_use]
    pub const fn alpha(self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

// ── Client messages ─────────────────────────────────────────────────────────

/// Creates a text label in one client's simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowTextLabel {
    /// Global or player-scoped.
    pub kind: EntityKind,
    /// Pool ID of the label.
    pub id: u16,
    /// Text colour.
    pub colour: Colour,
    /// Absolute position, or the offset from the host when attached.
    pub position: Vec3,
    /// Render distance.
    pub draw_distance: f32,
    /// Whether the client hides the label behind walls.
    pub test_los: bool,
    /// Host player, or [`INVALID_PLAYER_ID`](entity_pool::INVALID_PLAYER_ID).
    pub attached_player: u16,
    /// Host vehicle, or [`INVALID_VEHICLE_ID`](entity_pool::INVALID_VEHICLE_ID).
    pub attached_vehicle: u16,
    /// Label content.
    pub text: String,
}

/// Removes a text label from one client's simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HideTextLabel {
    /// Global or player-scoped.
    pub kind: EntityKind,
    /// Pool ID of the label.
    pub id: u16,
}

/// A message addressed to a single client connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientMessage {
    /// Stream in.
    ShowTextLabel(ShowTextLabel),
    /// Stream out.
    HideTextLabel(HideTextLabel),
}

impl ClientMessage {
    /// Returns `true` for creation messages.
    #[must_use]
    pub fn is_show(&self) -> bool {
        matches!(self, Self::ShowTextLabel(_))
    }

    /// Returns `true` for destruction messages.
    #[must_use]
    pub fn is_hide(&self) -> bool {
        matches!(self, Self::HideTextLabel(_))
    }

    /// The kind of entity the message is about.
    #[must_use]
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::ShowTextLabel(m) => m.kind,
            Self::HideTextLabel(m) => m.kind,
        }
    }

    /// The pool ID the message is about.
    #[must_use]
    pub fn id(&self) -> u16 {
        match self {
            Self::ShowTextLabel(m) => m.id,
            Self::HideTextLabel(m) => m.id,
        }
    }
}

// ── Commands ────────────────────────────────────────────────────────────────

/// Creation parameters for a text label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelSpec {
    /// Label content.
    pub text: String,
    /// Text colour.
    pub colour: Colour,
    /// Absolute world position.
    pub position: Vec3,
    /// Render and streaming distance.
    pub draw_distance: f32,
    /// Virtual world; ignored for player-scoped labels.
    pub virtual_world: i32,
    /// Line-of-sight test flag.
    pub test_los: bool,
}

impl Default for LabelSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            colour: Colour::WHITE,
            position: Vec3::ZERO,
            draw_distance: 50.0,
            virtual_world: 0,
            test_los: false,
        }
    }
}

/// A single attribute mutation on an existing label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelChange {
    /// Replace the text.
    Text(String),
    /// Replace the colour.
    Colour(Colour),
    /// Move to an absolute position (or change the offset while attached).
    Position(Vec3),
    /// Replace the draw distance.
    DrawDistance(f32),
    /// Move to another virtual world.
    VirtualWorld(i32),
    /// Toggle the line-of-sight test.
    TestLos(bool),
    /// Follow a player at `offset`.
    AttachToPlayer {
        /// Host player.
        player: PlayerId,
        /// Offset from the host.
        offset: Vec3,
    },
    /// Follow a vehicle at `offset`.
    AttachToVehicle {
        /// Host vehicle.
        vehicle: VehicleId,
        /// Offset from the host.
        offset: Vec3,
    },
    /// Stop following a player and stay at `position`.
    DetachFromPlayer {
        /// New absolute position.
        position: Vec3,
    },
    /// Stop following a vehicle and stay at `position`.
    DetachFromVehicle {
        /// New absolute position.
        position: Vec3,
    },
}

/// A request from the scripting host. Label IDs are raw pool IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// A client finished connecting.
    PlayerConnect {
        /// The new player.
        player: PlayerId,
        /// Spawn position.
        position: Vec3,
        /// Initial virtual world.
        virtual_world: i32,
    },
    /// A client left.
    PlayerDisconnect {
        /// The departing player.
        player: PlayerId,
    },
    /// A player's synced position changed.
    PlayerMove {
        /// The player.
        player: PlayerId,
        /// New position.
        position: Vec3,
    },
    /// A player changed virtual world.
    PlayerSetVirtualWorld {
        /// The player.
        player: PlayerId,
        /// New virtual world.
        virtual_world: i32,
    },
    /// A vehicle was spawned.
    VehicleSpawn {
        /// The vehicle.
        vehicle: VehicleId,
        /// Spawn position.
        position: Vec3,
    },
    /// A vehicle's synced position changed.
    VehicleMove {
        /// The vehicle.
        vehicle: VehicleId,
        /// New position.
        position: Vec3,
    },
    /// A vehicle was destroyed.
    VehicleDestroy {
        /// The vehicle.
        vehicle: VehicleId,
    },
    /// Create a global text label.
    CreateTextLabel(LabelSpec),
    /// Destroy a global text label.
    DestroyTextLabel {
        /// Pool ID.
        id: u16,
    },
    /// Mutate a global text label.
    UpdateTextLabel {
        /// Pool ID.
        id: u16,
        /// The mutation.
        change: LabelChange,
    },
    /// Create a text label for one player.
    CreatePlayerTextLabel {
        /// Owning player.
        owner: PlayerId,
        /// Creation parameters.
        spec: LabelSpec,
    },
    /// Destroy a player's text label.
    DestroyPlayerTextLabel {
        /// Owning player.
        owner: PlayerId,
        /// Pool ID within the owner's pool.
        id: u16,
    },
    /// Mutate a player's text label.
    UpdatePlayerTextLabel {
        /// Owning player.
        owner: PlayerId,
        /// Pool ID within the owner's pool.
        id: u16,
        /// The mutation.
        change: LabelChange,
    },
}

/// The outcome of a [`Command`], sent to the request's reply subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandReply {
    /// The command was applied.
    Ok,
    /// A label was created with this pool ID.
    Created {
        /// The allocated pool ID.
        id: u16,
    },
    /// The command was rejected.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_packing() {
        let c = Colour::from_rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(c.rgba(), 0x1234_5678);
        assert_eq!(c.alpha(), 0x78);
        assert_eq!(Colour::default(), Colour::WHITE);
    }

    #[test]
    fn test_client_message_accessors() {
        let hide = ClientMessage::HideTextLabel(HideTextLabel {
            kind: EntityKind::TextLabel,
            id: 9,
        });
        assert!(hide.is_hide());
        assert!(!hide.is_show());
        assert_eq!(hide.id(), 9);
        assert_eq!(hide.kind(), EntityKind::TextLabel);
    }

    #[test]
    fn test_command_roundtrip() {
        let cmd = Command::UpdateTextLabel {
            id: 4,
            change: LabelChange::AttachToPlayer {
                player: PlayerId(2),
                offset: Vec3::new(0.0, 0.0, 1.5),
            },
        };
        let bytes = rmp_serde::to_vec(&cmd).unwrap();
        let restored: Command = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(cmd, restored);
    }

    #[test]
    fn test_reply_roundtrip() {
        let reply = CommandReply::Failed {
            reason: "pool exhausted".to_string(),
        };
        let bytes = rmp_serde::to_vec(&reply).unwrap();
        let restored: CommandReply = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(reply, restored);
    }
}
