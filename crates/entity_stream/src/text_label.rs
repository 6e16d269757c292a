//! Global text labels.
//!
//! A [`TextLabel`] is visible to every player in its virtual world and draw
//! distance. All setters live on [`TextLabels`] so that each of them restreams
//! the label before returning.

use entity_net::messages::{LabelChange, LabelSpec};
use entity_net::{ClientMessage, Colour, EntityKind, MessageSink};
use entity_pool::{Attachment, Handle, PlayerId, PoolError, VehicleId};
use glam::Vec3;

use crate::error::StreamError;
use crate::label::{LabelData, require_host};
use crate::registry::{PlayerRegistry, VehicleRegistry};
use crate::streamer::{StreamContext, Streamable, Streamer};

/// A text label streamed to every eligible player.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    data: LabelData,
    virtual_world: i32,
}

/// The global text label pool.
pub type TextLabels = Streamer<TextLabel>;

impl TextLabel {
    /// Build a label from creation parameters.
    #[must_use]
    pub fn new(spec: &LabelSpec) -> Self {
        Self {
            data: LabelData::from_spec(spec),
            virtual_world: spec.virtual_world,
        }
    }

    /// Label content.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.data.text
    }

    /// Text colour.
    #[must_use]
    pub fn colour(&self) -> Colour {
        self.data.colour
    }

    /// Stored position: absolute, or the offset from the host when attached.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.data.position
    }

    /// Render and streaming distance.
    #[must_use]
    pub fn draw_distance(&self) -> f32 {
        self.data.draw_distance
    }

    /// Current host, if any.
    #[must_use]
    pub fn attachment(&self) -> Attachment {
        self.data.attachment
    }

    /// Line-of-sight test flag.
    #[must_use]
    pub fn test_los(&self) -> bool {
        self.data.test_los
    }

    /// Virtual world.
    #[must_use]
    pub fn virtual_world(&self) -> i32 {
        self.virtual_world
    }
}

impl Streamable for TextLabel {
    const KIND: EntityKind = EntityKind::TextLabel;

    fn position(&self) -> Vec3 {
        self.data.position
    }

    fn attachment(&self) -> Attachment {
        self.data.attachment
    }

    fn virtual_world(&self) -> i32 {
        self.virtual_world
    }

    fn draw_distance(&self) -> f32 {
        self.data.draw_distance
    }

    fn detach(&mut self, position: Vec3) {
        self.data.position = position;
        self.data.attachment = Attachment::None;
    }

    fn show_message(&self, id: u16) -> ClientMessage {
        self.data.show(Self::KIND, id)
    }

    fn hide_message(&self, id: u16) -> ClientMessage {
        LabelData::hide(Self::KIND, id)
    }
}

impl Streamer<TextLabel> {
    /// Apply one attribute change and restream.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles, and
    /// [`StreamError::PlayerNotConnected`] or [`StreamError::VehicleNotFound`]
    /// when attaching to a host that does not exist. Nothing changes on error.
    pub fn apply<P, V, S>(
        &mut self,
        handle: Handle,
        change: LabelChange,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.get(handle).ok_or(PoolError::NotFound(handle))?;
        require_host(&change, ctx.players, ctx.vehicles)?;
        self.modify(handle, ctx, |label| {
            if let Some(LabelChange::VirtualWorld(world)) = label.data.apply(change) {
                label.virtual_world = world;
            }
        })
    }

    /// Replace the text.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_text<P, V, S>(
        &mut self,
        handle: Handle,
        text: impl Into<String>,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::Text(text.into()), ctx)
    }

    /// Replace the colour.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_colour<P, V, S>(
        &mut self,
        handle: Handle,
        colour: Colour,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::Colour(colour), ctx)
    }

    /// Move the label (or change its offset while attached).
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_position<P, V, S>(
        &mut self,
        handle: Handle,
        position: Vec3,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::Position(position), ctx)
    }

    /// Replace the draw distance.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_draw_distance<P, V, S>(
        &mut self,
        handle: Handle,
        draw_distance: f32,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::DrawDistance(draw_distance), ctx)
    }

    /// Move the label to another virtual world.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_virtual_world<P, V, S>(
        &mut self,
        handle: Handle,
        virtual_world: i32,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::VirtualWorld(virtual_world), ctx)
    }

    /// Toggle the line-of-sight test.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn set_test_los<P, V, S>(
        &mut self,
        handle: Handle,
        test_los: bool,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::TestLos(test_los), ctx)
    }

    /// Follow `player` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles and
    /// [`StreamError::PlayerNotConnected`] if the host is gone.
    pub fn attach_to_player<P, V, S>(
        &mut self,
        handle: Handle,
        player: PlayerId,
        offset: Vec3,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::AttachToPlayer { player, offset }, ctx)
    }

    /// Follow `vehicle` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles and
    /// [`StreamError::VehicleNotFound`] if the host is gone.
    pub fn attach_to_vehicle<P, V, S>(
        &mut self,
        handle: Handle,
        vehicle: VehicleId,
        offset: Vec3,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::AttachToVehicle { vehicle, offset }, ctx)
    }

    /// Stop following a player and stay at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn detach_from_player<P, V, S>(
        &mut self,
        handle: Handle,
        position: Vec3,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::DetachFromPlayer { position }, ctx)
    }

    /// Stop following a vehicle and stay at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Pool`] for stale handles.
    pub fn detach_from_vehicle<P, V, S>(
        &mut self,
        handle: Handle,
        position: Vec3,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.apply(handle, LabelChange::DetachFromVehicle { position }, ctx)
    }
}
