//! Player-scoped text labels.
//!
//! A [`PlayerTextLabel`] exists on its owner's client only. There is no
//! visibility tracker: the label is streamed in once on creation and streamed
//! out once on destruction or when the owner leaves. Each owner draws IDs from
//! its own pool, so two players can both hold a label with ID 0.

use std::collections::BTreeMap;

use entity_net::messages::{LabelChange, LabelSpec};
use entity_net::{Colour, EntityKind, MessageSink};
use entity_pool::{Attachment, EntityPool, Handle, PlayerId, PoolError};
use glam::Vec3;
use tracing::debug;

use crate::error::StreamError;
use crate::label::{LabelData, require_host};
use crate::registry::{PlayerRegistry, VehicleRegistry};
use crate::streamer::StreamContext;

const KIND: EntityKind = EntityKind::PlayerTextLabel;

/// A text label owned by, and visible to, a single player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerTextLabel {
    owner: PlayerId,
    data: LabelData,
    shown: bool,
}

impl PlayerTextLabel {
    fn new(owner: PlayerId, spec: &LabelSpec) -> Self {
        Self {
            owner,
            data: LabelData::from_spec(spec),
            shown: false,
        }
    }

    /// The owning player.
    #[must_use]
    pub fn owner(&self) -> PlayerId {
        self.owner
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

    /// Render distance on the owner's client.
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

    /// Player labels always live in world 0.
    #[must_use]
    pub fn virtual_world(&self) -> i32 {
        0
    }

    /// Returns `true` while the label exists on the owner's client.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    fn show<S: MessageSink + ?Sized>(&mut self, id: u16, sink: &mut S) {
        sink.send(self.owner, self.data.show(KIND, id));
        self.shown = true;
    }

    /// Stream the label out. Returns `false`, and sends nothing, if it was
    /// not streamed in.
    fn hide<S: MessageSink + ?Sized>(&mut self, id: u16, sink: &mut S) -> bool {
        if !self.shown {
            return false;
        }
        sink.send(self.owner, LabelData::hide(KIND, id));
        self.shown = false;
        true
    }

    fn restream<S: MessageSink + ?Sized>(&mut self, id: u16, sink: &mut S) {
        if self.hide(id, sink) {
            self.show(id, sink);
        }
    }
}

/// Every player's private label pool.
#[derive(Debug, Clone)]
pub struct PlayerTextLabels {
    pools: BTreeMap<PlayerId, EntityPool<PlayerTextLabel>>,
    capacity: usize,
}

impl PlayerTextLabels {
    /// Create an empty set of pools, each holding up to `capacity` labels.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            pools: BTreeMap::new(),
            capacity,
        }
    }

    /// Create a label for `owner` and stream it in on the owner's client.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::PlayerNotConnected`] if `owner` is not
    /// connected, or [`PoolError::Exhausted`] (wrapped) when the owner's pool
    /// is full.
    pub fn create<P, S>(
        &mut self,
        owner: PlayerId,
        spec: &LabelSpec,
        players: &P,
        sink: &mut S,
    ) -> Result<Handle, StreamError>
    where
        P: PlayerRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        if players.player(owner).is_none() {
            return Err(StreamError::PlayerNotConnected(owner));
        }
        let capacity = self.capacity;
        let pool = self
            .pools
            .entry(owner)
            .or_insert_with(|| EntityPool::new(capacity));
        let handle = pool.insert_with(|_| PlayerTextLabel::new(owner, spec))?;
        if let Some(label) = pool.get_mut(handle) {
            label.show(handle.id(), sink);
        }
        debug!(%owner, id = handle.id(), "player text label created");
        Ok(handle)
    }

    /// Stream the label out for its owner and release its ID.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles; nothing is
    /// sent in that case.
    pub fn destroy<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        sink: &mut S,
    ) -> Result<PlayerTextLabel, StreamError> {
        let pool = self
            .pools
            .get_mut(&owner)
            .ok_or(StreamError::Pool(PoolError::NotFound(handle)))?;
        let mut label = pool.remove(handle)?;
        label.hide(handle.id(), sink);
        debug!(%owner, id = handle.id(), "player text label destroyed");
        Ok(label)
    }

    /// Destroy every label `owner` holds. The owner's pool itself is kept so
    /// handles issued before stay stale if the ID reconnects.
    ///
    /// Returns the number of labels destroyed.
    pub fn remove_owner<S: MessageSink + ?Sized>(&mut self, owner: PlayerId, sink: &mut S) -> usize {
        let Some(pool) = self.pools.get_mut(&owner) else {
            return 0;
        };
        let handles = pool.handles();
        for handle in &handles {
            if let Ok(mut label) = pool.remove(*handle) {
                label.hide(handle.id(), sink);
            }
        }
        if !handles.is_empty() {
            debug!(%owner, count = handles.len(), "owner left, player text labels destroyed");
        }
        handles.len()
    }

    /// Apply `change` to a label and restream it to its owner.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub(crate) fn modify<S, R>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        sink: &mut S,
        change: impl FnOnce(&mut LabelData) -> R,
    ) -> Result<R, StreamError>
    where
        S: MessageSink + ?Sized,
    {
        let label = self
            .pools
            .get_mut(&owner)
            .and_then(|pool| pool.get_mut(handle))
            .ok_or(StreamError::Pool(PoolError::NotFound(handle)))?;
        let out = change(&mut label.data);
        label.restream(handle.id(), sink);
        Ok(out)
    }

    /// Apply one attribute change. Virtual-world changes are accepted and
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles, and
    /// [`StreamError::PlayerNotConnected`] or [`StreamError::VehicleNotFound`]
    /// when attaching to a host that does not exist. Nothing is sent on error.
    pub fn apply<P, V, S>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        change: LabelChange,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.lookup_handle(owner, handle)?;
        require_host(&change, ctx.players, ctx.vehicles)?;
        self.apply_change(owner, handle, change, &mut *ctx.sink)
    }

    /// Apply a change that needs no host check.
    fn apply_change<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        change: LabelChange,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        if let LabelChange::VirtualWorld(_) = change {
            return self.lookup_handle(owner, handle).map(|_| ());
        }
        self.modify(owner, handle, sink, |data| {
            data.apply(change);
        })
    }

    /// Replace the text.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn set_text<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        text: impl Into<String>,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        self.apply_change(owner, handle, LabelChange::Text(text.into()), sink)
    }

    /// Replace the colour.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn set_colour<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        colour: Colour,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        self.apply_change(owner, handle, LabelChange::Colour(colour), sink)
    }

    /// Move the label (or change its offset while attached).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn set_position<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        position: Vec3,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        self.apply_change(owner, handle, LabelChange::Position(position), sink)
    }

    /// Replace the draw distance.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn set_draw_distance<S: MessageSink + ?Sized>(
        &mut self,
        owner: PlayerId,
        handle: Handle,
        draw_distance: f32,
        sink: &mut S,
    ) -> Result<(), StreamError> {
        self.apply_change(owner, handle, LabelChange::DrawDistance(draw_distance), sink)
    }

    /// A live label.
    #[must_use]
    pub fn get(&self, owner: PlayerId, handle: Handle) -> Option<&PlayerTextLabel> {
        self.pools.get(&owner)?.get(handle)
    }

    /// Resolve a raw pool ID within `owner`'s pool.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnknownId`] if the owner has no live label with
    /// that ID.
    pub fn lookup(&self, owner: PlayerId, id: u16) -> Result<Handle, StreamError> {
        self.pools
            .get(&owner)
            .and_then(|pool| pool.handle_at(id as usize))
            .ok_or(StreamError::UnknownId { kind: KIND, id })
    }

    /// Number of live labels `owner` holds.
    #[must_use]
    pub fn len(&self, owner: PlayerId) -> usize {
        self.pools.get(&owner).map_or(0, EntityPool::len)
    }

    /// Maximum number of labels per owner.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lookup_handle(&self, owner: PlayerId, handle: Handle) -> Result<&PlayerTextLabel, StreamError> {
        self.get(owner, handle)
            .ok_or(StreamError::Pool(PoolError::NotFound(handle)))
    }
}

#[cfg(test)]
mod tests {
    use entity_net::{ClientMessage, Outbox};
    use entity_pool::VehicleId;

    use super::*;
    use crate::registry::{Players, Vehicles};

    fn connected(ids: &[u16]) -> Players {
        let mut players = Players::new();
        for id in ids {
            players.connect(PlayerId(*id), Vec3::ZERO, 0);
        }
        players
    }

    fn spec(text: &str) -> LabelSpec {
        LabelSpec {
            text: text.to_string(),
            ..LabelSpec::default()
        }
    }

    #[test]
    fn test_create_shows_to_owner_only() {
        let players = connected(&[0, 1]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);

        let h = labels.create(PlayerId(1), &spec("hi"), &players, &mut outbox).unwrap();
        assert_eq!(outbox.len(), 1);
        assert!(outbox.messages_for(PlayerId(0)).is_empty());
        let msg = outbox.messages_for(PlayerId(1))[0];
        assert_eq!(msg.kind(), EntityKind::PlayerTextLabel);
        assert_eq!(msg.id(), h.id());
        assert!(labels.get(PlayerId(1), h).unwrap().is_shown());
    }

    #[test]
    fn test_owners_have_separate_id_spaces() {
        let players = connected(&[0, 1]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);

        let a = labels.create(PlayerId(0), &spec("a"), &players, &mut outbox).unwrap();
        let b = labels.create(PlayerId(1), &spec("b"), &players, &mut outbox).unwrap();
        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 0);
        assert_eq!(labels.get(PlayerId(1), b).unwrap().text(), "b");
        assert_eq!(labels.lookup(PlayerId(0), 0), Ok(a));
    }

    #[test]
    fn test_create_for_unknown_owner_fails() {
        let players = connected(&[]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        assert_eq!(
            labels.create(PlayerId(5), &spec("x"), &players, &mut outbox),
            Err(StreamError::PlayerNotConnected(PlayerId(5)))
        );
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_owner_pool_exhaustion() {
        let players = connected(&[0]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(1);
        labels.create(PlayerId(0), &spec("a"), &players, &mut outbox).unwrap();
        assert_eq!(
            labels.create(PlayerId(0), &spec("b"), &players, &mut outbox),
            Err(StreamError::Pool(PoolError::Exhausted { capacity: 1 }))
        );
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_setters_restream_to_owner() {
        let players = connected(&[2]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let h = labels.create(PlayerId(2), &spec("a"), &players, &mut outbox).unwrap();
        outbox.clear();

        labels.set_text(PlayerId(2), h, "b", &mut outbox).unwrap();
        labels.set_colour(PlayerId(2), h, Colour(0x00FF_00FF), &mut outbox).unwrap();
        labels.set_position(PlayerId(2), h, Vec3::Y, &mut outbox).unwrap();
        labels.set_draw_distance(PlayerId(2), h, 10.0, &mut outbox).unwrap();
        let kinds: Vec<bool> = outbox.iter().map(|e| e.message.is_show()).collect();
        assert_eq!(kinds, vec![false, true, false, true, false, true, false, true]);

        let label = labels.get(PlayerId(2), h).unwrap();
        assert_eq!(label.text(), "b");
        assert_eq!(label.colour(), Colour(0x00FF_00FF));
        assert_eq!(label.position(), Vec3::Y);
        assert_eq!(label.draw_distance(), 10.0);
    }

    #[test]
    fn test_virtual_world_change_is_ignored() {
        let players = connected(&[0]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let h = labels.create(PlayerId(0), &spec("a"), &players, &mut outbox).unwrap();
        outbox.clear();

        let vehicles = Vehicles::new();
        let mut ctx = StreamContext::new(&players, &vehicles, &mut outbox);
        labels
            .apply(PlayerId(0), h, LabelChange::VirtualWorld(9), &mut ctx)
            .unwrap();
        assert!(outbox.is_empty());
        assert_eq!(labels.get(PlayerId(0), h).unwrap().virtual_world(), 0);
    }

    #[test]
    fn test_attach_is_sent_on_restream() {
        let players = connected(&[0]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let mut vehicles = Vehicles::new();
        vehicles.spawn(VehicleId(12), Vec3::new(40.0, 0.0, 0.0));
        let h = labels.create(PlayerId(0), &spec("car"), &players, &mut outbox).unwrap();
        outbox.clear();

        let mut ctx = StreamContext::new(&players, &vehicles, &mut outbox);
        labels
            .apply(
                PlayerId(0),
                h,
                LabelChange::AttachToVehicle {
                    vehicle: VehicleId(12),
                    offset: Vec3::Z,
                },
                &mut ctx,
            )
            .unwrap();
        match outbox.messages_for(PlayerId(0))[1] {
            ClientMessage::ShowTextLabel(show) => {
                assert_eq!(show.attached_vehicle, 12);
                assert_eq!(show.position, Vec3::Z);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_attach_to_missing_host_is_rejected() {
        let players = connected(&[0]);
        let vehicles = Vehicles::new();
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let h = labels.create(PlayerId(0), &spec("tag"), &players, &mut outbox).unwrap();
        outbox.clear();

        let mut ctx = StreamContext::new(&players, &vehicles, &mut outbox);
        let to_player = LabelChange::AttachToPlayer {
            player: PlayerId(6),
            offset: Vec3::Z,
        };
        assert_eq!(
            labels.apply(PlayerId(0), h, to_player, &mut ctx),
            Err(StreamError::PlayerNotConnected(PlayerId(6)))
        );
        let to_vehicle = LabelChange::AttachToVehicle {
            vehicle: VehicleId(4),
            offset: Vec3::Z,
        };
        assert_eq!(
            labels.apply(PlayerId(0), h, to_vehicle, &mut ctx),
            Err(StreamError::VehicleNotFound(VehicleId(4)))
        );
        assert!(outbox.is_empty());
        let label = labels.get(PlayerId(0), h).unwrap();
        assert_eq!(label.attachment(), Attachment::None);
        assert!(label.is_shown());
    }

    #[test]
    fn test_owner_disconnect_hides_once() {
        let players = connected(&[3]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let h = labels.create(PlayerId(3), &spec("bye"), &players, &mut outbox).unwrap();
        outbox.clear();

        assert_eq!(labels.remove_owner(PlayerId(3), &mut outbox), 1);
        assert_eq!(outbox.len(), 1);
        let hide = outbox.messages_for(PlayerId(3))[0];
        assert!(hide.is_hide());
        assert_eq!(hide.kind(), EntityKind::PlayerTextLabel);

        assert!(labels.destroy(PlayerId(3), h, &mut outbox).is_err());
        assert_eq!(outbox.len(), 1);
        assert_eq!(labels.len(PlayerId(3)), 0);
    }

    #[test]
    fn test_destroy_twice_sends_one_hide() {
        let players = connected(&[0]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let h = labels.create(PlayerId(0), &spec("x"), &players, &mut outbox).unwrap();
        outbox.clear();

        let label = labels.destroy(PlayerId(0), h, &mut outbox).unwrap();
        assert!(!label.is_shown());
        assert_eq!(
            labels.destroy(PlayerId(0), h, &mut outbox),
            Err(StreamError::Pool(PoolError::NotFound(h)))
        );
        assert_eq!(outbox.len(), 1);
    }

    #[test]
    fn test_handles_stay_stale_across_reconnect() {
        let mut players = connected(&[0]);
        let mut outbox = Outbox::new();
        let mut labels = PlayerTextLabels::new(4);
        let old = labels.create(PlayerId(0), &spec("old"), &players, &mut outbox).unwrap();

        labels.remove_owner(PlayerId(0), &mut outbox);
        players.disconnect(PlayerId(0));
        players.connect(PlayerId(0), Vec3::ZERO, 0);
        let new = labels.create(PlayerId(0), &spec("new"), &players, &mut outbox).unwrap();

        assert_eq!(old.id(), new.id());
        assert_ne!(old, new);
        assert!(labels.get(PlayerId(0), old).is_none());
        assert!(labels.set_text(PlayerId(0), old, "?", &mut outbox).is_err());
    }
}
