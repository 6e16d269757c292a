//! The streaming engine.
//!
//! A [`Streamer`] owns every live entity of one kind together with its
//! visibility tracker and decides, per (entity, player) pair, whether the
//! entity should exist on that player's client:
//!
//! - **StreamedOut → StreamedIn** when the player is connected, shares the
//!   entity's virtual world, and is within draw distance of the effective
//!   position or is the entity's attachment host. A creation message is sent
//!   and the player is tracked.
//! - **StreamedIn → StreamedOut** on the inverse. A destruction message is sent
//!   and the player is untracked.
//! - **StreamedIn → StreamedIn** on any mutation: destruction then creation,
//!   never the other way round.
//!
//! Every mutation recomputes the pair state for all connected players, which
//! is O(players). Callers mutating in a tight loop pay that cost each time.

use entity_net::{ClientMessage, EntityKind, MessageSink};
use entity_pool::{Attachment, EntityPool, Handle, PlayerId, PoolError, VehicleId, VisibilityTracker};
use glam::Vec3;
use tracing::{debug, trace, warn};

use crate::error::StreamError;
use crate::registry::{PlayerRegistry, PlayerState, VehicleRegistry};
use crate::resolver;

/// What an entity kind must expose to be streamed.
pub trait Streamable {
    /// Wire kind of this entity.
    const KIND: EntityKind;

    /// Stored position: absolute, or the offset from the host when attached.
    fn position(&self) -> Vec3;

    /// Current host, if any.
    fn attachment(&self) -> Attachment;

    /// Virtual world the entity lives in.
    fn virtual_world(&self) -> i32;

    /// Maximum distance at which a player is streamed the entity.
    fn draw_distance(&self) -> f32;

    /// Drop the attachment and stay at `position`.
    fn detach(&mut self, position: Vec3);

    /// Creation message for pool ID `id`.
    fn show_message(&self, id: u16) -> ClientMessage;

    /// Destruction message for pool ID `id`.
    fn hide_message(&self, id: u16) -> ClientMessage;
}

/// Borrowed collaborators for one streaming decision.
pub struct StreamContext<'a, P: ?Sized, V: ?Sized, S: ?Sized> {
    /// Connected players.
    pub players: &'a P,
    /// Spawned vehicles.
    pub vehicles: &'a V,
    /// Where client messages go.
    pub sink: &'a mut S,
}

impl<'a, P: ?Sized, V: ?Sized, S: ?Sized> StreamContext<'a, P, V, S> {
    /// Bundle the collaborators.
    pub fn new(players: &'a P, vehicles: &'a V, sink: &'a mut S) -> Self {
        Self {
            players,
            vehicles,
            sink,
        }
    }
}

/// A live entity record plus the engine's bookkeeping for it.
#[derive(Debug, Clone)]
pub struct StreamedEntity<T> {
    record: T,
    streamed_for: VisibilityTracker,
    last_position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// Players that stay in range get destroy + create.
    Restream,
    /// Only players whose state changes get a message.
    Transitions,
}

impl<T: Streamable> StreamedEntity<T> {
    fn new(record: T, max_players: usize) -> Self {
        let last_position = record.position();
        Self {
            record,
            streamed_for: VisibilityTracker::new(max_players),
            last_position,
        }
    }

    /// The kind-specific record.
    #[must_use]
    pub fn record(&self) -> &T {
        &self.record
    }

    /// Players the entity is currently streamed in for.
    #[must_use]
    pub fn streamed_for(&self) -> &VisibilityTracker {
        &self.streamed_for
    }

    /// The last effective position that resolved successfully.
    #[must_use]
    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }

    /// Resolve the effective position, remembering it for when the host
    /// disappears.
    fn resolve<P, V>(&mut self, players: &P, vehicles: &V) -> Vec3
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
    {
        match resolver::effective_position(
            self.record.position(),
            self.record.attachment(),
            players,
            vehicles,
        ) {
            Some(position) => {
                self.last_position = position;
                position
            }
            None => {
                trace!(kind = ?T::KIND, "attachment host absent, using last known position");
                self.last_position
            }
        }
    }

    fn transition<S: MessageSink + ?Sized>(
        &mut self,
        id: u16,
        player: PlayerId,
        wanted: bool,
        pass: Pass,
        sink: &mut S,
    ) {
        let tracked = self.streamed_for.contains(player);
        match (tracked, wanted) {
            (true, true) => {
                if pass == Pass::Restream {
                    sink.send(player, self.record.hide_message(id));
                    sink.send(player, self.record.show_message(id));
                }
            }
            (true, false) => {
                self.streamed_for.remove(player);
                sink.send(player, self.record.hide_message(id));
                debug!(kind = ?T::KIND, id, %player, "streamed out");
            }
            (false, true) => match self.streamed_for.insert(player) {
                Ok(_) => {
                    sink.send(player, self.record.show_message(id));
                    debug!(kind = ?T::KIND, id, %player, "streamed in");
                }
                Err(err) => warn!(kind = ?T::KIND, id, %player, %err, "cannot track player"),
            },
            (false, false) => {}
        }
    }

    /// Bring every pair of this entity up to date. Candidates are the
    /// connected players plus anyone still tracked.
    fn sync<P, V, S>(
        &mut self,
        id: u16,
        connected: &[PlayerId],
        ctx: &mut StreamContext<'_, P, V, S>,
        pass: Pass,
    ) where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let position = self.resolve(ctx.players, ctx.vehicles);
        let mut candidates = connected.to_vec();
        candidates.extend(self.streamed_for.iter());
        candidates.sort_unstable();
        candidates.dedup();

        for player in candidates {
            let wanted = in_range(&self.record, position, player, ctx.players.player(player));
            self.transition(id, player, wanted, pass, &mut *ctx.sink);
        }
    }
}

/// Whether `player` should have `record` streamed in.
fn in_range<T: Streamable>(
    record: &T,
    position: Vec3,
    player: PlayerId,
    state: Option<PlayerState>,
) -> bool {
    let Some(state) = state else {
        return false;
    };
    if state.virtual_world != record.virtual_world() {
        return false;
    }
    if record.attachment().player() == Some(player) {
        return true;
    }
    let radius = record.draw_distance().max(0.0);
    state.position.distance_squared(position) <= radius * radius
}

/// The pool of one entity kind and its per-player visibility state.
#[derive(Debug, Clone)]
pub struct Streamer<T> {
    entities: EntityPool<StreamedEntity<T>>,
    max_players: usize,
}

impl<T: Streamable> Streamer<T> {
    /// Create an empty streamer for up to `capacity` entities and player IDs
    /// below `max_players`.
    #[must_use]
    pub fn new(capacity: usize, max_players: usize) -> Self {
        Self {
            entities: EntityPool::new(capacity),
            max_players,
        }
    }

    /// Allocate an ID for `record` and stream it in for every eligible player.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Exhausted`] (wrapped) when the pool is full.
    pub fn create<P, V, S>(
        &mut self,
        record: T,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<Handle, StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let max_players = self.max_players;
        let handle = self
            .entities
            .insert_with(|_| StreamedEntity::new(record, max_players))?;
        debug!(kind = ?T::KIND, id = handle.id(), "entity created");

        let connected = ctx.players.connected_players();
        if let Some(entity) = self.entities.get_mut(handle) {
            entity.sync(handle.id(), &connected, ctx, Pass::Transitions);
        }
        Ok(handle)
    }

    /// Stream the entity out for every tracked player, then release its ID.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles; nothing is
    /// sent in that case.
    pub fn destroy<S: MessageSink + ?Sized>(
        &mut self,
        handle: Handle,
        sink: &mut S,
    ) -> Result<T, StreamError> {
        let entity = self.entity_mut(handle)?;
        for player in entity.streamed_for.drain() {
            sink.send(player, entity.record.hide_message(handle.id()));
        }
        let entity = self.entities.remove(handle)?;
        debug!(kind = ?T::KIND, id = handle.id(), "entity destroyed");
        Ok(entity.record)
    }

    /// Apply `change` to the record and restream it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn modify<P, V, S, R>(
        &mut self,
        handle: Handle,
        ctx: &mut StreamContext<'_, P, V, S>,
        change: impl FnOnce(&mut T) -> R,
    ) -> Result<R, StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let out = change(&mut self.entity_mut(handle)?.record);
        self.restream(handle, ctx)?;
        Ok(out)
    }

    /// Re-send the entity to every player that keeps it and re-evaluate who
    /// should have it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::NotFound`] (wrapped) for stale handles.
    pub fn restream<P, V, S>(
        &mut self,
        handle: Handle,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) -> Result<(), StreamError>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let connected = ctx.players.connected_players();
        self.entity_mut(handle)?
            .sync(handle.id(), &connected, ctx, Pass::Restream);
        Ok(())
    }

    /// Re-evaluate every entity for one player after it connected, moved or
    /// changed virtual world.
    pub fn update_for_player<P, V, S>(&mut self, player: PlayerId, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let state = ctx.players.player(player);
        for (handle, entity) in self.entities.iter_mut() {
            let position = entity.resolve(ctx.players, ctx.vehicles);
            let wanted = in_range(&entity.record, position, player, state);
            entity.transition(handle.id(), player, wanted, Pass::Transitions, &mut *ctx.sink);
        }
    }

    /// Re-evaluate every (entity, player) pair. Run periodically so attached
    /// entities follow their hosts.
    pub fn stream_all<P, V, S>(&mut self, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let connected = ctx.players.connected_players();
        for (handle, entity) in self.entities.iter_mut() {
            entity.sync(handle.id(), &connected, ctx, Pass::Transitions);
        }
    }

    /// Handle a player leaving: stream out everything it holds and detach
    /// entities it was hosting at their current world position.
    pub fn remove_player<P, V, S>(&mut self, player: PlayerId, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let mut orphaned = Vec::new();
        for (handle, entity) in self.entities.iter_mut() {
            if entity.streamed_for.remove(player) {
                ctx.sink.send(player, entity.record.hide_message(handle.id()));
            }
            if entity.record.attachment().player() == Some(player) {
                let at = entity.resolve(ctx.players, ctx.vehicles);
                entity.record.detach(at);
                orphaned.push(handle);
            }
        }

        let connected: Vec<PlayerId> = ctx
            .players
            .connected_players()
            .into_iter()
            .filter(|p| *p != player)
            .collect();
        for handle in orphaned {
            if let Some(entity) = self.entities.get_mut(handle) {
                debug!(kind = ?T::KIND, id = handle.id(), %player, "host player left, detached");
                entity.sync(handle.id(), &connected, ctx, Pass::Restream);
            }
        }
    }

    /// Handle a vehicle being destroyed: entities it was hosting stay at
    /// their last world position.
    ///
    /// `last_position` is where the vehicle was when it was removed from the
    /// registry. Without it the last resolved position is used.
    pub fn remove_vehicle<P, V, S>(
        &mut self,
        vehicle: VehicleId,
        last_position: Option<Vec3>,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        let connected = ctx.players.connected_players();
        for (handle, entity) in self.entities.iter_mut() {
            if entity.record.attachment().vehicle() == Some(vehicle) {
                let at = match last_position {
                    Some(host) => host + entity.record.position(),
                    None => entity.resolve(ctx.players, ctx.vehicles),
                };
                entity.record.detach(at);
                debug!(kind = ?T::KIND, id = handle.id(), %vehicle, "host vehicle gone, detached");
                entity.sync(handle.id(), &connected, ctx, Pass::Restream);
            }
        }
    }

    /// The record for a live handle.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.entities.get(handle).map(|e| &e.record)
    }

    /// The record and bookkeeping for a live handle.
    #[must_use]
    pub fn entity(&self, handle: Handle) -> Option<&StreamedEntity<T>> {
        self.entities.get(handle)
    }

    /// Resolve a raw pool ID.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::UnknownId`] if no live entity has that ID.
    pub fn lookup(&self, id: u16) -> Result<Handle, StreamError> {
        self.entities
            .handle_at(id as usize)
            .ok_or(StreamError::UnknownId { kind: T::KIND, id })
    }

    /// Returns `true` if `handle` is live.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.entities.contains(handle)
    }

    /// Returns `true` if the entity currently exists on `player`'s client.
    #[must_use]
    pub fn is_streamed_in(&self, handle: Handle, player: PlayerId) -> bool {
        self.entities
            .get(handle)
            .is_some_and(|e| e.streamed_for.contains(player))
    }

    /// Players the entity is streamed in for, ascending. Empty for stale
    /// handles.
    #[must_use]
    pub fn streamed_for(&self, handle: Handle) -> Vec<PlayerId> {
        self.entities
            .get(handle)
            .map(|e| e.streamed_for.to_vec())
            .unwrap_or_default()
    }

    /// Current effective position, falling back to the last resolved one if
    /// the host is gone. `None` for stale handles.
    #[must_use]
    pub fn effective_position<P, V>(&self, handle: Handle, players: &P, vehicles: &V) -> Option<Vec3>
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
    {
        let entity = self.entities.get(handle)?;
        Some(
            resolver::effective_position(
                entity.record.position(),
                entity.record.attachment(),
                players,
                vehicles,
            )
            .unwrap_or(entity.last_position),
        )
    }

    /// Iterate over live records.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.entities.iter().map(|(h, e)| (h, &e.record))
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entity is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Maximum number of live entities.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.entities.capacity()
    }

    fn entity_mut(&mut self, handle: Handle) -> Result<&mut StreamedEntity<T>, StreamError> {
        self.entities
            .get_mut(handle)
            .ok_or(StreamError::Pool(PoolError::NotFound(handle)))
    }
}
