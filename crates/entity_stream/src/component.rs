//! The text label component: both label kinds behind the player and vehicle
//! lifecycle hooks a server calls.

use entity_net::MessageSink;
use entity_pool::{PlayerId, PoolLimits, VehicleId};
use glam::Vec3;
use tracing::info;

use crate::player_text_label::PlayerTextLabels;
use crate::registry::{PlayerRegistry, VehicleRegistry};
use crate::streamer::StreamContext;
use crate::text_label::TextLabels;

/// Global and player-scoped text labels.
#[derive(Debug, Clone)]
pub struct TextLabelsComponent {
    /// Labels visible to every player in range.
    pub labels: TextLabels,
    /// Per-player private labels.
    pub player_labels: PlayerTextLabels,
}

impl TextLabelsComponent {
    /// Create the component with capacities from `limits`.
    #[must_use]
    pub fn new(limits: PoolLimits) -> Self {
        let limits = limits.clamped();
        info!(
            max_players = limits.max_players,
            max_text_labels = limits.max_text_labels,
            max_player_text_labels = limits.max_player_text_labels,
            "text label component ready"
        );
        Self {
            labels: TextLabels::new(limits.max_text_labels, limits.max_players),
            player_labels: PlayerTextLabels::new(limits.max_player_text_labels),
        }
    }

    /// A player finished connecting.
    pub fn on_player_connect<P, V, S>(&mut self, player: PlayerId, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.labels.update_for_player(player, ctx);
    }

    /// A player moved or changed virtual world.
    pub fn on_player_update<P, V, S>(&mut self, player: PlayerId, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.labels.update_for_player(player, ctx);
    }

    /// A player left. Call after the registry has forgotten the player.
    pub fn on_player_disconnect<P, V, S>(&mut self, player: PlayerId, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.labels.remove_player(player, ctx);
        self.player_labels.remove_owner(player, &mut *ctx.sink);
    }

    /// A vehicle was destroyed. Call after the registry has forgotten it,
    /// passing the position the registry last held.
    pub fn on_vehicle_destroyed<P, V, S>(
        &mut self,
        vehicle: VehicleId,
        last_position: Option<Vec3>,
        ctx: &mut StreamContext<'_, P, V, S>,
    ) where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.labels.remove_vehicle(vehicle, last_position, ctx);
    }

    /// Periodic full stream pass.
    pub fn on_tick<P, V, S>(&mut self, ctx: &mut StreamContext<'_, P, V, S>)
    where
        P: PlayerRegistry + ?Sized,
        V: VehicleRegistry + ?Sized,
        S: MessageSink + ?Sized,
    {
        self.labels.stream_all(ctx);
    }
}

impl Default for TextLabelsComponent {
    fn default() -> Self {
        Self::new(PoolLimits::default())
    }
}
