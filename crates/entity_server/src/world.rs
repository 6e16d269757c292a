//! Server-side world state.
//!
//! The [`World`] owns the player and vehicle registries, the text label
//! component and the outbox, and applies host [`Command`]s to them. It only
//! ever runs on the tick task.

use anyhow::Result;
use entity_net::messages::{Command, CommandReply};
use entity_net::{Envelope, Outbox};
use entity_pool::{PlayerId, PoolError, PoolLimits};
use entity_stream::{Players, StreamContext, StreamError, TextLabel, TextLabelsComponent, Vehicles};
use tracing::{debug, info, warn};

/// The canonical state of one server process.
#[derive(Debug)]
pub struct World {
    limits: PoolLimits,
    players: Players,
    vehicles: Vehicles,
    labels: TextLabelsComponent,
    outbox: Outbox,
}

impl World {
    /// Create an empty world with fixed capacities.
    #[must_use]
    pub fn new(limits: PoolLimits) -> Self {
        let limits = limits.clamped();
        Self {
            limits,
            players: Players::new(),
            vehicles: Vehicles::new(),
            labels: TextLabelsComponent::new(limits),
            outbox: Outbox::new(),
        }
    }

    /// Connected players.
    #[must_use]
    pub fn players(&self) -> &Players {
        &self.players
    }

    /// Spawned vehicles.
    #[must_use]
    pub fn vehicles(&self) -> &Vehicles {
        &self.vehicles
    }

    /// Both text label pools.
    #[must_use]
    pub fn labels(&self) -> &TextLabelsComponent {
        &self.labels
    }

    /// Apply a host command. Failures are logged and reported in the reply;
    /// they never leave the world half-updated.
    pub fn apply(&mut self, command: Command) -> CommandReply {
        debug!(?command, "applying command");
        match self.try_apply(command) {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, "command rejected");
                CommandReply::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Run a full stream pass over every label.
    pub fn stream_all(&mut self) {
        let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
        self.labels.on_tick(&mut ctx);
    }

    /// Take every message queued since the last call.
    pub fn drain_outbox(&mut self) -> Vec<Envelope> {
        self.outbox.drain().collect()
    }

    fn try_apply(&mut self, command: Command) -> Result<CommandReply> {
        let reply = match command {
            Command::PlayerConnect {
                player,
                position,
                virtual_world,
            } => {
                if player.index() >= self.limits.max_players {
                    return Err(PoolError::OutOfRange {
                        id: player.index(),
                        capacity: self.limits.max_players,
                    }
                    .into());
                }
                if !self.players.connect(player, position, virtual_world) {
                    warn!(%player, "player connected twice, state replaced");
                }
                info!(%player, "player connected");
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.on_player_connect(player, &mut ctx);
                CommandReply::Ok
            }
            Command::PlayerDisconnect { player } => {
                if self.players.disconnect(player).is_none() {
                    return Err(StreamError::PlayerNotConnected(player).into());
                }
                info!(%player, "player disconnected");
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.on_player_disconnect(player, &mut ctx);
                CommandReply::Ok
            }
            Command::PlayerMove { player, position } => {
                require_player(self.players.set_position(player, position), player)?;
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.on_player_update(player, &mut ctx);
                CommandReply::Ok
            }
            Command::PlayerSetVirtualWorld {
                player,
                virtual_world,
            } => {
                require_player(self.players.set_virtual_world(player, virtual_world), player)?;
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.on_player_update(player, &mut ctx);
                CommandReply::Ok
            }
            Command::VehicleSpawn { vehicle, position } => {
                self.vehicles.spawn(vehicle, position);
                CommandReply::Ok
            }
            Command::VehicleMove { vehicle, position } => {
                if !self.vehicles.set_position(vehicle, position) {
                    return Err(StreamError::VehicleNotFound(vehicle).into());
                }
                CommandReply::Ok
            }
            Command::VehicleDestroy { vehicle } => {
                let Some(last_position) = self.vehicles.destroy(vehicle) else {
                    return Err(StreamError::VehicleNotFound(vehicle).into());
                };
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.on_vehicle_destroyed(vehicle, Some(last_position), &mut ctx);
                CommandReply::Ok
            }
            Command::CreateTextLabel(spec) => {
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                let handle = self.labels.labels.create(TextLabel::new(&spec), &mut ctx)?;
                CommandReply::Created { id: handle.id() }
            }
            Command::DestroyTextLabel { id } => {
                let handle = self.labels.labels.lookup(id)?;
                self.labels.labels.destroy(handle, &mut self.outbox)?;
                CommandReply::Ok
            }
            Command::UpdateTextLabel { id, change } => {
                let handle = self.labels.labels.lookup(id)?;
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels.labels.apply(handle, change, &mut ctx)?;
                CommandReply::Ok
            }
            Command::CreatePlayerTextLabel { owner, spec } => {
                let handle =
                    self.labels
                        .player_labels
                        .create(owner, &spec, &self.players, &mut self.outbox)?;
                CommandReply::Created { id: handle.id() }
            }
            Command::DestroyPlayerTextLabel { owner, id } => {
                let handle = self.labels.player_labels.lookup(owner, id)?;
                self.labels
                    .player_labels
                    .destroy(owner, handle, &mut self.outbox)?;
                CommandReply::Ok
            }
            Command::UpdatePlayerTextLabel { owner, id, change } => {
                let handle = self.labels.player_labels.lookup(owner, id)?;
                let mut ctx = StreamContext::new(&self.players, &self.vehicles, &mut self.outbox);
                self.labels
                    .player_labels
                    .apply(owner, handle, change, &mut ctx)?;
                CommandReply::Ok
            }
        };
        Ok(reply)
    }
}

fn require_player(known: bool, player: PlayerId) -> Result<(), StreamError> {
    if known {
        Ok(())
    } else {
        Err(StreamError::PlayerNotConnected(player))
    }
}
