//! Server tick loop.
//!
//! Each tick:
//!
//! 1. Apply every host command queued since the previous tick.
//! 2. Every `stream_rate` ticks, run a full stream pass so attached labels
//!    follow their hosts.
//! 3. Reply to commands that asked for it.
//! 4. Flush the outbox to the players' client subjects.

use std::time::{Duration, Instant};

use entity_net::messages::{Command, CommandReply};
use entity_net::{Envelope, NatsConnection};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::world::World;

/// Shortest tick the loop will run; `tokio::time::interval` rejects zero.
const MIN_TICK: Duration = Duration::from_millis(1);
/// Longest tick the loop will run.
const MAX_TICK: Duration = Duration::from_secs(60);

/// A decoded command and where to send its reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRequest {
    /// The command to apply.
    pub command: Command,
    /// Reply subject, if the sender expects an answer.
    pub reply: Option<String>,
}

/// Timing for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Ticks between full stream passes.
    pub stream_interval: u64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl From<&ServerConfig> for TickConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            tick_rate: config.tick_rate,
            stream_interval: config.stream_interval(),
            max_ticks: config.max_ticks,
        }
    }
}

/// The server's tick loop state.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
}

impl TickLoop {
    /// Create a tick loop over `world`.
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Duration of one tick, kept within [`MIN_TICK`, `MAX_TICK`].
    /// Non-positive or non-finite rates fall back to 60 Hz.
    #[must_use]
    pub fn tick_duration(&self) -> Duration {
        let rate = if self.config.tick_rate > 0.0 && self.config.tick_rate.is_finite() {
            self.config.tick_rate
        } else {
            60.0
        };
        Duration::try_from_secs_f64(1.0 / rate)
            .unwrap_or(MAX_TICK)
            .clamp(MIN_TICK, MAX_TICK)
    }

    /// Returns `true` once `max_ticks` ticks have run.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.config.max_ticks > 0 && self.tick_id >= self.config.max_ticks
    }

    /// Advance one tick and return every message due for delivery.
    pub fn tick(&mut self) -> Vec<Envelope> {
        self.tick_id += 1;
        if self.tick_id % self.config.stream_interval.max(1) == 0 {
            self.world.stream_all();
        }
        let outgoing = self.world.drain_outbox();
        if !outgoing.is_empty() {
            debug!(tick_id = self.tick_id, messages = outgoing.len(), "tick flushed");
        }
        outgoing
    }

    /// Run until `max_ticks` is reached or the command channel closes.
    /// Delivery failures are logged and skipped.
    pub async fn run(&mut self, conn: &NatsConnection, commands: &mut mpsc::Receiver<CommandRequest>) {
        let tick_duration = self.tick_duration();
        let mut interval = tokio::time::interval(tick_duration);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick_rate = self.config.tick_rate,
            stream_interval = self.config.stream_interval,
            max_ticks = self.config.max_ticks,
            "starting tick loop"
        );

        loop {
            interval.tick().await;
            let start = Instant::now();

            let (replies, closed) = self.drain_commands(commands);
            let outgoing = self.tick();

            for (subject, reply) in &replies {
                if let Err(err) = conn.publish(subject, reply).await {
                    warn!(%err, %subject, "failed to publish reply");
                }
            }
            for envelope in &outgoing {
                if let Err(err) = conn.deliver(envelope).await {
                    warn!(%err, player = %envelope.player, "failed to deliver client message");
                }
            }

            if closed {
                error!(tick_id = self.tick_id, "command channel closed, stopping");
                break;
            }
            if self.is_finished() {
                info!(
                    ticks = self.tick_id(),
                    players = self.world.players().len(),
                    vehicles = self.world.vehicles().len(),
                    text_labels = self.world.labels().labels.len(),
                    "tick loop complete"
                );
                break;
            }

            let elapsed = start.elapsed();
            if elapsed > tick_duration {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }

    /// Apply every pending command. Returns the replies to send and whether
    /// the channel has closed.
    fn drain_commands(
        &mut self,
        commands: &mut mpsc::Receiver<CommandRequest>,
    ) -> (Vec<(String, CommandReply)>, bool) {
        let mut replies = Vec::new();
        loop {
            match commands.try_recv() {
                Ok(request) => {
                    let reply = self.world.apply(request.command);
                    if let Some(subject) = request.reply {
                        replies.push((subject, reply));
                    }
                }
                Err(TryRecvError::Empty) => return (replies, false),
                Err(TryRecvError::Disconnected) => return (replies, true),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use entity_net::messages::{LabelChange, LabelSpec};
    use entity_pool::{PlayerId, PoolLimits, VehicleId};
    use glam::Vec3;

    use super::*;

    fn tick_loop(stream_interval: u64) -> TickLoop {
        let config = TickConfig {
            tick_rate: 1000.0,
            stream_interval,
            max_ticks: 3,
        };
        TickLoop::new(config, World::new(PoolLimits::default()))
    }

    #[test]
    fn test_tick_advances_counter() {
        let mut tick_loop = tick_loop(1);
        assert_eq!(tick_loop.tick_id(), 0);
        tick_loop.tick();
        tick_loop.tick();
        assert_eq!(tick_loop.tick_id(), 2);
        assert!(!tick_loop.is_finished());
        tick_loop.tick();
        assert!(tick_loop.is_finished());
    }

    #[test]
    fn test_stream_pass_runs_on_interval() {
        let mut tick_loop = tick_loop(2);
        let world = tick_loop.world_mut();
        world.apply(Command::PlayerConnect {
            player: PlayerId(0),
            position: Vec3::ZERO,
            virtual_world: 0,
        });
        world.apply(Command::VehicleSpawn {
            vehicle: VehicleId(1),
            position: Vec3::new(400.0, 0.0, 0.0),
        });
        world.apply(Command::CreateTextLabel(LabelSpec::default()));
        world.apply(Command::UpdateTextLabel {
            id: 0,
            change: LabelChange::AttachToVehicle {
                vehicle: VehicleId(1),
                offset: Vec3::ZERO,
            },
        });
        // create (show), attach (hide).
        assert_eq!(tick_loop.tick().len(), 2);

        tick_loop.world_mut().apply(Command::VehicleMove {
            vehicle: VehicleId(1),
            position: Vec3::new(1.0, 0.0, 0.0),
        });
        assert_eq!(tick_loop.tick().len(), 1);
        assert!(tick_loop.tick().is_empty());
    }

    #[test]
    fn test_drain_commands_collects_replies() {
        let mut tick_loop = tick_loop(1);
        let (tx, mut rx) = mpsc::channel(8);
        tx.try_send(CommandRequest {
            command: Command::CreateTextLabel(LabelSpec::default()),
            reply: Some("_INBOX.1".into()),
        })
        .unwrap();
        tx.try_send(CommandRequest {
            command: Command::DestroyTextLabel { id: 7 },
            reply: None,
        })
        .unwrap();

        let (replies, closed) = tick_loop.drain_commands(&mut rx);
        assert!(!closed);
        assert_eq!(replies, vec![("_INBOX.1".to_string(), CommandReply::Created { id: 0 })]);

        drop(tx);
        let (replies, closed) = tick_loop.drain_commands(&mut rx);
        assert!(replies.is_empty());
        assert!(closed);
    }

    #[test]
    fn test_non_positive_rate_falls_back() {
        let config = TickConfig {
            tick_rate: 0.0,
            stream_interval: 1,
            max_ticks: 0,
        };
        let tick_loop = TickLoop::new(config, World::new(PoolLimits::default()));
        assert_eq!(tick_loop.tick_duration(), Duration::from_secs_f64(1.0 / 60.0));
        assert!(!tick_loop.is_finished());
    }

    #[test]
    fn test_extreme_rates_are_clamped() {
        let duration_at = |tick_rate| {
            let config = TickConfig {
                tick_rate,
                stream_interval: 1,
                max_ticks: 0,
            };
            TickLoop::new(config, World::new(PoolLimits::default())).tick_duration()
        };
        assert_eq!(duration_at(1e12), Duration::from_millis(1));
        assert_eq!(duration_at(f64::INFINITY), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(duration_at(f64::NAN), Duration::from_secs_f64(1.0 / 60.0));
        assert_eq!(duration_at(1e-9), Duration::from_secs(60));
    }
}
