//! # entity_server — streaming host
//!
//! Owns the label pools and the player/vehicle registries, applies host
//! commands on a single tick task and publishes the resulting client
//! messages.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (JSON file from `--config`, `NATS_URL` override).
//! 2. Connect to NATS.
//! 3. Queue-subscribe to `streamer.command`; a forwarding task decodes
//!    commands and hands them to the tick task over a channel.
//! 4. Enter the fixed-timestep tick loop.

mod config;
mod tick;
mod world;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use entity_net::messages::{Command, CommandReply};
use entity_net::{NatsConnection, subjects};
use config::ServerConfig;
use tick::{CommandRequest, TickConfig, TickLoop};
use world::World;

/// Commands buffered between the subscriber and the tick task.
const COMMAND_BUFFER: usize = 1024;

#[derive(Parser)]
#[command(name = "entity_server", about = "Entity visibility streamer over NATS")]
struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many ticks (overrides the configuration)
    #[arg(long)]
    max_ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("entity_server=info".parse()?))
        .init();

    let args = Args::parse();
    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(max_ticks) = args.max_ticks {
        config.max_ticks = max_ticks;
    }
    info!(?config, "entity streamer starting");

    let conn = NatsConnection::connect_to(&config.nats_url).await?;
    let mut sub = conn
        .queue_subscribe(subjects::COMMAND, subjects::COMMAND_QUEUE)
        .await?;
    info!(subject = subjects::COMMAND, "listening for commands");

    let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
    let replier = conn.clone();
    tokio::spawn(async move {
        while let Some(msg) = sub.next().await {
            let reply = msg.reply.map(|s| s.to_string());
            match entity_net::decode::<Command>(&msg.payload) {
                Ok(command) => {
                    if tx.send(CommandRequest { command, reply }).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    warn!(%err, "undecodable command");
                    if let Some(subject) = reply {
                        let failed = CommandReply::Failed {
                            reason: err.to_string(),
                        };
                        if let Err(err) = replier.publish(&subject, &failed).await {
                            warn!(%err, "failed to publish reply");
                        }
                    }
                }
            }
        }
    });

    let mut tick_loop = TickLoop::new(TickConfig::from(&config), World::new(config.limits()));
    tick_loop.run(&conn, &mut rx).await;

    info!("entity streamer shut down");
    Ok(())
}
