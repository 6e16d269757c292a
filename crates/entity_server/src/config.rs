//! Server configuration.
//!
//! Read once at startup from an optional JSON file; every field has a default
//! so an empty object (or no file at all) is a valid configuration. The
//! `NATS_URL` environment variable overrides the file.

use std::path::Path;

use anyhow::{Context, Result};
use entity_net::connection::{DEFAULT_NATS_URL, NATS_URL_ENV};
use entity_pool::PoolLimits;
use entity_pool::limits::{DEFAULT_MAX_PLAYERS, DEFAULT_MAX_PLAYER_TEXT_LABELS, DEFAULT_MAX_TEXT_LABELS};
use serde::{Deserialize, Serialize};

/// Configuration for one server process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Maximum concurrently connected players.
    pub max_players: usize,
    /// Maximum live global text labels.
    pub max_text_labels: usize,
    /// Maximum live text labels per player.
    pub max_player_text_labels: usize,
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Ticks between full stream passes.
    pub stream_rate: u64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
    /// NATS server URL.
    pub nats_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            max_text_labels: DEFAULT_MAX_TEXT_LABELS,
            max_player_text_labels: DEFAULT_MAX_PLAYER_TEXT_LABELS,
            tick_rate: 60.0,
            stream_rate: 10,
            max_ticks: 0,
            nats_url: DEFAULT_NATS_URL.to_string(),
        }
    }
}

impl ServerConfig {
    /// Parse a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not a valid configuration object.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("invalid server configuration")
    }

    /// Load a configuration file, or the defaults if `path` is `None`, then
    /// apply the environment override.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                Self::from_json(&json)?
            }
            None => Self::default(),
        };
        Ok(config.with_nats_url_override(std::env::var(NATS_URL_ENV).ok()))
    }

    /// Replace the NATS URL if an override is present and non-empty.
    #[must_use]
    pub fn with_nats_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            self.nats_url = url;
        }
        self
    }

    /// Pool capacities, clamped to what the wire protocol can address.
    #[must_use]
    pub fn limits(&self) -> PoolLimits {
        PoolLimits {
            max_players: self.max_players,
            max_text_labels: self.max_text_labels,
            max_player_text_labels: self.max_player_text_labels,
        }
        .clamped()
    }

    /// Ticks between stream passes, never zero.
    #[must_use]
    pub fn stream_interval(&self) -> u64 {
        self.stream_rate.max(1)
    }
}
