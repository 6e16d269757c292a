//! Capacity constants.
//!
//! The defaults mirror the wire protocol's ID space. Hosts read the actual
//! values from configuration once at startup and never change them afterwards.

use serde::{Deserialize, Serialize};

/// Default maximum number of concurrently connected players.
pub const DEFAULT_MAX_PLAYERS: usize = 1000;

/// Default maximum number of global text labels.
pub const DEFAULT_MAX_TEXT_LABELS: usize = 1024;

/// Default maximum number of text labels per player.
pub const DEFAULT_MAX_PLAYER_TEXT_LABELS: usize = 1024;

/// Largest capacity any pool can have: IDs must fit a `u16` and `0xFFFF` is
/// reserved as the invalid sentinel.
pub const MAX_POOL_CAPACITY: usize = u16::MAX as usize;

/// Fixed capacities for one server process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLimits {
    /// Maximum concurrently connected players; bounds every visibility tracker.
    pub max_players: usize,
    /// Maximum live global text labels.
    pub max_text_labels: usize,
    /// Maximum live text labels owned by a single player.
    pub max_player_text_labels: usize,
}

impl PoolLimits {
    /// Clamp every capacity into `[1, MAX_POOL_CAPACITY]`.
    #[must_use]
    pub fn clamped(self) -> Self {
        let clamp = |v: usize| v.clamp(1, MAX_POOL_CAPACITY);
        Self {
            max_players: clamp(self.max_players),
            max_text_labels: clamp(self.max_text_labels),
            max_player_text_labels: clamp(self.max_player_text_labels),
        }
    }
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_players: DEFAULT_MAX_PLAYERS,
            max_text_labels: DEFAULT_MAX_TEXT_LABELS,
            max_player_text_labels: DEFAULT_MAX_PLAYER_TEXT_LABELS,
        }
    }
}
