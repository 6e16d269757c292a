//! Per-entity record of which players currently have the entity.
//!
//! A player is in the tracker exactly while the entity exists in that
//! player's client simulation: added when the creation message is sent,
//! removed when the destruction message is sent. Capacity is the maximum
//! concurrent player count.

use crate::error::PoolError;
use crate::id::PlayerId;

const WORD_BITS: usize = u64::BITS as usize;

/// A bounded set of player IDs, stored as a bitset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityTracker {
    words: Vec<u64>,
    capacity: usize,
    len: usize,
}

impl VisibilityTracker {
    /// Create an empty tracker accepting player IDs in `[0, max_players)`.
    #[must_use]
    pub fn new(max_players: usize) -> Self {
        Self {
            words: vec![0; max_players.div_ceil(WORD_BITS)],
            capacity: max_players,
            len: 0,
        }
    }

    /// Add a player. Returns `true` if the player was not already tracked.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::OutOfRange`] for IDs beyond the player capacity.
    pub fn insert(&mut self, player: PlayerId) -> Result<bool, PoolError> {
        let (word, bit) = self.locate(player)?;
        let fresh = self.words[word] & bit == 0;
        if fresh {
            self.words[word] |= bit;
            self.len += 1;
        }
        Ok(fresh)
    }

    /// Remove a player. Returns `true` if the player was tracked.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        let Ok((word, bit)) = self.locate(player) else {
            return false;
        };
        let present = self.words[word] & bit != 0;
        if present {
            self.words[word] &= !bit;
            self.len -= 1;
        }
        present
    }

    /// Returns `true` if the player is tracked.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.locate(player)
            .is_ok_and(|(word, bit)| self.words[word] & bit != 0)
    }

    /// Iterate over tracked players in ascending ID order.
    pub fn iter(&self) -> impl Iterator<Item = PlayerId> {
        self.words.iter().enumerate().flat_map(|(w, &bits)| {
            (0..WORD_BITS)
                .filter(move |b| bits & (1u64 << b) != 0)
                .map(move |b| PlayerId((w * WORD_BITS + b) as u16))
        })
    }

    /// Snapshot of tracked players, ascending.
    #[must_use]
    pub fn to_vec(&self) -> Vec<PlayerId> {
        self.iter().collect()
    }

    /// Remove every player and return them, ascending.
    pub fn drain(&mut self) -> Vec<PlayerId> {
        let players = self.to_vec();
        self.words.iter_mut().for_each(|w| *w = 0);
        self.len = 0;
        players
    }

    /// Number of tracked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no player is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum player ID + 1 this tracker accepts.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn locate(&self, player: PlayerId) -> Result<(usize, u64), PoolError> {
        let index = player.index();
        if index >= self.capacity {
            return Err(PoolError::OutOfRange {
                id: index,
                capacity: self.capacity,
            });
        }
        Ok((index / WORD_BITS, 1u64 << (index % WORD_BITS)))
    }
}
