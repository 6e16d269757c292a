//! Fire-and-forget message queue between the streaming engine and the
//! transport.
//!
//! The engine only enqueues; delivery happens after the tick, when the host
//! drains the [`Outbox`] into the network. Order is preserved per player and
//! globally.

use std::collections::VecDeque;

use entity_pool::PlayerId;
use tracing::trace;

use crate::messages::ClientMessage;

/// Anything the streaming engine can hand client messages to.
pub trait MessageSink {
    /// Queue `message` for `player`. Must not block.
    fn send(&mut self, player: PlayerId, message: ClientMessage);
}

/// A message with its destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Receiving player.
    pub player: PlayerId,
    /// Payload.
    pub message: ClientMessage,
}

/// An ordered queue of outgoing client messages.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<Envelope>,
}

impl Outbox {
    /// Create an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued envelope, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Envelope> {
        self.queue.drain(..)
    }

    /// Iterate over queued envelopes without removing them.
    pub fn iter(&self) -> impl Iterator<Item = &Envelope> {
        self.queue.iter()
    }

    /// Queued messages addressed to `player`, oldest first.
    #[must_use]
    pub fn messages_for(&self, player: PlayerId) -> Vec<&ClientMessage> {
        self.queue
            .iter()
            .filter(|e| e.player == player)
            .map(|e| &e.message)
            .collect()
    }

    /// Number of queued messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns `true` if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Discard everything queued.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl MessageSink for Outbox {
    fn send(&mut self, player: PlayerId, message: ClientMessage) {
        trace!(%player, id = message.id(), show = message.is_show(), "queued client message");
        self.queue.push_back(Envelope { player, message });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{EntityKind, HideTextLabel};

    fn hide(id: u16) -> ClientMessage {
        ClientMessage::HideTextLabel(HideTextLabel {
            kind: EntityKind::TextLabel,
            id,
        })
    }

    #[test]
    fn test_preserves_order() {
        let mut outbox = Outbox::new();
        outbox.send(PlayerId(1), hide(1));
        outbox.send(PlayerId(2), hide(2));
        outbox.send(PlayerId(1), hide(3));

        let ids: Vec<u16> = outbox.messages_for(PlayerId(1)).iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec![1, 3]);

        let drained: Vec<Envelope> = outbox.drain().collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[1].player, PlayerId(2));
        assert!(outbox.is_empty());
    }
}
