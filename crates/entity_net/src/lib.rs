//! # entity_net
//!
//! Wire layer for entity streaming.
//!
//! This crate provides:
//!
//! - [`messages`] — client messages, host commands and their replies.
//! - [`codec`] — MessagePack serialisation/deserialisation helpers.
//! - [`outbox`] — the fire-and-forget queue the engine writes into.
//! - [`subjects`] — NATS subject constants and builders.
//! - [`connection`] — NATS connection management.
//! - [`error`] — Network-layer error types.

pub mod codec;
pub mod connection;
pub mod error;
pub mod messages;
pub mod outbox;
pub mod subjects;

pub use codec::{decode, encode};
pub use connection::NatsConnection;
pub use error::NetError;
pub use messages::{ClientMessage, Colour, EntityKind, HideTextLabel, ShowTextLabel};
pub use outbox::{Envelope, MessageSink, Outbox};
