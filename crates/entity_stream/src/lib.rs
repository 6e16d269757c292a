//! # entity_stream
//!
//! Per-player visibility streaming for pooled world entities.
//!
//! This crate provides:
//!
//! - [`streamer`] — the generic engine: [`Streamer`] decides, per (entity,
//!   player) pair, when a creation or destruction message is due.
//! - [`text_label`] — global text labels, the concrete [`Streamable`] kind.
//! - [`player_text_label`] — labels owned by and visible to a single player.
//! - [`resolver`] — effective position of attached entities.
//! - [`registry`] — read interfaces to players and vehicles, plus in-memory
//!   implementations.
//! - [`component`] — both label kinds behind the server's lifecycle hooks.
//!
//! The engine is single-threaded and never blocks: every message goes to a
//! [`MessageSink`](entity_net::MessageSink) that only enqueues.

pub mod component;
pub mod error;
mod label;
pub mod player_text_label;
pub mod registry;
pub mod resolver;
pub mod streamer;
pub mod text_label;

pub use component::TextLabelsComponent;
pub use error::StreamError;
pub use player_text_label::{PlayerTextLabel, PlayerTextLabels};
pub use registry::{PlayerRegistry, PlayerState, Players, VehicleRegistry, Vehicles};
pub use streamer::{StreamContext, Streamable, StreamedEntity, Streamer};
pub use text_label::{TextLabel, TextLabels};
