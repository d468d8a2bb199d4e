//! Nova PipeWire - sink discovery and virtual sink routing.
//!
//! This crate handles the host audio side of ChatMix:
//! - Listing existing sinks with `pactl list short sinks`
//! - Picking the headset's output sink
//! - Creating the game/chat virtual sinks with `pw-loopback`
//! - Applying ChatMix levels with `pactl set-sink-volume`

pub mod discovery;
pub mod error;
pub mod router;

pub use discovery::{SinkSelector, list_sinks, resolve_output_sink, select_output_sink};
pub use error::{PwError, PwResult};
pub use router::{LoopbackRouter, RouterCommands};
