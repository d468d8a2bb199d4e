//! Nova Core - protocol and control logic for the Arctis Nova Pro base station.
//!
//! This crate is I/O-free. It defines the 63-byte HID frame codec, the typed
//! reports decoded from it, the `pactl` sink descriptor parser, and the
//! ChatMix control loop that drives a device and a sink router through
//! the [`ControlDevice`] and [`SinkRouter`] traits.

pub mod control;
pub mod error;
pub mod protocol;
pub mod report;
pub mod sink;
pub mod state;

pub use control::{ChatMixController, ControlDevice, SinkNames, SinkRouter};
pub use error::{Error, Result};
pub use protocol::{
    DecodedMessage, Direction, Frame, MAX_PAYLOAD, MSGLEN, Opcode, OpcodeField, ReadOutcome,
    decode, encode,
};
pub use report::{ChatMixLevels, Report};
pub use sink::{OutputSinkDescriptor, parse_sink_list};
pub use state::{DeviceFeatureState, LoopState, SinkPairHandle, StopCause};
