//! Nova HID - Arctis Nova Pro base station integration.
//!
//! This crate finds the base station's control interface through `hidapi`
//! and wraps it in a [`Session`] exposing typed setters and bounded reads
//! built on the `nova-core` frame codec.

pub mod device;
pub mod error;
pub mod session;

pub use device::{DeviceIds, resolve_device_path};
pub use error::{HidError, HidResult};
pub use session::{HidTransport, Session};
