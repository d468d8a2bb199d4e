//! Error types for Nova core.

use thiserror::Error;

/// Core error type for Nova operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Payload too large: {len} bytes (max {max})", max = crate::protocol::MAX_PAYLOAD)]
    PayloadTooLarge { len: usize },

    #[error("Unable to parse sink '{sink}': {reason}")]
    SinkParse { sink: String, reason: String },

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device session is closed")]
    SessionClosed,

    #[error("Device disconnected: {0}")]
    DeviceDisconnected(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Sink router error: {0}")]
    SinkRouter(String),
}

/// Result type alias for Nova core operations.
pub type Result<T> = std::result::Result<T, Error>;
