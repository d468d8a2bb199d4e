//! HID error types.

use thiserror::Error;

/// HID error type.
#[derive(Debug, Error)]
pub enum HidError {
    #[error("Device not found")]
    DeviceNotFound,

    #[error("Device session is closed")]
    SessionClosed,

    #[error("Device disconnected: {0}")]
    Disconnected(String),

    #[error("HID API error: {0}")]
    Api(#[from] hidapi::HidError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] nova_core::Error),
}

impl From<HidError> for nova_core::Error {
    fn from(err: HidError) -> Self {
        match err {
            HidError::DeviceNotFound => Self::DeviceNotFound,
            HidError::SessionClosed => Self::SessionClosed,
            HidError::Disconnected(reason) => Self::DeviceDisconnected(reason),
            HidError::Protocol(e) => e,
            HidError::Api(e) => Self::Device(e.to_string()),
        }
    }
}

/// Result type for HID operations.
pub type HidResult<T> = Result<T, HidError>;
