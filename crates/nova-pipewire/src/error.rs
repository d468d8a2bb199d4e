//! PipeWire error types.

use thiserror::Error;

/// PipeWire error type.
#[derive(Debug, Error)]
pub enum PwError {
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Output sink not found: {0}")]
    SinkNotFound(String),

    #[error("Unknown sink pair: {0}")]
    UnknownPair(u64),

    #[error("Process error: {0}")]
    ProcessError(#[from] std::io::Error),

    #[error(transparent)]
    Parse(#[from] nova_core::Error),
}

impl From<PwError> for nova_core::Error {
    fn from(err: PwError) -> Self {
        match err {
            PwError::Parse(e) => e,
            other => Self::SinkRouter(other.to_string()),
        }
    }
}

/// Result type for PipeWire operations.
pub type PwResult<T> = Result<T, PwError>;
