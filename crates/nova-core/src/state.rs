//! Feature flags and control loop state.

use std::fmt;

/// Device features this client has switched on.
///
/// Tracks the last command sent, not device-confirmed state: the base station
/// does not acknowledge these writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceFeatureState {
    /// ChatMix controls enabled
    pub chatmix_controls_enabled: bool,
    /// Sonar icon enabled
    pub sonar_icon_enabled: bool,
}

/// Opaque handle to a virtual sink pair owned by a sink router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkPairHandle(u64);

impl SinkPairHandle {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// State of the ChatMix control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Enabling features and creating sinks
    #[default]
    Starting,
    /// Forwarding ChatMix levels
    Running,
    /// Disabling features and tearing down sinks
    Stopping,
    /// Terminal
    Stopped,
}

/// Why the control loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopCause {
    /// A termination signal was received
    Requested,
    /// The device went away or a read failed
    Disconnected(String),
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("requested"),
            Self::Disconnected(_) => f.write_str("disconnected"),
        }
    }
}
