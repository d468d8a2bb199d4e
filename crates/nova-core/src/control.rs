//! ChatMix control loop.
//!
//! The controller enables the ChatMix features on the base station, creates
//! the game/chat virtual sink pair, then forwards every ChatMix report to the
//! sink router until it is cancelled or the device goes away. Shutdown always
//! runs the full disable/teardown sequence, even when the device is gone.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::error::Result;
use crate::protocol::ReadOutcome;
use crate::report::{ChatMixLevels, Report};
use crate::sink::OutputSinkDescriptor;
use crate::state::{DeviceFeatureState, LoopState, SinkPairHandle, StopCause};

/// Default per-read timeout; bounds how long a stop request can go unnoticed.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(1000);

/// The device side of the control loop.
#[cfg_attr(test, mockall::automock)]
pub trait ControlDevice {
    /// Enable or disable the ChatMix dial controls.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent.
    fn set_chatmix_controls(&mut self, enabled: bool) -> Result<()>;

    /// Enable or disable the Sonar icon.
    ///
    /// # Errors
    /// Returns an error if the command cannot be sent.
    fn set_sonar_icon(&mut self, enabled: bool) -> Result<()>;

    /// Wait up to `timeout` for the next frame.
    ///
    /// # Errors
    /// Returns an error if the device was disconnected or the read failed.
    fn read_message(&mut self, timeout: Duration) -> Result<ReadOutcome>;

    /// Features switched on by the last commands sent.
    fn features(&self) -> DeviceFeatureState;
}

/// The audio side of the control loop.
#[cfg_attr(test, mockall::automock)]
pub trait SinkRouter {
    /// Create the game and chat virtual sinks, routed into `output`.
    ///
    /// # Errors
    /// Returns an error if either sink cannot be created.
    fn create_pair(
        &mut self,
        output: &OutputSinkDescriptor,
        names: &SinkNames,
    ) -> Result<SinkPairHandle>;

    /// Apply both levels. Best-effort; no confirmation is awaited.
    ///
    /// # Errors
    /// Returns an error if the volume change cannot be issued.
    fn set_volumes(&mut self, pair: SinkPairHandle, levels: ChatMixLevels) -> Result<()>;

    /// Remove both sinks. Releasing an already released pair is a no-op.
    ///
    /// # Errors
    /// Returns an error if the sinks cannot be removed.
    fn teardown(&mut self, pair: SinkPairHandle) -> Result<()>;
}

/// Names of the two managed virtual sinks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkNames {
    pub game: String,
    pub chat: String,
}

impl Default for SinkNames {
    fn default() -> Self {
        Self { game: "NovaGame".to_string(), chat: "NovaChat".to_string() }
    }
}

/// Drives a device and a sink router through the ChatMix lifecycle.
pub struct ChatMixController<'a, D, R> {
    device: &'a mut D,
    router: &'a mut R,
    read_timeout: Duration,
    state: LoopState,
}

impl<'a, D: ControlDevice, R: SinkRouter> ChatMixController<'a, D, R> {
    /// Create a controller in the `Starting` state.
    pub fn new(device: &'a mut D, router: &'a mut R) -> Self {
        Self { device, router, read_timeout: DEFAULT_READ_TIMEOUT, state: LoopState::Starting }
    }

    /// Override the per-read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Current loop state.
    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Run the loop to completion.
    ///
    /// Returns why the loop stopped. Only startup failures are errors; by the
    /// time this returns, enabled features have been disabled and any created
    /// sinks torn down.
    ///
    /// # Errors
    /// Returns an error if the features cannot be enabled or the sink pair
    /// cannot be created.
    pub fn run(
        &mut self,
        output: &OutputSinkDescriptor,
        names: &SinkNames,
        cancel: &CancellationToken,
    ) -> Result<StopCause> {
        let pair = match self.start(output, names) {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "ChatMix startup failed");
                self.stop(None);
                return Err(e);
            }
        };

        let cause = self.forward_levels(pair, cancel);
        info!(cause = %cause, "ChatMix loop stopping");
        self.stop(Some(pair));
        Ok(cause)
    }

    fn start(&mut self, output: &OutputSinkDescriptor, names: &SinkNames) -> Result<SinkPairHandle> {
        self.transition(LoopState::Starting);

        self.device.set_sonar_icon(true)?;
        self.device.set_chatmix_controls(true)?;

        let pair = self.router.create_pair(output, names)?;
        info!(
            output = %output.name,
            game = %names.game,
            chat = %names.chat,
            "Virtual sinks created"
        );

        self.transition(LoopState::Running);
        Ok(pair)
    }

    fn forward_levels(&mut self, pair: SinkPairHandle, cancel: &CancellationToken) -> StopCause {
        loop {
            if cancel.is_cancelled() {
                return StopCause::Requested;
            }

            match self.device.read_message(self.read_timeout) {
                Ok(ReadOutcome::Timeout) => {}
                Ok(ReadOutcome::Message(msg)) => match msg.report() {
                    Report::ChatMix(levels) => {
                        debug!(game = levels.game_percent, chat = levels.chat_percent, "ChatMix");
                        if let Err(e) = self.router.set_volumes(pair, levels) {
                            warn!(error = %e, "Failed to apply ChatMix volumes");
                        }
                    }
                    report => trace!(?report, "Ignoring report"),
                },
                Err(e) => {
                    warn!(error = %e, "Device read failed, probably disconnected");
                    return StopCause::Disconnected(e.to_string());
                }
            }
        }
    }

    /// Best-effort cleanup: a failed step never blocks the next one.
    fn stop(&mut self, pair: Option<SinkPairHandle>) {
        self.transition(LoopState::Stopping);

        let features = self.device.features();
        if features.chatmix_controls_enabled
            && let Err(e) = self.device.set_chatmix_controls(false)
        {
            warn!(error = %e, "Failed to disable ChatMix controls");
        }
        if features.sonar_icon_enabled
            && let Err(e) = self.device.set_sonar_icon(false)
        {
            warn!(error = %e, "Failed to disable Sonar icon");
        }

        if let Some(pair) = pair
            && let Err(e) = self.router.teardown(pair)
        {
            warn!(error = %e, "Failed to tear down virtual sinks");
        }

        self.transition(LoopState::Stopped);
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = ?self.state, to = ?next, "ChatMix loop state");
        self.state = next;
    }
}
