//! Subcommand implementations.
//!
//! Everything here blocks on device or process I/O and runs on a blocking
//! worker thread.

use std::io;

use anyhow::{Context, Result};
use hidapi::HidApi;
use nova_core::{ChatMixController, StopCause};
use nova_hid::{HidError, Session, resolve_device_path};
use nova_pipewire::{LoopbackRouter, SinkSelector, list_sinks, resolve_output_sink};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::Command;
use crate::config::Config;
use crate::monitor::run_monitor;

/// How a subcommand ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exit {
    /// Finished normally
    Done,
    /// No base station was found
    DeviceNotFound,
    /// A long-running command stopped
    Stopped(StopCause),
}

impl Exit {
    /// One-line explanation for the user, if any.
    #[must_use]
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Done => None,
            Self::DeviceNotFound => Some("Device not found, exiting."),
            Self::Stopped(StopCause::Requested) => Some("Stop requested, exiting."),
            Self::Stopped(StopCause::Disconnected(_)) => {
                Some("Device was probably disconnected, exiting.")
            }
        }
    }
}

/// Run a subcommand to completion.
pub fn dispatch(command: &Command, config: &Config, cancel: &CancellationToken) -> Result<Exit> {
    match command {
        Command::Run { output_sink } => run_chatmix(config, output_sink.as_deref(), cancel),
        Command::Monitor { raw } => {
            with_session(config, |session| {
                let mut stdout = io::stdout().lock();
                let cause =
                    run_monitor(session, &mut stdout, *raw, config.device.read_timeout(), cancel)?;
                Ok(Exit::Stopped(cause))
            })
        }
        Command::Sinks => {
            for sink in list_sinks(&config.audio.pactl)? {
                println!(
                    "{}\t{}\t{} {}ch {}Hz\t{}",
                    sink.id,
                    sink.name,
                    sink.sample_format,
                    sink.channel_count,
                    sink.sample_rate_hz,
                    sink.state
                );
            }
            Ok(Exit::Done)
        }
        Command::Volume { attenuation } => with_session(config, |session| {
            session.set_volume_attenuation(*attenuation)?;
            info!(attenuation, "Volume set");
            Ok(Exit::Done)
        }),
        Command::EqPreset { preset } => with_session(config, |session| {
            session.set_eq_preset(*preset)?;
            info!(preset, "EQ preset selected");
            Ok(Exit::Done)
        }),
    }
}

/// Resolve and open the base station, then hand the session to `f`.
///
/// A missing device is reported as [`Exit::DeviceNotFound`] rather than an
/// error.
fn with_session<F>(config: &Config, f: F) -> Result<Exit>
where
    F: FnOnce(&mut Session) -> Result<Exit>,
{
    let api = HidApi::new().context("Failed to initialize HID API")?;
    let ids = config.device.ids()?;

    let path = match resolve_device_path(&api, &ids) {
        Ok(path) => path,
        Err(HidError::DeviceNotFound) => return Ok(Exit::DeviceNotFound),
        Err(e) => return Err(e).context("Failed to enumerate HID devices"),
    };

    let mut session = Session::open(&api, Some(&path)).context("Failed to open base station")?;
    let exit = f(&mut session);
    session.close();
    exit
}

/// Enable ChatMix and map the dial onto the virtual sinks until stopped.
fn run_chatmix(
    config: &Config,
    output_sink: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Exit> {
    let selector = match output_sink {
        Some(name) => SinkSelector::Named(name.to_string()),
        None => config.audio.selector(),
    };

    with_session(config, |session| {
        let output = resolve_output_sink(&config.audio.pactl, &selector)
            .context("Output sink not set")?;
        let names = config.audio.sink_names();
        let mut router = LoopbackRouter::new(config.audio.router_commands());

        let mut controller = ChatMixController::new(session, &mut router)
            .with_read_timeout(config.device.read_timeout());
        let cause = controller.run(&output, &names, cancel)?;
        Ok(Exit::Stopped(cause))
    })
}
