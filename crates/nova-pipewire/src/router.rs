//! Game/chat virtual sinks backed by `pw-loopback` processes.
//!
//! Each virtual sink is a `pw-loopback` whose capture side is exposed as an
//! `Audio/Sink` and whose playback side targets the headset's output sink.
//! Volumes are set on the capture node, `input.<name>`, with `pactl`.

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};

use nova_core::{ChatMixLevels, OutputSinkDescriptor, SinkNames, SinkPairHandle, SinkRouter};
use tracing::{debug, info, warn};

use crate::error::{PwError, PwResult};

/// Highest volume applied to a virtual sink, in percent.
const MAX_VOLUME_PERCENT: u8 = 100;

/// External programs the router drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterCommands {
    /// `pactl` binary
    pub pactl: String,
    /// `pw-loopback` binary
    pub pw_loopback: String,
}

impl Default for RouterCommands {
    fn default() -> Self {
        Self { pactl: "pactl".to_string(), pw_loopback: "pw-loopback".to_string() }
    }
}

/// Arguments for a `pw-loopback` exposing `name` as a sink routed into `output`.
#[must_use]
pub fn loopback_args(name: &str, output: &OutputSinkDescriptor) -> Vec<String> {
    let audio_props = format!(
        "audio.format={},audio.rate={},audio.channels={}",
        output.sample_format, output.sample_rate_hz, output.channel_count
    );
    vec![
        "-P".to_string(),
        output.name.clone(),
        format!("--capture-props=media.class=Audio/Sink,{audio_props}"),
        "-n".to_string(),
        name.to_string(),
    ]
}

/// Arguments for `pactl` setting the volume of virtual sink `name`.
#[must_use]
pub fn volume_args(name: &str, percent: u8) -> Vec<String> {
    vec![
        "set-sink-volume".to_string(),
        format!("input.{name}"),
        format!("{}%", percent.min(MAX_VOLUME_PERCENT)),
    ]
}

struct VirtualSink {
    name: String,
    process: Child,
}

struct LoopbackPair {
    game: VirtualSink,
    chat: VirtualSink,
}

/// Sink router spawning one `pw-loopback` per virtual sink.
pub struct LoopbackRouter {
    commands: RouterCommands,
    next_id: u64,
    pairs: HashMap<SinkPairHandle, LoopbackPair>,
    /// Volume commands still running
    pending: Vec<Child>,
}

impl LoopbackRouter {
    /// Create a router using the given programs.
    #[must_use]
    pub fn new(commands: RouterCommands) -> Self {
        Self { commands, next_id: 1, pairs: HashMap::new(), pending: Vec::new() }
    }

    /// Number of live sink pairs.
    #[must_use]
    pub fn active_pairs(&self) -> usize {
        self.pairs.len()
    }

    /// Create both sinks of a pair.
    ///
    /// # Errors
    /// Returns an error if either `pw-loopback` cannot be spawned. A game sink
    /// already spawned is stopped again.
    pub fn create(&mut self, output: &OutputSinkDescriptor, names: &SinkNames) -> PwResult<SinkPairHandle> {
        let mut game = self.spawn_sink(&names.game, output)?;
        let chat = match self.spawn_sink(&names.chat, output) {
            Ok(chat) => chat,
            Err(e) => {
                if let Err(stop_err) = stop_sink(&mut game) {
                    warn!(sink = %game.name, error = %stop_err, "Failed to stop loopback");
                }
                return Err(e);
            }
        };

        let handle = SinkPairHandle::new(self.next_id);
        self.next_id += 1;
        self.pairs.insert(handle, LoopbackPair { game, chat });
        Ok(handle)
    }

    /// Set game and chat volumes without waiting for `pactl` to finish.
    ///
    /// # Errors
    /// Returns an error if the pair is unknown or `pactl` cannot be spawned.
    pub fn apply(&mut self, handle: SinkPairHandle, levels: ChatMixLevels) -> PwResult<()> {
        self.reap_pending();

        let pair = self.pairs.get(&handle).ok_or(PwError::UnknownPair(handle.id()))?;
        let mut game = self.volume_command(&pair.game.name, levels.game_percent);
        let mut chat = self.volume_command(&pair.chat.name, levels.chat_percent);

        let game_child = game.spawn().map_err(|source| self.pactl_failed(source))?;
        self.pending.push(game_child);

        let chat_child = match chat.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(game = levels.game_percent, "Game volume applied, chat volume not");
                return Err(self.pactl_failed(source));
            }
        };
        self.pending.push(chat_child);

        debug!(game = levels.game_percent, chat = levels.chat_percent, "Volumes requested");
        Ok(())
    }

    /// Stop both sinks of a pair. Unknown or already released handles are a
    /// no-op.
    ///
    /// # Errors
    /// Returns the first error hit while stopping the processes; both are
    /// always attempted.
    pub fn release(&mut self, handle: SinkPairHandle) -> PwResult<()> {
        let Some(mut pair) = self.pairs.remove(&handle) else {
            debug!(pair = handle.id(), "Sink pair already released");
            return Ok(());
        };

        let game = stop_sink(&mut pair.game);
        let chat = stop_sink(&mut pair.chat);
        info!(game = %pair.game.name, chat = %pair.chat.name, "Virtual sinks removed");
        game.and(chat)
    }

    fn spawn_sink(&self, name: &str, output: &OutputSinkDescriptor) -> PwResult<VirtualSink> {
        let process = Command::new(&self.commands.pw_loopback)
            .args(loopback_args(name, output))
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| PwError::SpawnFailed {
                program: self.commands.pw_loopback.clone(),
                source,
            })?;

        debug!(name, pid = process.id(), "Loopback spawned");
        Ok(VirtualSink { name: name.to_string(), process })
    }

    fn volume_command(&self, name: &str, percent: u8) -> Command {
        let mut command = Command::new(&self.commands.pactl);
        command.args(volume_args(name, percent)).stdin(Stdio::null());
        command
    }

    fn pactl_failed(&self, source: std::io::Error) -> PwError {
        PwError::SpawnFailed { program: self.commands.pactl.clone(), source }
    }

    fn reap_pending(&mut self) {
        self.pending.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    warn!(%status, "Volume command failed");
                }
                false
            }
            Ok(None) => true,
            Err(e) => {
                warn!(error = %e, "Failed to poll volume command");
                false
            }
        });
    }
}

impl Default for LoopbackRouter {
    fn default() -> Self {
        Self::new(RouterCommands::default())
    }
}

impl SinkRouter for LoopbackRouter {
    fn create_pair(
        &mut self,
        output: &OutputSinkDescriptor,
        names: &SinkNames,
    ) -> nova_core::Result<SinkPairHandle> {
        Ok(self.create(output, names)?)
    }

    fn set_volumes(&mut self, pair: SinkPairHandle, levels: ChatMixLevels) -> nova_core::Result<()> {
        Ok(self.apply(pair, levels)?)
    }

    fn teardown(&mut self, pair: SinkPairHandle) -> nova_core::Result<()> {
        Ok(self.release(pair)?)
    }
}

impl Drop for LoopbackRouter {
    fn drop(&mut self) {
        let handles: Vec<SinkPairHandle> = self.pairs.keys().copied().collect();
        for handle in handles {
            if let Err(e) = self.release(handle) {
                warn!(error = %e, "Failed to remove virtual sinks on drop");
            }
        }
        for child in &mut self.pending {
            if let Err(e) = child.wait() {
                warn!(error = %e, "Failed to wait for volume command on drop");
            }
        }
    }
}

fn stop_sink(sink: &mut VirtualSink) -> PwResult<()> {
    match sink.process.try_wait() {
        Ok(Some(status)) => {
            debug!(sink = %sink.name, %status, "Loopback already exited");
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => warn!(sink = %sink.name, error = %e, "Failed to poll loopback, killing anyway"),
    }
    sink.process.kill()?;
    sink.process.wait()?;
    Ok(())
}
