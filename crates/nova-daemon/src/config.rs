//! Daemon configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use nova_core::SinkNames;
use nova_hid::DeviceIds;
use nova_hid::device::{CONTROL_INTERFACE, NOVA_PRO_PIDS, STEELSERIES_VID};
use nova_pipewire::discovery::DEFAULT_AUTODETECT;
use nova_pipewire::{RouterCommands, SinkSelector};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Device settings
    #[serde(default)]
    pub device: DeviceConfig,
    /// Audio settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Daemon-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Device settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// USB Vendor ID (hex)
    #[serde(default = "default_vid")]
    pub vendor_id: String,
    /// USB Product IDs (hex), in order of preference
    #[serde(default = "default_pids")]
    pub product_ids: Vec<String>,
    /// Control interface number
    #[serde(default = "default_interface")]
    pub interface: i32,
    /// Per-read timeout in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            vendor_id: default_vid(),
            product_ids: default_pids(),
            interface: default_interface(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl DeviceConfig {
    /// USB identity to look for.
    pub fn ids(&self) -> Result<DeviceIds> {
        let vendor_id = parse_hex_id(&self.vendor_id)?;
        let product_ids =
            self.product_ids.iter().map(|pid| parse_hex_id(pid)).collect::<Result<Vec<_>>>()?;
        Ok(DeviceIds { vendor_id, product_ids, interface: self.interface })
    }

    /// Per-read timeout.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject settings the device loop cannot run with.
    ///
    /// # Errors
    /// Returns an error for a zero read timeout or malformed USB IDs.
    pub fn validate(&self) -> Result<()> {
        // A zero timeout turns every read into a poll and the loop into a spin
        anyhow::ensure!(self.read_timeout_ms > 0, "device.read_timeout_ms must be greater than 0");
        self.ids()?;
        Ok(())
    }
}

fn default_vid() -> String {
    format!("{STEELSERIES_VID:04x}")
}

fn default_pids() -> Vec<String> {
    NOVA_PRO_PIDS.iter().map(|pid| format!("{pid:04x}")).collect()
}

fn default_interface() -> i32 {
    CONTROL_INTERFACE
}

fn default_read_timeout_ms() -> u64 {
    1000
}

/// Audio settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Exact output sink name; skips autodetection when set
    pub output_sink: Option<String>,
    /// Substring used to autodetect the output sink
    #[serde(default = "default_autodetect")]
    pub autodetect: String,
    /// Game virtual sink name
    #[serde(default = "default_game_sink")]
    pub game_sink: String,
    /// Chat virtual sink name
    #[serde(default = "default_chat_sink")]
    pub chat_sink: String,
    /// `pactl` binary
    #[serde(default = "default_pactl")]
    pub pactl: String,
    /// `pw-loopback` binary
    #[serde(default = "default_pw_loopback")]
    pub pw_loopback: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            output_sink: None,
            autodetect: default_autodetect(),
            game_sink: default_game_sink(),
            chat_sink: default_chat_sink(),
            pactl: default_pactl(),
            pw_loopback: default_pw_loopback(),
        }
    }
}

impl AudioConfig {
    /// How to pick the output sink.
    #[must_use]
    pub fn selector(&self) -> SinkSelector {
        match &self.output_sink {
            Some(name) => SinkSelector::Named(name.clone()),
            None => SinkSelector::Autodetect(self.autodetect.clone()),
        }
    }

    /// Names of the virtual sinks.
    #[must_use]
    pub fn sink_names(&self) -> SinkNames {
        SinkNames { game: self.game_sink.clone(), chat: self.chat_sink.clone() }
    }

    /// Programs driven by the sink router.
    #[must_use]
    pub fn router_commands(&self) -> RouterCommands {
        RouterCommands { pactl: self.pactl.clone(), pw_loopback: self.pw_loopback.clone() }
    }
}

fn default_autodetect() -> String {
    DEFAULT_AUTODETECT.to_string()
}

fn default_game_sink() -> String {
    SinkNames::default().game
}

fn default_chat_sink() -> String {
    SinkNames::default().chat
}

fn default_pactl() -> String {
    RouterCommands::default().pactl
}

fn default_pw_loopback() -> String {
    RouterCommands::default().pw_loopback
}

/// Parse a USB ID written as hex, with or without a `0x` prefix.
fn parse_hex_id(value: &str) -> Result<u16> {
    let digits = value.trim().trim_start_matches("0x").trim_start_matches("0X");
    u16::from_str_radix(digits, 16).with_context(|| format!("Invalid USB ID: {value:?}"))
}

/// Load configuration from `path`, the default location, or defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))?;
        config
            .device
            .validate()
            .with_context(|| format!("Invalid config file: {config_path:?}"))?;
        Ok(config)
    } else {
        info!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("org", "nova-chatmix", "nova-chatmix")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
