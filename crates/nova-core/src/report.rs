//! Typed reports decoded from base station frames.

use std::fmt;

use crate::protocol::{DecodedMessage, Opcode, OpcodeField};

/// EQ values are offset by 20 and expressed in half-dB steps.
const EQ_ZERO_OFFSET: i16 = 20;

/// Game and chat levels reported by the ChatMix dial.
///
/// The device always reports both levels together, so they are applied
/// together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatMixLevels {
    /// Game volume in percent (0 - 100 per device contract)
    pub game_percent: u8,
    /// Chat volume in percent (0 - 100 per device contract)
    pub chat_percent: u8,
}

impl ChatMixLevels {
    #[must_use]
    pub fn new(game_percent: u8, chat_percent: u8) -> Self {
        Self { game_percent, chat_percent }
    }
}

/// Interpretation of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// Volume attenuation (higher is quieter)
    Volume { attenuation: u8 },
    /// ChatMix dial position
    ChatMix(ChatMixLevels),
    /// EQ band and its raw value
    Eq { band: u8, raw_value: u8 },
    /// Selected EQ preset
    EqPreset(u8),
    /// Sonar icon state
    SonarIcon(bool),
    /// ChatMix controls state
    ChatMixEnable(bool),
    /// Opcode this client does not model
    Unknown { code: u8 },
}

impl Report {
    /// Interpret a decoded message according to its opcode.
    #[must_use]
    pub fn from_message(msg: &DecodedMessage) -> Self {
        let payload = msg.payload();
        match msg.opcode() {
            OpcodeField::Known(Opcode::Volume) => Self::Volume { attenuation: payload[0] },
            OpcodeField::Known(Opcode::ChatMix) => {
                Self::ChatMix(ChatMixLevels::new(payload[0], payload[1]))
            }
            OpcodeField::Known(Opcode::Eq) => Self::Eq { band: payload[0], raw_value: payload[1] },
            OpcodeField::Known(Opcode::EqPreset) => Self::EqPreset(payload[0]),
            OpcodeField::Known(Opcode::SonarIcon) => Self::SonarIcon(payload[0] != 0),
            OpcodeField::Known(Opcode::ChatMixEnable) => Self::ChatMixEnable(payload[0] != 0),
            OpcodeField::Unknown(code) => Self::Unknown { code },
        }
    }

    /// EQ gain in dB, for `Eq` reports.
    #[must_use]
    pub fn eq_gain_db(&self) -> Option<f32> {
        match self {
            Self::Eq { raw_value, .. } => {
                Some(f32::from(i16::from(*raw_value) - EQ_ZERO_OFFSET) / 2.0)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Volume { attenuation } => write!(f, "Volume: -{attenuation}"),
            Self::ChatMix(levels) => write!(
                f,
                "Game Volume: {} - Chat Volume: {}",
                levels.game_percent, levels.chat_percent
            ),
            Self::Eq { band, .. } => {
                write!(f, "EQ: Bar: {band} - Value: {}", self.eq_gain_db().unwrap_or_default())
            }
            Self::EqPreset(preset) => write!(f, "EQ Preset: {preset}"),
            Self::SonarIcon(on) => write!(f, "Sonar Icon: {}", on_off(*on)),
            Self::ChatMixEnable(on) => write!(f, "ChatMix Controls: {}", on_off(*on)),
            Self::Unknown { code } => write!(f, "Unknown Message ({code:#04x})"),
        }
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}
