//! Base station HID frame codec.
//!
//! Every message exchanged with the base station is a single 63-byte HID
//! report laid out as `[direction, opcode, payload..., zero padding]`. The
//! transport delivers exactly one report per message, so frames carry no
//! length prefix of their own.

use std::fmt;

use crate::error::{Error, Result};
use crate::report::Report;

/// HID message length.
pub const MSGLEN: usize = 63;
/// Direction byte plus opcode byte.
pub const HEADER_LEN: usize = 2;
/// Largest payload that fits in a frame.
pub const MAX_PAYLOAD: usize = MSGLEN - HEADER_LEN;

/// A raw, fixed-size HID frame.
pub type Frame = [u8; MSGLEN];

/// Data direction, carried in the first byte of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// To the base station
    Tx = 0x06,
    /// From the base station
    Rx = 0x07,
}

impl Direction {
    /// Wire code of this direction.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a direction by its wire code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x06 => Some(Self::Tx),
            0x07 => Some(Self::Rx),
            _ => None,
        }
    }
}

/// Options this client knows how to read or write.
///
/// The device supports far more; anything else decodes as
/// [`OpcodeField::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// Sonar icon on the base station display
    SonarIcon = 0x8D,
    /// Lets the dial switch between volume and ChatMix
    ChatMixEnable = 0x49,
    /// Volume attenuation
    Volume = 0x25,
    /// Game and chat levels
    ChatMix = 0x45,
    /// EQ band and value
    Eq = 0x31,
    /// EQ preset; preset 4 is the custom preset used by `Eq`
    EqPreset = 0x2E,
}

impl Opcode {
    /// All known opcodes.
    pub const ALL: [Self; 6] =
        [Self::SonarIcon, Self::ChatMixEnable, Self::Volume, Self::ChatMix, Self::Eq, Self::EqPreset];

    /// Wire code of this opcode.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by its wire code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.code() == code)
    }

    /// Number of meaningful payload bytes for this opcode.
    #[must_use]
    pub fn payload_width(self) -> usize {
        match self {
            Self::SonarIcon | Self::ChatMixEnable | Self::Volume | Self::EqPreset => 1,
            Self::ChatMix | Self::Eq => 2,
        }
    }
}

/// Opcode byte of a decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeField {
    Known(Opcode),
    /// Firmware sent something this client does not model
    Unknown(u8),
}

impl OpcodeField {
    /// Classify a raw opcode byte.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        Opcode::from_code(code).map_or(Self::Unknown(code), Self::Known)
    }

    /// Raw wire code.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            Self::Known(op) => op.code(),
            Self::Unknown(code) => code,
        }
    }
}

/// Build a frame from a direction, opcode and payload.
///
/// # Errors
/// Returns [`Error::PayloadTooLarge`] if `payload` exceeds [`MAX_PAYLOAD`].
pub fn encode(direction: Direction, opcode: Opcode, payload: &[u8]) -> Result<Frame> {
    if payload.len() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge { len: payload.len() });
    }

    let mut frame = [0u8; MSGLEN];
    frame[0] = direction.code();
    frame[1] = opcode.code();
    frame[HEADER_LEN..HEADER_LEN + payload.len()].copy_from_slice(payload);
    Ok(frame)
}

/// Decode a frame.
///
/// Short reads are zero-extended and anything past [`MSGLEN`] is ignored.
/// Decoding never fails: unknown opcodes are reported as
/// [`OpcodeField::Unknown`].
#[must_use]
pub fn decode(bytes: &[u8]) -> DecodedMessage {
    let mut frame = [0u8; MSGLEN];
    let len = bytes.len().min(MSGLEN);
    frame[..len].copy_from_slice(&bytes[..len]);
    DecodedMessage { frame }
}

/// A frame received from (or destined for) the base station.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    frame: Frame,
}

impl DecodedMessage {
    /// Raw direction byte.
    #[must_use]
    pub fn direction_code(&self) -> u8 {
        self.frame[0]
    }

    /// Direction, if it is one we recognise.
    #[must_use]
    pub fn direction(&self) -> Option<Direction> {
        Direction::from_code(self.frame[0])
    }

    /// Opcode of this message.
    #[must_use]
    pub fn opcode(&self) -> OpcodeField {
        OpcodeField::from_code(self.frame[1])
    }

    /// Everything after the header, padding included.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.frame[HEADER_LEN..]
    }

    /// The payload bytes meaningful for this opcode, or the whole payload
    /// for unknown opcodes.
    #[must_use]
    pub fn raw_payload(&self) -> &[u8] {
        match self.opcode() {
            OpcodeField::Known(op) => &self.payload()[..op.payload_width()],
            OpcodeField::Unknown(_) => self.payload(),
        }
    }

    /// The full 63-byte frame.
    #[must_use]
    pub fn as_bytes(&self) -> &Frame {
        &self.frame
    }

    /// Typed view of this message.
    #[must_use]
    pub fn report(&self) -> Report {
        Report::from_message(self)
    }
}

impl fmt::Debug for DecodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedMessage")
            .field("direction", &format_args!("{:#04x}", self.direction_code()))
            .field("opcode", &self.opcode())
            .field("payload", &self.raw_payload())
            .finish()
    }
}

/// Result of a bounded read from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A frame arrived
    Message(DecodedMessage),
    /// Nothing arrived before the timeout
    Timeout,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_encode_layout() {
        let frame = encode(Direction::Tx, Opcode::ChatMixEnable, &[1]).unwrap();

        assert_eq!(frame.len(), MSGLEN);
        assert_eq!(&frame[..3], &[0x06, 0x49, 0x01]);
        assert!(frame[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_encode_full_payload_fills_frame() {
        let payload = [0xAB; MAX_PAYLOAD];
        let frame = encode(Direction::Rx, Opcode::Eq, &payload).unwrap();

        assert_eq!(frame[0], 0x07);
        assert_eq!(frame[1], 0x31);
        assert!(frame[HEADER_LEN..].iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let payload = [0u8; MAX_PAYLOAD + 1];
        let result = encode(Direction::Tx, Opcode::Volume, &payload);

        assert_matches!(result, Err(Error::PayloadTooLarge { len: 62 }));
    }

    #[test]
    fn test_opcode_codes_match_wire_format() {
        assert_eq!(Opcode::SonarIcon.code(), 0x8D);
        assert_eq!(Opcode::ChatMixEnable.code(), 0x49);
        assert_eq!(Opcode::Volume.code(), 0x25);
        assert_eq!(Opcode::ChatMix.code(), 0x45);
        assert_eq!(Opcode::Eq.code(), 0x31);
        assert_eq!(Opcode::EqPreset.code(), 0x2E);
    }

    #[test]
    fn test_decode_short_read_is_zero_extended() {
        let msg = decode(&[0x07, 0x45, 70]);

        assert_eq!(msg.opcode(), OpcodeField::Known(Opcode::ChatMix));
        assert_eq!(msg.raw_payload(), &[70, 0]);
        assert_eq!(msg.payload().len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_decode_empty_read() {
        let msg = decode(&[]);

        assert_eq!(msg.direction(), None);
        assert_eq!(msg.opcode(), OpcodeField::Unknown(0));
    }

    #[test]
    fn test_decode_unknown_direction_is_informational() {
        let msg = decode(&[0x42, 0x25, 12]);

        assert_eq!(msg.direction(), None);
        assert_eq!(msg.direction_code(), 0x42);
        assert_eq!(msg.opcode(), OpcodeField::Known(Opcode::Volume));
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            op_index in 0..Opcode::ALL.len(),
            rx in any::<bool>(),
            payload in proptest::collection::vec(any::<u8>(), 0..=MAX_PAYLOAD),
        ) {
            let opcode = Opcode::ALL[op_index];
            let direction = if rx { Direction::Rx } else { Direction::Tx };
            let frame = encode(direction, opcode, &payload).unwrap();
            let msg = decode(&frame);

            prop_assert_eq!(msg.direction(), Some(direction));
            prop_assert_eq!(msg.opcode(), OpcodeField::Known(opcode));
            prop_assert_eq!(&msg.payload()[..payload.len()], payload.as_slice());
            prop_assert!(msg.payload()[payload.len()..].iter().all(|&b| b == 0));
        }

        #[test]
        fn prop_unknown_opcode_never_fails(code in any::<u8>(), tail in any::<[u8; 4]>()) {
            prop_assume!(Opcode::from_code(code).is_none());
            let msg = decode(&[0x07, code, tail[0], tail[1], tail[2], tail[3]]);

            prop_assert_eq!(msg.opcode(), OpcodeField::Unknown(code));
            prop_assert_eq!(msg.report(), Report::Unknown { code });
        }
    }
}
