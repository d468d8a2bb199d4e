//! Report monitor: prints what the base station sends.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use nova_core::{ControlDevice, ReadOutcome, StopCause};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Print one line per report until cancelled or the device goes away.
///
/// With `raw`, each report is preceded by the frame bytes in hex.
pub fn run_monitor<D: ControlDevice, W: Write>(
    device: &mut D,
    out: &mut W,
    raw: bool,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> Result<StopCause> {
    while !cancel.is_cancelled() {
        match device.read_message(read_timeout) {
            Ok(ReadOutcome::Timeout) => {}
            Ok(ReadOutcome::Message(msg)) => {
                if raw {
                    writeln!(out, "{}", hex(msg.as_bytes()))?;
                }
                writeln!(out, "{}", msg.report())?;
                out.flush()?;
            }
            Err(e) => {
                warn!(error = %e, "Device read failed, probably disconnected");
                return Ok(StopCause::Disconnected(e.to_string()));
            }
        }
    }
    Ok(StopCause::Requested)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use nova_core::protocol::{Direction, Opcode, decode, encode};
    use nova_core::{DeviceFeatureState, Error};

    use super::*;

    struct ScriptedDevice {
        reads: VecDeque<nova_core::Result<ReadOutcome>>,
    }

    impl ControlDevice for ScriptedDevice {
        fn set_chatmix_controls(&mut self, _enabled: bool) -> nova_core::Result<()> {
            Ok(())
        }

        fn set_sonar_icon(&mut self, _enabled: bool) -> nova_core::Result<()> {
            Ok(())
        }

        fn read_message(&mut self, _timeout: Duration) -> nova_core::Result<ReadOutcome> {
            self.reads
                .pop_front()
                .unwrap_or_else(|| Err(Error::DeviceDisconnected("script ended".into())))
        }

        fn features(&self) -> DeviceFeatureState {
            DeviceFeatureState::default()
        }
    }

    fn rx(opcode: Opcode, payload: &[u8]) -> nova_core::Result<ReadOutcome> {
        Ok(ReadOutcome::Message(decode(&encode(Direction::Rx, opcode, payload).unwrap())))
    }

    #[test]
    fn test_prints_each_report_kind() {
        let mut device = ScriptedDevice {
            reads: VecDeque::from(vec![
                rx(Opcode::Volume, &[8]),
                Ok(ReadOutcome::Timeout),
                rx(Opcode::ChatMix, &[100, 0]),
                rx(Opcode::Eq, &[1, 24]),
                rx(Opcode::EqPreset, &[4]),
                Ok(ReadOutcome::Message(decode(&[0x07, 0xC1]))),
            ]),
        };
        let mut out = Vec::new();

        let cause = run_monitor(
            &mut device,
            &mut out,
            false,
            Duration::from_millis(1),
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(cause, StopCause::Disconnected("Device disconnected: script ended".into()));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Volume: -8\n\
             Game Volume: 100 - Chat Volume: 0\n\
             EQ: Bar: 1 - Value: 2\n\
             EQ Preset: 4\n\
             Unknown Message (0xc1)\n"
        );
    }

    #[test]
    fn test_raw_output_includes_frame() {
        let mut device = ScriptedDevice { reads: VecDeque::from(vec![rx(Opcode::EqPreset, &[2])]) };
        let mut out = Vec::new();

        run_monitor(&mut device, &mut out, true, Duration::from_millis(1), &CancellationToken::new())
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        let raw = lines.next().unwrap();
        assert!(raw.starts_with("07 2e 02 00"));
        assert_eq!(raw.split(' ').count(), 63);
        assert_eq!(lines.next(), Some("EQ Preset: 2"));
    }

    #[test]
    fn test_cancelled_monitor_stops() {
        let mut device = ScriptedDevice { reads: VecDeque::new() };
        let cancel = CancellationToken::new();
        cancel.cancel();

        let cause =
            run_monitor(&mut device, &mut Vec::new(), false, Duration::from_millis(1), &cancel)
                .unwrap();
        assert_eq!(cause, StopCause::Requested);
    }
}
