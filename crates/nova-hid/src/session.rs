//! Control session with an open base station.

use std::ffi::CStr;
use std::time::Duration;

use hidapi::{HidApi, HidDevice};
use nova_core::protocol::{Direction, MSGLEN, Opcode, ReadOutcome, decode, encode};
use nova_core::{ControlDevice, DeviceFeatureState};
use tracing::{debug, info, trace};

use crate::error::{HidError, HidResult};

/// Raw report I/O underneath a [`Session`].
pub trait HidTransport {
    /// Write one output report.
    ///
    /// # Errors
    /// Returns an error if the write fails.
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize>;

    /// Read one input report, waiting at most `timeout_ms`. Returns 0 on
    /// timeout.
    ///
    /// # Errors
    /// Returns an error if the read fails.
    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize>;
}

impl HidTransport for HidDevice {
    fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
        Ok(self.write(data)?)
    }

    fn read_report(&mut self, buf: &mut [u8], timeout_ms: i32) -> HidResult<usize> {
        Ok(self.read_timeout(buf, timeout_ms)?)
    }
}

/// An open control session.
pub struct Session<T = HidDevice> {
    device: Option<T>,
    features: DeviceFeatureState,
}

impl Session<HidDevice> {
    /// Open the control interface at `path` in non-blocking mode.
    ///
    /// # Errors
    /// Returns [`HidError::DeviceNotFound`] if no path was resolved, or an
    /// API error if the device cannot be opened.
    pub fn open(api: &HidApi, path: Option<&CStr>) -> HidResult<Self> {
        let path = path.ok_or(HidError::DeviceNotFound)?;
        let device = api.open_path(path)?;
        device.set_blocking_mode(false)?;
        info!(path = ?path, "Device session opened");
        Ok(Self::with_transport(device))
    }
}

impl<T: HidTransport> Session<T> {
    /// Wrap an already open transport.
    pub fn with_transport(transport: T) -> Self {
        Self { device: Some(transport), features: DeviceFeatureState::default() }
    }

    /// Whether the session still holds a device.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    /// Release the device. Further I/O fails with [`HidError::SessionClosed`].
    pub fn close(&mut self) {
        if self.device.take().is_some() {
            debug!("Device session closed");
        }
    }

    /// Features switched on by the last commands sent.
    #[must_use]
    pub fn features(&self) -> DeviceFeatureState {
        self.features
    }

    /// Set the volume attenuation (higher is quieter).
    ///
    /// # Errors
    /// Returns an error if the session is closed or the write fails.
    pub fn set_volume_attenuation(&mut self, level: u8) -> HidResult<()> {
        self.send(Opcode::Volume, &[level])
    }

    /// Enable or disable ChatMix dial controls.
    ///
    /// # Errors
    /// Returns an error if the session is closed or the write fails.
    pub fn set_chatmix_controls(&mut self, enabled: bool) -> HidResult<()> {
        self.send(Opcode::ChatMixEnable, &[u8::from(enabled)])?;
        self.features.chatmix_controls_enabled = enabled;
        Ok(())
    }

    /// Enable or disable the Sonar icon.
    ///
    /// # Errors
    /// Returns an error if the session is closed or the write fails.
    pub fn set_sonar_icon(&mut self, enabled: bool) -> HidResult<()> {
        self.send(Opcode::SonarIcon, &[u8::from(enabled)])?;
        self.features.sonar_icon_enabled = enabled;
        Ok(())
    }

    /// Select an EQ preset. Preset 4 is the custom preset.
    ///
    /// # Errors
    /// Returns an error if the session is closed or the write fails.
    pub fn set_eq_preset(&mut self, preset: u8) -> HidResult<()> {
        self.send(Opcode::EqPreset, &[preset])
    }

    /// Wait up to `timeout` for the next frame from the base station.
    ///
    /// # Errors
    /// Returns [`HidError::Disconnected`] if the read fails, which in practice
    /// means the device went away.
    pub fn read_message(&mut self, timeout: Duration) -> HidResult<ReadOutcome> {
        let device = self.device.as_mut().ok_or(HidError::SessionClosed)?;
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);

        let mut buf = [0u8; MSGLEN];
        let len = device
            .read_report(&mut buf, timeout_ms)
            .map_err(|e| HidError::Disconnected(e.to_string()))?;

        if len == 0 {
            return Ok(ReadOutcome::Timeout);
        }

        let msg = decode(&buf[..len]);
        trace!(?msg, "Frame received");
        Ok(ReadOutcome::Message(msg))
    }

    fn send(&mut self, opcode: Opcode, payload: &[u8]) -> HidResult<()> {
        let device = self.device.as_mut().ok_or(HidError::SessionClosed)?;
        let frame = encode(Direction::Tx, opcode, payload)?;
        device.write_report(&frame)?;
        debug!(?opcode, ?payload, "Command sent");
        Ok(())
    }
}

impl<T: HidTransport> ControlDevice for Session<T> {
    fn set_chatmix_controls(&mut self, enabled: bool) -> nova_core::Result<()> {
        Ok(Session::set_chatmix_controls(self, enabled)?)
    }

    fn set_sonar_icon(&mut self, enabled: bool) -> nova_core::Result<()> {
        Ok(Session::set_sonar_icon(self, enabled)?)
    }

    fn read_message(&mut self, timeout: Duration) -> nova_core::Result<ReadOutcome> {
        Ok(Session::read_message(self, timeout)?)
    }

    fn features(&self) -> DeviceFeatureState {
        Session::features(self)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use assert_matches::assert_matches;
    use nova_core::protocol::OpcodeField;
    use nova_core::{ChatMixLevels, Report};

    use super::*;

    /// Records writes and replays scripted reads.
    #[derive(Default)]
    struct FakeTransport {
        written: Vec<Vec<u8>>,
        reads: VecDeque<HidResult<Vec<u8>>>,
        fail_writes: bool,
    }

    impl HidTransport for FakeTransport {
        fn write_report(&mut self, data: &[u8]) -> HidResult<usize> {
            if self.fail_writes {
                return Err(HidError::Disconnected("write failed".into()));
            }
            self.written.push(data.to_vec());
            Ok(data.len())
        }

        fn read_report(&mut self, buf: &mut [u8], _timeout_ms: i32) -> HidResult<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Ok(0),
            }
        }
    }

    fn session() -> Session<FakeTransport> {
        Session::with_transport(FakeTransport::default())
    }

    fn written(session: &Session<FakeTransport>) -> &[Vec<u8>] {
        &session.device.as_ref().unwrap().written
    }

    #[test]
    fn test_setters_write_full_frames() {
        let mut session = session();
        session.set_volume_attenuation(12).unwrap();
        session.set_eq_preset(4).unwrap();

        let frames = written(&session);
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.len() == MSGLEN));
        assert_eq!(&frames[0][..3], &[0x06, 0x25, 12]);
        assert_eq!(&frames[1][..3], &[0x06, 0x2E, 4]);
        assert!(frames[0][3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_feature_toggles_track_last_command() {
        let mut session = session();
        assert_eq!(session.features(), DeviceFeatureState::default());

        session.set_sonar_icon(true).unwrap();
        session.set_chatmix_controls(true).unwrap();
        assert!(session.features().sonar_icon_enabled);
        assert!(session.features().chatmix_controls_enabled);

        session.set_chatmix_controls(false).unwrap();
        assert!(!session.features().chatmix_controls_enabled);
        assert!(session.features().sonar_icon_enabled);

        let frames = written(&session);
        assert_eq!(&frames[0][..3], &[0x06, 0x8D, 1]);
        assert_eq!(&frames[1][..3], &[0x06, 0x49, 1]);
        assert_eq!(&frames[2][..3], &[0x06, 0x49, 0]);
    }

    #[test]
    fn test_failed_write_leaves_flags_untouched() {
        let mut session =
            Session::with_transport(FakeTransport { fail_writes: true, ..Default::default() });

        assert!(session.set_chatmix_controls(true).is_err());
        assert!(!session.features().chatmix_controls_enabled);
    }

    #[test]
    fn test_closed_session_rejects_io() {
        let mut session = session();
        session.close();

        assert!(!session.is_open());
        assert_matches!(session.set_volume_attenuation(1), Err(HidError::SessionClosed));
        assert_matches!(session.set_sonar_icon(true), Err(HidError::SessionClosed));
        assert_matches!(
            session.read_message(Duration::from_millis(1)),
            Err(HidError::SessionClosed)
        );
        assert!(!session.features().sonar_icon_enabled);
    }

    #[test]
    fn test_open_without_path_is_device_not_found() {
        // hidapi may be unavailable in sandboxed test environments
        let Ok(api) = HidApi::new() else { return };

        assert!(matches!(Session::open(&api, None), Err(HidError::DeviceNotFound)));
    }

    #[test]
    fn test_read_timeout_and_messages() {
        let mut session = session();
        session.device.as_mut().unwrap().reads =
            VecDeque::from(vec![Ok(vec![0x07, 0x45, 70, 30]), Ok(vec![])]);

        let outcome = session.read_message(Duration::from_millis(1000)).unwrap();
        let ReadOutcome::Message(msg) = outcome else { panic!("expected a message") };
        assert_eq!(msg.report(), Report::ChatMix(ChatMixLevels::new(70, 30)));

        assert_eq!(session.read_message(Duration::from_millis(1000)).unwrap(), ReadOutcome::Timeout);
    }

    #[test]
    fn test_read_error_is_disconnect() {
        let mut session = session();
        session.device.as_mut().unwrap().reads =
            VecDeque::from(vec![Err(HidError::Disconnected("hidraw: No such device".into()))]);

        assert_matches!(
            session.read_message(Duration::from_millis(1000)),
            Err(HidError::Disconnected(_))
        );
    }

    #[test]
    fn test_unknown_opcode_is_not_an_error() {
        let mut session = session();
        session.device.as_mut().unwrap().reads = VecDeque::from(vec![Ok(vec![0x07, 0xB0, 1])]);

        let outcome = session.read_message(Duration::from_millis(1000)).unwrap();
        assert_matches!(outcome, ReadOutcome::Message(msg) if msg.opcode() == OpcodeField::Unknown(0xB0));
    }

    #[test]
    fn test_control_device_maps_errors() {
        let mut session = session();
        session.device.as_mut().unwrap().reads =
            VecDeque::from(vec![Err(HidError::Disconnected("gone".into()))]);

        let err = ControlDevice::read_message(&mut session, Duration::from_millis(1)).unwrap_err();
        assert_matches!(err, nova_core::Error::DeviceDisconnected(_));

        session.close();
        let err = ControlDevice::set_sonar_icon(&mut session, false).unwrap_err();
        assert_matches!(err, nova_core::Error::SessionClosed);
    }
}
