//! Output sink discovery via `pactl`.

use nova_core::{OutputSinkDescriptor, parse_sink_list};
use tracing::{debug, info};

use crate::error::{PwError, PwResult};

/// Substring identifying the Nova Pro's output sink.
pub const DEFAULT_AUTODETECT: &str = "SteelSeries_Arctis_Nova_Pro";

/// How to pick the output sink the virtual sinks are routed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSelector {
    /// Exact sink name
    Named(String),
    /// Substring of the sink name
    Autodetect(String),
}

impl Default for SinkSelector {
    fn default() -> Self {
        Self::Autodetect(DEFAULT_AUTODETECT.to_string())
    }
}

/// List all sinks known to the audio server.
///
/// # Errors
/// Returns an error if `pactl` cannot be run or its output does not parse.
pub fn list_sinks(pactl: &str) -> PwResult<Vec<OutputSinkDescriptor>> {
    let output = std::process::Command::new(pactl)
        .args(["list", "short", "sinks"])
        .output()
        .map_err(|source| PwError::SpawnFailed { program: pactl.to_string(), source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PwError::CommandFailed(format!("{pactl} list short sinks: {stderr}")));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let sinks = parse_sink_list(&stdout)?;
    debug!(count = sinks.len(), "Sinks listed");
    Ok(sinks)
}

/// Pick the output sink from a sink list.
///
/// With [`SinkSelector::Autodetect`] the last matching sink wins.
///
/// # Errors
/// Returns [`PwError::SinkNotFound`] if nothing matches.
pub fn select_output_sink(
    sinks: Vec<OutputSinkDescriptor>,
    selector: &SinkSelector,
) -> PwResult<OutputSinkDescriptor> {
    let found = match selector {
        SinkSelector::Named(name) => sinks.into_iter().find(|s| &s.name == name),
        SinkSelector::Autodetect(needle) => {
            sinks.into_iter().filter(|s| s.name.contains(needle.as_str())).last()
        }
    };

    found.ok_or_else(|| {
        PwError::SinkNotFound(match selector {
            SinkSelector::Named(name) | SinkSelector::Autodetect(name) => name.clone(),
        })
    })
}

/// List sinks and pick the output sink.
///
/// # Errors
/// Returns an error if listing fails or no sink matches.
pub fn resolve_output_sink(pactl: &str, selector: &SinkSelector) -> PwResult<OutputSinkDescriptor> {
    let sink = select_output_sink(list_sinks(pactl)?, selector)?;
    info!(
        name = %sink.name,
        format = %sink.sample_format,
        channels = sink.channel_count,
        rate = sink.sample_rate_hz,
        "Output sink selected"
    );
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const PACTL_OUTPUT: &str = "\
48\talsa_output.pci-0000_00_1f.3.analog-stereo\tPipeWire\ts32le 2ch 48000Hz\tSUSPENDED
55\talsa_output.usb-SteelSeries_Arctis_Nova_Pro_Wireless-00.analog-stereo\tPipeWire\ts24le 2ch 48000Hz\tRUNNING
56\talsa_output.usb-SteelSeries_Arctis_Nova_Pro_Wireless-00.iec958-stereo\tPipeWire\ts16le 2ch 44100Hz\tIDLE
";

    fn sinks() -> Vec<OutputSinkDescriptor> {
        parse_sink_list(PACTL_OUTPUT).unwrap()
    }

    #[test]
    fn test_autodetect_last_match_wins() {
        let sink = select_output_sink(sinks(), &SinkSelector::default()).unwrap();

        assert_eq!(sink.id, 56);
        assert_eq!(sink.sample_rate_hz, 44100);
    }

    #[test]
    fn test_named_selection_is_exact() {
        let selector =
            SinkSelector::Named("alsa_output.pci-0000_00_1f.3.analog-stereo".to_string());
        let sink = select_output_sink(sinks(), &selector).unwrap();
        assert_eq!(sink.id, 48);

        let partial = SinkSelector::Named("alsa_output".to_string());
        assert_matches!(select_output_sink(sinks(), &partial), Err(PwError::SinkNotFound(_)));
    }

    #[test]
    fn test_no_match() {
        let selector = SinkSelector::Autodetect("Arctis_7".to_string());
        let err = select_output_sink(sinks(), &selector).unwrap_err();

        assert_matches!(err, PwError::SinkNotFound(ref needle) if needle == "Arctis_7");
    }

    #[test]
    fn test_missing_pactl_is_spawn_error() {
        assert_matches!(
            list_sinks("nova-test-no-such-pactl"),
            Err(PwError::SpawnFailed { .. })
        );
    }
}
