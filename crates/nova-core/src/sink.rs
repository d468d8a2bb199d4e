//! Output sink descriptors parsed from `pactl list short sinks`.
//!
//! Each line has five tab-separated columns:
//!
//! ```text
//! <id>\t<name>\t<protocol>\t<format> <n>ch <rate>Hz\t<state>
//! ```

use crate::error::{Error, Result};

const COLUMN_COUNT: usize = 5;
const METADATA_COLUMN_COUNT: usize = 3;

/// An existing audio sink the virtual sinks are routed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSinkDescriptor {
    /// Sink index
    pub id: u32,
    /// Sink name, used as the loopback playback target
    pub name: String,
    /// Driver/protocol module
    pub protocol: String,
    /// Sample format (e.g. "s16le")
    pub sample_format: String,
    /// Number of audio channels
    pub channel_count: u32,
    /// Sample rate in Hz
    pub sample_rate_hz: u32,
    /// Sink state (RUNNING, SUSPENDED, ...)
    pub state: String,
}

impl OutputSinkDescriptor {
    /// Parse a single line of `pactl list short sinks` output.
    ///
    /// # Errors
    /// Returns [`Error::SinkParse`] if the line does not have the expected
    /// shape or its numeric fields do not parse.
    pub fn from_line(line: &str) -> Result<Self> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != COLUMN_COUNT {
            return Err(parse_error(
                columns.get(1).copied().unwrap_or(line),
                format!("expected {COLUMN_COUNT} columns, got {}", columns.len()),
            ));
        }

        let name = columns[1];
        let metadata: Vec<&str> = columns[3].split(' ').collect();
        if metadata.len() != METADATA_COLUMN_COUNT {
            return Err(parse_error(
                name,
                format!(
                    "expected {METADATA_COLUMN_COUNT} audio metadata fields in '{}', got {}",
                    columns[3],
                    metadata.len()
                ),
            ));
        }

        let id = columns[0]
            .parse::<u32>()
            .map_err(|_| parse_error(name, format!("invalid sink id '{}'", columns[0])))?;
        let channel_count = parse_unit(metadata[1], "ch")
            .ok_or_else(|| parse_error(name, format!("invalid channels '{}'", metadata[1])))?;
        let sample_rate_hz = parse_unit(metadata[2], "Hz")
            .ok_or_else(|| parse_error(name, format!("invalid sample rate '{}'", metadata[2])))?;

        Ok(Self {
            id,
            name: name.to_string(),
            protocol: columns[2].to_string(),
            sample_format: metadata[0].to_string(),
            channel_count,
            sample_rate_hz,
            state: columns[4].to_string(),
        })
    }
}

/// Parse every non-empty line of `pactl list short sinks` output.
///
/// # Errors
/// Fails on the first line that does not parse.
pub fn parse_sink_list(output: &str) -> Result<Vec<OutputSinkDescriptor>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(OutputSinkDescriptor::from_line)
        .collect()
}

/// Parse `<digits><suffix>` into a positive integer.
fn parse_unit(value: &str, suffix: &str) -> Option<u32> {
    let digits = value.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|&n| n > 0)
}

fn parse_error(sink: &str, reason: String) -> Error {
    Error::SinkParse { sink: sink.to_string(), reason }
}
