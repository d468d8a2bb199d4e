//! Command line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Command line arguments as parsed by `clap`.
#[derive(Debug, Parser)]
#[command(name = "nova-chatmix", author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Map the ChatMix dial onto the game and chat sinks (default)
    Run {
        /// Exact output sink name, overriding autodetection
        #[arg(long, value_name = "SINK")]
        output_sink: Option<String>,
    },
    /// Print reports sent by the base station
    Monitor {
        /// Also print the raw frame bytes
        #[arg(long)]
        raw: bool,
    },
    /// List the sinks known to the audio server
    Sinks,
    /// Set the volume attenuation
    Volume {
        /// Attenuation level (higher is quieter)
        attenuation: u8,
    },
    /// Select an EQ preset (4 is the custom preset)
    EqPreset {
        /// Preset number
        preset: u8,
    },
}

impl Cli {
    /// The subcommand to run, `run` when none was given.
    #[must_use]
    pub fn action(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run { output_sink: None })
    }

    /// Log level implied by `--verbose`, if any.
    #[must_use]
    pub fn verbosity(&self) -> Option<&'static str> {
        match self.verbose {
            0 => None,
            1 => Some("debug"),
            _ => Some("trace"),
        }
    }
}
