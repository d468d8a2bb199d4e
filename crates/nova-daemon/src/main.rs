//! Nova ChatMix - ChatMix for the Arctis Nova Pro on Linux.
//!
//! This is the main entry point. It loads configuration, sets up logging and
//! signal handling, and runs the requested subcommand on a blocking worker
//! thread so that signals can cancel it.

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod monitor;
mod signals;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;

    // Initialize logging; RUST_LOG wins over the configured level
    let level = cli.verbosity().unwrap_or(config.daemon.log_level.as_str());
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!(
            "warn,nova_core={level},nova_hid={level},nova_pipewire={level},nova_chatmix={level}"
        ))
        .context("Invalid log level")?,
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting nova-chatmix");

    // Set up signal handling
    let cancel = CancellationToken::new();
    signals::setup_signal_handlers(cancel.clone())?;

    let command = cli.action();
    let worker_cancel = cancel.clone();
    let exit = tokio::task::spawn_blocking(move || app::dispatch(&command, &config, &worker_cancel))
        .await
        .context("Worker thread panicked")??;

    // Release the signal task
    cancel.cancel();

    if let Some(message) = exit.message() {
        println!("{message}");
    }

    info!("nova-chatmix stopped");
    Ok(())
}
