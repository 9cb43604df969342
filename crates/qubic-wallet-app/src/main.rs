#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]
#![warn(missing_docs)]
//! # qubic-wallet binary
//!
//! Entry point selecting desktop or server mode.

use clap::Parser;
use qubic_wallet_app::config::{Cli, LaunchConfig};
use qubic_wallet_app::{app_version, launcher, logging};

/// CLI entry point.
fn main() {
    logging::init_logging();

    let cli = Cli::parse();
    let config = LaunchConfig::from_cli(&cli);
    tracing::info!(version = app_version(), mode = ?config.mode, "starting qubic-wallet");

    if let Err(error) = launcher::run(&config) {
        tracing::error!(%error, "startup failed");
        eprintln!("qubic-wallet failed to start: {error}");
        std::process::exit(1);
    }
}
