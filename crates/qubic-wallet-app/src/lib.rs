#![warn(missing_docs)]
//! # qubic-wallet-app
//!
//! ## Purpose
//! Launches the Qubic.Net Wallet either as an embedded native window or as a
//! loopback-only web server opened in the user's browser.
//!
//! ## Responsibilities
//! - Select the run mode from the command line and fall back to server mode
//!   when the native webview is unavailable.
//! - Stage the embedded UI assets before anything is served.
//! - Serve assets and the identity validation endpoint behind the
//!   [`qubic_wallet_session::SessionGate`].
//! - Offload native file dialogs to a small worker pool.
//!
//! ## Data flow
//! CLI -> [`config::LaunchConfig`] -> [`launcher::run`] -> asset staging ->
//! either [`desktop::run_desktop`] or [`server::WalletServer`] with the gate
//! as first stage of every request.
//!
//! ## Ownership and lifetimes
//! Process-wide values (secret, asset root, dialog service) are built once at
//! startup and moved into the request loop or window closures; nothing is
//! held in globals.
//!
//! ## Error model
//! Startup failures are wrapped in [`AppError`] and end the process with a
//! non-zero status. Browser auto-open and icon caching failures are logged
//! and discarded.
//!
//! ## Security and privacy notes
//! - The server binds to loopback only.
//! - The one-time URL is printed only in debug builds and is redacted from
//!   log output.

pub mod bridge;
pub mod config;
pub mod desktop;
pub mod dialogs;
pub mod fatal;
pub mod identity_api;
pub mod launcher;
pub mod logging;
pub mod server;
pub mod static_files;

use qubic_wallet_assets::{AssetBundle, AssetError};
use thiserror::Error;

pub use desktop::DesktopError;
pub use logging::redact_sensitive;

/// Build-time application version loaded from root `VERSION`.
pub const APP_VERSION: &str = env!("QUBIC_WALLET_VERSION");

/// Version token of the embedded asset bundle (SHA-256 of `VERSION` and the
/// bundle bytes).
pub const BUILD_ID: &str = env!("QUBIC_WALLET_BUILD_ID");

/// Native window title.
pub const WINDOW_TITLE: &str = "Qubic.Net Wallet";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// UI asset bundle compiled into this binary, if any.
pub fn embedded_bundle() -> Option<AssetBundle<'static>> {
    #[cfg(embedded_assets)]
    {
        Some(AssetBundle::new(
            include_bytes!(concat!(env!("OUT_DIR"), "/wwwroot.zip")),
            BUILD_ID,
        ))
    }

    #[cfg(not(embedded_assets))]
    {
        None
    }
}

/// Window icon compiled into this binary, if any.
pub fn embedded_icon() -> Option<&'static [u8]> {
    #[cfg(embedded_icon)]
    {
        Some(include_bytes!(concat!(env!("OUT_DIR"), "/icon.ico")))
    }

    #[cfg(not(embedded_icon))]
    {
        None
    }
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Asset staging failed; nothing can be served.
    #[error("asset staging failed: {0}")]
    Assets(#[from] AssetError),
    /// Loopback listener could not be started.
    #[error("failed to start loopback listener: {0}")]
    Listener(String),
    /// Desktop mode failed for a reason other than a missing native shell.
    #[error("desktop mode failed: {0}")]
    Desktop(#[from] DesktopError),
    /// Default browser could not be launched.
    #[error("browser launch failed: {0}")]
    Browser(std::io::Error),
}
