//! Run-mode selection and server-mode wiring.

use qubic_wallet_assets::AssetStager;
use qubic_wallet_session::{SessionGate, SessionSecret};
use tracing::{info, warn};
use url::Url;

use crate::config::{LaunchConfig, LaunchMode};
use crate::desktop::{DesktopError, run_desktop};
use crate::server::{ServerContext, WalletServer};
use crate::{AppError, WINDOW_TITLE, embedded_bundle};

/// What to do after desktop mode returned.
#[derive(Debug)]
pub enum DesktopOutcome {
    /// Window closed normally.
    Closed,
    /// Native shell is missing; continue in server mode.
    FallBack(String),
}

/// Runs the wallet in the mode selected by `config`.
///
/// # Errors
/// Returns [`AppError`] for any fatal startup failure.
pub fn run(config: &LaunchConfig) -> Result<(), AppError> {
    match config.mode {
        LaunchMode::Server => run_server(config),
        LaunchMode::Desktop => match classify_desktop_result(run_desktop(config))? {
            DesktopOutcome::Closed => Ok(()),
            DesktopOutcome::FallBack(reason) => {
                eprintln!("Desktop mode failed: native library not available.");
                eprintln!("  {reason}");
                eprintln!("Falling back to server mode (--server)...");
                warn!(%reason, "falling back to server mode");
                run_server(&config.as_server())
            }
        },
    }
}

/// Splits a desktop-mode result into normal exit, fallback, or fatal error.
///
/// # Errors
/// Returns [`AppError::Desktop`] for every failure other than a missing
/// native shell.
pub fn classify_desktop_result(result: Result<(), DesktopError>) -> Result<DesktopOutcome, AppError> {
    match result {
        Ok(()) => Ok(DesktopOutcome::Closed),
        Err(DesktopError::NativeUnavailable(reason)) => Ok(DesktopOutcome::FallBack(reason)),
        Err(error) => Err(AppError::Desktop(error)),
    }
}

/// Stages assets, starts the gated loopback server and blocks serving it.
///
/// # Errors
/// Returns [`AppError`] when staging or binding fails.
pub fn run_server(config: &LaunchConfig) -> Result<(), AppError> {
    attach_console();

    let staged = AssetStager::for_current_user(embedded_bundle())?.resolve_asset_root()?;
    info!(root = %staged.root.display(), outcome = ?staged.outcome, "ui assets ready");

    let gate = SessionGate::new(SessionSecret::generate());
    let server = WalletServer::bind(config.bind_addr, ServerContext::new(gate, staged.root))?;
    let auth_url = server.auth_url();

    for line in startup_banner(server.base_url(), &auth_url, config.print_auth_url) {
        println!("{line}");
    }

    if config.open_browser {
        if let Err(error) = open_browser(&auth_url) {
            warn!(%error, "could not open the default browser");
        }
    }

    server.serve();
    Ok(())
}

/// Console lines printed once the listener is up. The one-time URL is only
/// included when `include_auth_url` is set.
pub fn startup_banner(base_url: &Url, auth_url: &Url, include_auth_url: bool) -> Vec<String> {
    let address = base_url.as_str().trim_end_matches('/');
    let mut lines = vec![format!("{WINDOW_TITLE} running at {address}"), String::new()];
    if include_auth_url {
        lines.push(format!("Open in browser: {auth_url}"));
    }
    lines
}

/// Launches the default browser at `url` without waiting for it.
///
/// # Errors
/// Returns [`AppError::Browser`] when no browser could be started; callers
/// log and discard it.
pub fn open_browser(url: &Url) -> Result<(), AppError> {
    open::that_detached(url.as_str()).map_err(AppError::Browser)
}

#[cfg(windows)]
fn attach_console() {
    // SAFETY: AllocConsole has no preconditions; it fails harmlessly when a
    // console is already attached.
    let _ = unsafe { windows_sys::Win32::System::Console::AllocConsole() };
}

#[cfg(not(windows))]
fn attach_console() {}
