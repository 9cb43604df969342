//! Launch configuration assembled from the command line and environment.

use std::net::{Ipv4Addr, SocketAddr};

use clap::Parser;

/// Environment switch for browser auto-open in server mode.
pub const OPEN_BROWSER_ENV: &str = "QUBIC_WALLET_OPEN_BROWSER";

/// Loopback address with an OS-assigned port.
pub const LOOPBACK_BIND: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

/// Initial native window size in logical pixels.
pub const WINDOW_SIZE: (f64, f64) = (1200.0, 800.0);

/// Command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "qubic-wallet", version, about = "Qubic.Net Wallet")]
pub struct Cli {
    /// Serve the wallet over loopback HTTP instead of opening a native window.
    #[arg(long)]
    pub server: bool,
    /// Do not open the default browser in server mode.
    #[arg(long)]
    pub no_browser: bool,
}

/// Process run mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Embedded native window, falling back to server mode when the native
    /// webview cannot be loaded.
    Desktop,
    /// Loopback web server opened in the default browser.
    Server,
}

/// Resolved launch settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchConfig {
    /// Requested run mode.
    pub mode: LaunchMode,
    /// Listener address for server mode.
    pub bind_addr: SocketAddr,
    /// Whether server mode tries to open the default browser.
    pub open_browser: bool,
    /// Whether the one-time URL is printed to the console.
    pub print_auth_url: bool,
    /// Initial window size for desktop mode.
    pub window_size: (f64, f64),
}

impl LaunchConfig {
    /// Builds the configuration for `cli`, honoring [`OPEN_BROWSER_ENV`].
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            mode: if cli.server {
                LaunchMode::Server
            } else {
                LaunchMode::Desktop
            },
            bind_addr: LOOPBACK_BIND,
            open_browser: !cli.no_browser && browser_enabled_from_env(),
            print_auth_url: cfg!(debug_assertions),
            window_size: WINDOW_SIZE,
        }
    }

    /// Same settings with the mode switched to server, used for fallback.
    pub fn as_server(&self) -> Self {
        Self {
            mode: LaunchMode::Server,
            ..self.clone()
        }
    }
}

/// Checks the browser auto-open env var.
///
/// Semantics:
/// - Unset => open the browser.
/// - `0`, `false`, `off` (case-insensitive) => do not open it.
/// - Any other value => open the browser.
pub fn browser_enabled_from_env() -> bool {
    match std::env::var(OPEN_BROWSER_ENV) {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_flag_selects_server_mode() {
        let cli = Cli::parse_from(["qubic-wallet", "--server", "--no-browser"]);
        let config = LaunchConfig::from_cli(&cli);
        assert_eq!(config.mode, LaunchMode::Server);
        assert!(!config.open_browser);
        assert!(config.bind_addr.ip().is_loopback());
        assert_eq!(config.bind_addr.port(), 0);
    }

    #[test]
    fn absent_flag_selects_desktop_mode() {
        let config = LaunchConfig::from_cli(&Cli::parse_from(["qubic-wallet"]));
        assert_eq!(config.mode, LaunchMode::Desktop);
        assert_eq!(config.as_server().mode, LaunchMode::Server);
        assert_eq!(config.as_server().window_size, config.window_size);
    }
}
