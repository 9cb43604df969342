//! Desktop mode: a native window hosting the UI through a custom protocol.
//!
//! The native shell is only compiled with the `webview` feature. Without it,
//! or when the platform webview cannot be loaded, [`run_desktop`] reports
//! [`DesktopError::NativeUnavailable`] and the launcher switches to server
//! mode.

use qubic_wallet_assets::{AssetError, AssetStager, StagedAssets};
use thiserror::Error;
use tracing::info;

use crate::config::LaunchConfig;
use crate::embedded_bundle;

/// Errors raised while starting desktop mode.
#[derive(Debug, Error)]
pub enum DesktopError {
    /// Native webview library is missing or failed to load.
    #[error("native webview unavailable: {0}")]
    NativeUnavailable(String),
    /// UI assets could not be staged.
    #[error(transparent)]
    Assets(#[from] AssetError),
    /// Window or webview creation failed for another reason.
    #[error("desktop startup failed: {0}")]
    Startup(String),
}

impl DesktopError {
    /// Whether this failure should trigger the server-mode fallback.
    pub fn is_native_unavailable(&self) -> bool {
        matches!(self, Self::NativeUnavailable(_))
    }
}

/// Stages the UI assets, opens the wallet window and blocks on its event
/// loop until the window is closed.
///
/// # Errors
/// Returns [`DesktopError::NativeUnavailable`] when no native webview can be
/// loaded, and other variants for fatal startup failures.
pub fn run_desktop(config: &LaunchConfig) -> Result<(), DesktopError> {
    let staged = AssetStager::for_current_user(embedded_bundle())?.resolve_asset_root()?;
    info!(root = %staged.root.display(), outcome = ?staged.outcome, "ui assets ready");
    open_window(config, staged)
}

#[cfg(not(feature = "webview"))]
fn open_window(_config: &LaunchConfig, _staged: StagedAssets) -> Result<(), DesktopError> {
    Err(DesktopError::NativeUnavailable(
        "built without the webview feature".to_string(),
    ))
}

#[cfg(feature = "webview")]
fn open_window(config: &LaunchConfig, staged: StagedAssets) -> Result<(), DesktopError> {
    native::open_window(config, staged)
}

#[cfg(feature = "webview")]
mod native {
    use std::borrow::Cow;
    use std::panic;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use qubic_wallet_assets::{StagedAssets, app_data_dir, executable_dir, resolve_icon_path};
    use tao::dpi::LogicalSize;
    use tao::event::{Event, WindowEvent};
    use tao::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
    use tao::window::{Icon, WindowBuilder};
    use tracing::{debug, warn};
    use wry::WebViewBuilder;
    use wry::http::header::CONTENT_TYPE;
    use wry::http::{Request, Response};

    use super::DesktopError;
    use crate::bridge::{self, BridgeReply, PAGE_BRIDGE_SCRIPT};
    use crate::config::LaunchConfig;
    use crate::dialogs::{
        DialogBackend, DialogFilter, FileDialogService, OpenDialogRequest, SaveDialogRequest,
    };
    use crate::fatal::install_fatal_hook;
    use crate::identity_api::{VALIDATE_ROUTE, check_from_query};
    use crate::static_files::{content_type, resolve_static_path};
    use crate::{WINDOW_TITLE, embedded_icon};

    const PROTOCOL: &str = "wallet";

    #[cfg(windows)]
    const START_URL: &str = "http://wallet.localhost/";
    #[cfg(not(windows))]
    const START_URL: &str = "wallet://localhost/";

    enum UserEvent {
        Script(String),
    }

    pub(super) fn open_window(
        config: &LaunchConfig,
        staged: StagedAssets,
    ) -> Result<(), DesktopError> {
        let version = wry::webview_version()
            .map_err(|error| DesktopError::NativeUnavailable(error.to_string()))?;
        debug!(%version, "native webview detected");

        // tao panics when the platform toolkit cannot be initialized.
        let event_loop = panic::catch_unwind(|| {
            EventLoopBuilder::<UserEvent>::with_user_event().build()
        })
        .map_err(|payload| DesktopError::NativeUnavailable(panic_message(payload.as_ref())))?;

        install_fatal_hook(show_fatal_modal);

        let (width, height) = config.window_size;
        let window = WindowBuilder::new()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(width, height))
            .with_window_icon(window_icon())
            .build(&event_loop)
            .map_err(|error| DesktopError::Startup(error.to_string()))?;

        let dialogs = Arc::new(FileDialogService::new(Some(Arc::new(RfdDialogs))));
        let proxy = Arc::new(Mutex::new(event_loop.create_proxy()));
        let asset_root = staged.root;

        let webview = WebViewBuilder::new(&window)
            .with_initialization_script(PAGE_BRIDGE_SCRIPT)
            .with_custom_protocol(PROTOCOL.to_string(), move |request: Request<Vec<u8>>| {
                serve_protocol(&asset_root, &request)
            })
            .with_ipc_handler(move |request: Request<String>| {
                handle_ipc(request.body(), &dialogs, &proxy);
            })
            .with_url(START_URL)
            .build()
            .map_err(|error| DesktopError::Startup(error.to_string()))?;

        event_loop.run(move |event, _, control_flow| {
            *control_flow = ControlFlow::Wait;
            match event {
                Event::UserEvent(UserEvent::Script(script)) => {
                    if let Err(error) = webview.evaluate_script(&script) {
                        warn!(%error, "failed to deliver bridge reply");
                    }
                }
                Event::WindowEvent {
                    event: WindowEvent::CloseRequested,
                    ..
                } => *control_flow = ControlFlow::Exit,
                _ => {}
            }
        })
    }

    fn window_icon() -> Option<Icon> {
        let exe_dir = executable_dir().ok()?;
        let data_dir = app_data_dir().ok()?;
        let path = match resolve_icon_path(embedded_icon(), &exe_dir, &data_dir) {
            Ok(path) => path?,
            Err(error) => {
                warn!(%error, "icon caching failed");
                return None;
            }
        };
        load_icon(&path)
    }

    fn load_icon(path: &Path) -> Option<Icon> {
        let image = image::open(path)
            .map_err(|error| warn!(%error, path = %path.display(), "unreadable window icon"))
            .ok()?
            .into_rgba8();
        let (width, height) = image.dimensions();
        Icon::from_rgba(image.into_raw(), width, height)
            .map_err(|error| warn!(%error, "invalid window icon"))
            .ok()
    }

    fn serve_protocol(root: &Path, request: &Request<Vec<u8>>) -> Response<Cow<'static, [u8]>> {
        let target = request
            .uri()
            .path_and_query()
            .map(|path_and_query| path_and_query.as_str())
            .unwrap_or("/");
        let (path, query) = target.split_once('?').unwrap_or((target, ""));

        if path == VALIDATE_ROUTE {
            return match check_from_query(query).and_then(|check| serde_json::to_vec(&check).ok()) {
                Some(body) => protocol_response(200, "application/json", body),
                None => protocol_response(400, "text/plain; charset=utf-8", b"Bad request".to_vec()),
            };
        }

        match resolve_static_path(root, target) {
            Some(file) => match std::fs::read(&file) {
                Ok(body) => protocol_response(200, &content_type(&file), body),
                Err(error) => {
                    warn!(%error, path = %file.display(), "asset read failed");
                    protocol_response(404, "text/plain; charset=utf-8", b"Not found".to_vec())
                }
            },
            None => protocol_response(404, "text/plain; charset=utf-8", b"Not found".to_vec()),
        }
    }

    fn protocol_response(status: u16, content_type: &str, body: Vec<u8>) -> Response<Cow<'static, [u8]>> {
        Response::builder()
            .status(status)
            .header(CONTENT_TYPE, content_type)
            .body(Cow::Owned(body))
            .unwrap_or_else(|_| Response::new(Cow::Borrowed(&[][..])))
    }

    fn handle_ipc(
        body: &str,
        dialogs: &FileDialogService,
        proxy: &Arc<Mutex<EventLoopProxy<UserEvent>>>,
    ) {
        let request = match bridge::parse_message(body) {
            Ok(request) => request,
            Err(error) => {
                warn!(%error, "ignoring bridge message");
                return;
            }
        };

        let proxy = Arc::clone(proxy);
        bridge::dispatch(
            request,
            dialogs,
            Arc::new(move |reply: BridgeReply| {
                let Ok(proxy) = proxy.lock() else {
                    return;
                };
                if proxy.send_event(UserEvent::Script(reply.to_script())).is_err() {
                    debug!("window closed before bridge reply");
                }
            }),
        );
    }

    fn show_fatal_modal(title: &str, message: &str) {
        rfd::MessageDialog::new()
            .set_title(title)
            .set_description(message)
            .set_level(rfd::MessageLevel::Error)
            .show();
    }

    fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
        payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "event loop initialization panicked".to_string())
    }

    struct RfdDialogs;

    impl RfdDialogs {
        fn dialog(title: &str, start_dir: &Path, filters: &[DialogFilter]) -> rfd::FileDialog {
            let mut dialog = rfd::FileDialog::new().set_title(title);
            if !start_dir.as_os_str().is_empty() {
                dialog = dialog.set_directory(start_dir);
            }
            for filter in filters {
                dialog = dialog.add_filter(filter.name.as_str(), &filter.bare_extensions());
            }
            dialog
        }
    }

    impl DialogBackend for RfdDialogs {
        fn save_file(&self, request: &SaveDialogRequest) -> Option<PathBuf> {
            Self::dialog(&request.title, &request.start_dir, &request.filters).save_file()
        }

        fn open_file(&self, request: &OpenDialogRequest) -> Option<PathBuf> {
            Self::dialog(&request.title, &request.start_dir, &request.filters).pick_file()
        }
    }
}
