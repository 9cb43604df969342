//! Loopback HTTP server with the session gate as first request stage.

use std::fs::File;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::path::PathBuf;
use std::sync::Arc;

use qubic_wallet_session::{Admission, GateRequest, SessionGate};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};
use url::Url;

use crate::identity_api::{VALIDATE_ROUTE, check_from_query};
use crate::static_files::{content_type, resolve_static_path};
use crate::{AppError, redact_sensitive};

/// Everything the request pipeline needs, built once at startup.
#[derive(Debug, Clone)]
pub struct ServerContext {
    gate: SessionGate,
    asset_root: PathBuf,
}

impl ServerContext {
    /// Creates the pipeline context.
    pub fn new(gate: SessionGate, asset_root: impl Into<PathBuf>) -> Self {
        Self {
            gate,
            asset_root: asset_root.into(),
        }
    }

    /// Gate guarding every request.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }
}

/// Response chosen for one request, independent of the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Handshake completed: set the cookie and redirect.
    Redirect {
        /// Redirect target.
        location: &'static str,
        /// `Set-Cookie` header value.
        set_cookie: String,
    },
    /// Gate rejected the request.
    Denied {
        /// HTTP status code.
        status: u16,
        /// Plain-text body.
        body: &'static str,
    },
    /// Static asset.
    File {
        /// File to stream.
        path: PathBuf,
        /// Response content type.
        content_type: String,
    },
    /// JSON document.
    Json(String),
    /// Malformed API request.
    BadRequest,
    /// Nothing to serve.
    NotFound,
    /// Method other than GET/HEAD.
    MethodNotAllowed,
}

/// Routes one request. The gate runs before anything else is looked at.
pub fn route(context: &ServerContext, method: &Method, request: &GateRequest<'_>) -> Reply {
    match context.gate.admit(request) {
        Admission::Handshake {
            location,
            set_cookie,
        } => {
            return Reply::Redirect {
                location,
                set_cookie,
            };
        }
        Admission::Reject { status, body } => return Reply::Denied { status, body },
        Admission::Forward => {}
    }

    if !matches!(method, Method::Get | Method::Head) {
        return Reply::MethodNotAllowed;
    }

    let target = request.target();
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path == VALIDATE_ROUTE {
        return match check_from_query(query) {
            Some(check) => match serde_json::to_string(&check) {
                Ok(body) => Reply::Json(body),
                Err(_) => Reply::BadRequest,
            },
            None => Reply::BadRequest,
        };
    }

    match resolve_static_path(&context.asset_root, target) {
        Some(path) => Reply::File {
            content_type: content_type(&path),
            path,
        },
        None => Reply::NotFound,
    }
}

/// Stops a running [`WalletServer::serve`] loop from another thread.
#[derive(Clone)]
pub struct ShutdownHandle {
    server: Arc<Server>,
}

impl ShutdownHandle {
    /// Unblocks the accept loop; [`WalletServer::serve`] then returns.
    pub fn shutdown(&self) {
        self.server.unblock();
    }
}

/// HTTP listener bound to loopback.
pub struct WalletServer {
    server: Arc<Server>,
    local_addr: SocketAddr,
    base_url: Url,
    context: ServerContext,
}

impl WalletServer {
    /// Binds the listener. Port `0` lets the OS pick a free port.
    ///
    /// # Errors
    /// Returns [`AppError::Listener`] when the address cannot be bound.
    pub fn bind(addr: SocketAddr, context: ServerContext) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr)
            .map_err(|error| AppError::Listener(format!("bind {addr}: {error}")))?;
        let local_addr = listener
            .local_addr()
            .map_err(|error| AppError::Listener(format!("read local address: {error}")))?;
        let base_url = Url::parse(&format!("http://{local_addr}/"))
            .map_err(|error| AppError::Listener(format!("build base url: {error}")))?;
        let server = Server::from_listener(listener, None)
            .map_err(|error| AppError::Listener(error.to_string()))?;

        info!(%local_addr, "loopback listener ready");
        Ok(Self {
            server: Arc::new(server),
            local_addr,
            base_url,
            context,
        })
    }

    /// Bound socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Root URL of the server.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// One-time URL carrying the session secret.
    pub fn auth_url(&self) -> Url {
        self.context.gate.auth_url(&self.base_url)
    }

    /// Handle for stopping the server from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            server: Arc::clone(&self.server),
        }
    }

    /// Handles requests one at a time until shut down.
    pub fn serve(self) {
        for request in self.server.incoming_requests() {
            let reply = {
                let mut gate_request = GateRequest::new(request.url());
                for header in request.headers() {
                    if header.field.equiv("Cookie") {
                        gate_request = gate_request.with_cookie_header(header.value.as_str());
                    }
                }
                route(&self.context, request.method(), &gate_request)
            };

            debug!(
                method = %request.method(),
                target = %redact_sensitive(request.url()),
                reply = reply_label(&reply),
                "request"
            );
            if let Err(error) = respond(request, reply) {
                warn!(%error, "failed to write response");
            }
        }
        info!("loopback listener stopped");
    }
}

fn reply_label(reply: &Reply) -> &'static str {
    match reply {
        Reply::Redirect { .. } => "handshake",
        Reply::Denied { .. } => "denied",
        Reply::File { .. } => "file",
        Reply::Json(_) => "json",
        Reply::BadRequest => "bad-request",
        Reply::NotFound => "not-found",
        Reply::MethodNotAllowed => "method-not-allowed",
    }
}

fn respond(request: Request, reply: Reply) -> io::Result<()> {
    match reply {
        Reply::Redirect {
            location,
            set_cookie,
        } => request.respond(
            Response::empty(StatusCode(302))
                .with_header(header("Location", location)?)
                .with_header(header("Set-Cookie", &set_cookie)?),
        ),
        Reply::Denied { status, body } => request.respond(text_response(status, body)?),
        Reply::File { path, content_type } => match File::open(&path) {
            Ok(file) => request.respond(
                Response::from_file(file)
                    .with_header(header("Content-Type", &content_type)?)
                    .with_header(header("X-Content-Type-Options", "nosniff")?),
            ),
            Err(error) => {
                warn!(%error, path = %path.display(), "asset vanished before it could be served");
                request.respond(text_response(404, "Not found")?)
            }
        },
        Reply::Json(body) => request.respond(
            Response::from_string(body)
                .with_header(header("Content-Type", "application/json")?)
                .with_header(header("Cache-Control", "no-store")?),
        ),
        Reply::BadRequest => request.respond(text_response(400, "Bad request")?),
        Reply::NotFound => request.respond(text_response(404, "Not found")?),
        Reply::MethodNotAllowed => request.respond(text_response(405, "Method not allowed")?),
    }
}

fn text_response(status: u16, body: &str) -> io::Result<Response<io::Cursor<Vec<u8>>>> {
    Ok(Response::from_string(body)
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "text/plain; charset=utf-8")?))
}

fn header(name: &str, value: &str) -> io::Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).map_err(|()| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid {name} header value"),
        )
    })
}
