//! Integration tests for the gated loopback server over real sockets.

mod common;

use std::net::SocketAddr;
use std::thread::{self, JoinHandle};

use common::{FIXTURE_SECRET, fixture_asset_root, fixture_secret, http_get};
use qubic_wallet_app::config::LOOPBACK_BIND;
use qubic_wallet_app::server::{ServerContext, ShutdownHandle, WalletServer};
use qubic_wallet_session::{DENIAL_BODY, SESSION_COOKIE_NAME, SessionGate};

struct RunningServer {
    addr: SocketAddr,
    handle: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
    _assets: tempfile::TempDir,
}

impl RunningServer {
    fn start() -> Self {
        let assets = fixture_asset_root();
        let context = ServerContext::new(SessionGate::new(fixture_secret()), assets.path());
        let server = WalletServer::bind(LOOPBACK_BIND, context).expect("loopback bind should work");
        let addr = server.local_addr();
        let handle = server.shutdown_handle();
        let thread = thread::spawn(move || server.serve());
        Self {
            addr,
            handle,
            thread: Some(thread),
            _assets: assets,
        }
    }

    fn cookie(&self) -> String {
        format!("{SESSION_COOKIE_NAME}={FIXTURE_SECRET}")
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.handle.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[test]
fn server_gate_tests_binds_to_an_ephemeral_loopback_port() {
    let server = RunningServer::start();
    assert!(server.addr.ip().is_loopback());
    assert_ne!(server.addr.port(), 0);
}

#[test]
fn server_gate_tests_token_handshake_sets_cookie_and_redirects() {
    let server = RunningServer::start();
    let response = http_get(server.addr, &format!("/?token={FIXTURE_SECRET}"), None);

    assert_eq!(response.status, 302);
    assert_eq!(response.header("location"), Some("/"));
    let set_cookie = response.header("set-cookie").expect("handshake should set a cookie");
    assert!(set_cookie.starts_with(&format!("{SESSION_COOKIE_NAME}={FIXTURE_SECRET}")));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("Secure"));
}

#[test]
fn server_gate_tests_cookie_reaches_static_assets() {
    let server = RunningServer::start();
    let cookie = server.cookie();

    let index = http_get(server.addr, "/", Some(&cookie));
    assert_eq!(index.status, 200);
    assert!(index.body.contains("<title>wallet</title>"));
    assert_eq!(index.header("content-type"), Some("text/html; charset=utf-8"));

    let css = http_get(server.addr, "/css/app.css", Some(&cookie));
    assert_eq!(css.status, 200);
    assert_eq!(css.header("content-type"), Some("text/css; charset=utf-8"));

    let client_route = http_get(server.addr, "/index", Some(&cookie));
    assert_eq!(client_route.status, 200);
    assert!(client_route.body.contains("<title>wallet</title>"));
}

#[test]
fn server_gate_tests_rejects_missing_and_wrong_credentials_alike() {
    let server = RunningServer::start();

    let anonymous = http_get(server.addr, "/index", None);
    let wrong_cookie = http_get(
        server.addr,
        "/index",
        Some(&format!("{SESSION_COOKIE_NAME}=wrong")),
    );
    let wrong_token = http_get(server.addr, "/?token=00000000000000000000000000000000", None);

    for response in [&anonymous, &wrong_cookie, &wrong_token] {
        assert_eq!(response.status, 403);
        assert_eq!(response.body, DENIAL_BODY);
        assert!(response.header("set-cookie").is_none());
    }
}

#[test]
fn server_gate_tests_assets_are_unreachable_without_the_gate() {
    let server = RunningServer::start();
    let response = http_get(server.addr, "/css/app.css", None);
    assert_eq!(response.status, 403);
    assert!(!response.body.contains("is-valid"));
}

#[test]
fn server_gate_tests_version_marker_is_never_served() {
    let server = RunningServer::start();
    let response = http_get(server.addr, "/.version", Some(&server.cookie()));
    assert_eq!(response.status, 404);
    assert!(!response.body.contains("build-1"));
}

#[test]
fn server_gate_tests_validation_endpoint_answers_json() {
    let server = RunningServer::start();
    let response = http_get(
        server.addr,
        "/api/identity/validate?kind=destination&value=24",
        Some(&server.cookie()),
    );
    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(
        response.body,
        r#"{"error":"Contract index must be 0-23","cssClass":"is-invalid"}"#
    );
}
