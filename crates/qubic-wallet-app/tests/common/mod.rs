//! Shared fixtures for app integration tests.

use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::Path;

use qubic_wallet_session::SessionSecret;
use tempfile::TempDir;

/// Secret used across gate scenarios.
#[allow(dead_code)]
pub const FIXTURE_SECRET: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90";

/// Builds the fixture secret.
#[allow(dead_code)]
pub fn fixture_secret() -> SessionSecret {
    SessionSecret::from_hex(FIXTURE_SECRET).expect("fixture secret should be valid hex")
}

/// Creates a staged-looking asset tree with an index page, a stylesheet and a
/// version marker.
#[allow(dead_code)]
pub fn fixture_asset_root() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write(dir.path(), "index.html", "<!doctype html><title>wallet</title>");
    write(dir.path(), "css/app.css", ".is-valid { color: green; }");
    write(dir.path(), ".version", "build-1");
    dir
}

/// Writes `content` to `root/relative`, creating parent directories.
#[allow(dead_code)]
pub fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("fixture file should be written");
}

/// Minimal parsed HTTP response.
#[allow(dead_code)]
#[derive(Debug)]
pub struct RawResponse {
    /// Status code.
    pub status: u16,
    /// Header lines as `(lowercase name, value)`.
    pub headers: Vec<(String, String)>,
    /// Body text.
    pub body: String,
}

#[allow(dead_code)]
impl RawResponse {
    /// First header value with `name` (lowercase).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Sends a GET over a fresh connection and reads the full response.
#[allow(dead_code)]
pub fn http_get(addr: SocketAddr, target: &str, cookie: Option<&str>) -> RawResponse {
    let mut stream = TcpStream::connect(addr).expect("server should accept connections");
    let mut request = format!("GET {target} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(cookie) = cookie {
        request.push_str(&format!("Cookie: {cookie}\r\n"));
    }
    request.push_str("\r\n");
    stream
        .write_all(request.as_bytes())
        .expect("request should be written");

    let mut raw = String::new();
    stream
        .read_to_string(&mut raw)
        .expect("response should be readable");

    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw.as_str(), ""));
    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line should carry a code");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body: body.to_string(),
    }
}
