#![warn(missing_docs)]
//! # qubic-wallet-session
//!
//! ## Purpose
//! Admission control for the loopback web server run mode.
//!
//! ## Responsibilities
//! - Generate the per-process [`SessionSecret`].
//! - Upgrade a correctly presented `token` query parameter into a
//!   [`SessionCookie`] via redirect (the handshake).
//! - Classify every inbound request as handshake, forward, or reject.
//!
//! ## Data flow
//! Server startup -> [`SessionSecret::generate`] -> [`SessionGate`] built once
//! and shared with the request loop -> [`SessionGate::admit`] runs first for
//! every request -> [`Admission`] decides what the server does next.
//!
//! ## Ownership and lifetimes
//! The secret is immutable for the process lifetime and shared behind an
//! `Arc`, so the gate is cheap to clone into request handlers. Request views
//! borrow header strings from the transport.
//!
//! ## Error model
//! Admission never fails: unauthenticated requests map to
//! [`Admission::Reject`]. Only constructing a secret from external text can
//! fail with [`SessionError`].
//!
//! ## Security and privacy notes
//! - Missing and mismatched cookies produce the same 403 response.
//! - A presented token is not consumed; the secret is protected by only ever
//!   being printed once on the local console.
//! - `Debug` output never includes the secret value.
//!
//! ## Example
//! ```rust
//! use qubic_wallet_session::{Admission, GateRequest, SessionGate, SessionSecret};
//!
//! let gate = SessionGate::new(SessionSecret::generate());
//! let admission = gate.admit(&GateRequest::new("/index"));
//! assert!(matches!(admission, Admission::Reject { status: 403, .. }));
//! ```

use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use thiserror::Error;
use url::Url;
use url::form_urlencoded;

/// Name of the cookie proving a completed handshake.
pub const SESSION_COOKIE_NAME: &str = ".QubicWallet.Session";

/// Query parameter carrying the one-time secret.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Entropy of a session secret in bytes.
pub const SECRET_BYTES: usize = 16;

/// Status returned for every rejected request.
pub const DENIED_STATUS: u16 = 403;

/// Plain-text body returned for every rejected request.
pub const DENIAL_BODY: &str = "Access denied. Open the app from the URL shown in the console.";

/// Location the handshake redirects to.
pub const HANDSHAKE_LOCATION: &str = "/";

/// Random per-process secret, rendered as lowercase hex.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionSecret(String);

impl SessionSecret {
    /// Generates a fresh secret from the operating system's entropy source.
    pub fn generate() -> Self {
        Self::generate_with(&mut StdRng::from_os_rng())
    }

    /// Generates a secret from a caller-provided generator.
    pub fn generate_with<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps an existing lowercase hex secret.
    ///
    /// # Errors
    /// Returns [`SessionError::MalformedSecret`] unless `value` is exactly
    /// 32 lowercase hex digits.
    pub fn from_hex(value: impl Into<String>) -> Result<Self, SessionError> {
        let value = value.into();
        let well_formed = value.len() == SECRET_BYTES * 2
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !well_formed {
            return Err(SessionError::MalformedSecret);
        }
        Ok(Self(value))
    }

    /// Returns the hex value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact comparison against a presented value.
    pub fn matches(&self, candidate: &str) -> bool {
        let expected = self.0.as_bytes();
        let candidate = candidate.as_bytes();
        if expected.len() != candidate.len() {
            return false;
        }
        expected
            .iter()
            .zip(candidate)
            .fold(0u8, |acc, (left, right)| acc | (left ^ right))
            == 0
    }
}

impl fmt::Debug for SessionSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionSecret(<redacted>)")
    }
}

/// Cookie issued after a successful handshake.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionCookie {
    value: String,
}

impl SessionCookie {
    /// Builds the cookie carrying `secret`.
    pub fn for_secret(secret: &SessionSecret) -> Self {
        Self {
            value: secret.as_str().to_string(),
        }
    }

    /// Cookie value (same as the secret).
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Renders the `Set-Cookie` header value.
    ///
    /// Not marked `Secure`: the server only speaks plain HTTP on loopback.
    pub fn set_cookie_header(&self) -> String {
        format!(
            "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Strict",
            self.value
        )
    }
}

impl fmt::Debug for SessionCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionCookie(<redacted>)")
    }
}

/// Transport-independent view of the request parts the gate inspects.
#[derive(Debug, Clone, Default)]
pub struct GateRequest<'a> {
    target: &'a str,
    cookie_headers: Vec<&'a str>,
}

impl<'a> GateRequest<'a> {
    /// Creates a view over a request target (`path?query`).
    pub fn new(target: &'a str) -> Self {
        Self {
            target,
            cookie_headers: Vec::new(),
        }
    }

    /// Adds one raw `Cookie` header value.
    pub fn with_cookie_header(mut self, header: &'a str) -> Self {
        self.cookie_headers.push(header);
        self
    }

    /// Request target as received.
    pub fn target(&self) -> &str {
        self.target
    }

    /// Returns the single `token` query value, if exactly one is present.
    pub fn query_token(&self) -> Option<String> {
        let query = self.target.split_once('?')?.1;
        let query = query.split_once('#').map_or(query, |(query, _)| query);
        let mut tokens = form_urlencoded::parse(query.as_bytes())
            .filter(|(name, _)| name == TOKEN_QUERY_PARAM)
            .map(|(_, value)| value.into_owned());
        let token = tokens.next()?;
        if tokens.next().is_some() {
            return None;
        }
        Some(token)
    }

    /// Returns the first value of cookie `name` across all `Cookie` headers.
    pub fn cookie(&self, name: &str) -> Option<&'a str> {
        self.cookie_headers
            .iter()
            .flat_map(|header| header.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| key.trim() == name)
            .map(|(_, value)| value.trim().trim_matches('"'))
    }
}

/// Decision taken by the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Token accepted: set the cookie and redirect.
    Handshake {
        /// Redirect target.
        location: &'static str,
        /// `Set-Cookie` header value.
        set_cookie: String,
    },
    /// Cookie proven: pass the request on unmodified.
    Forward,
    /// Neither token nor cookie matched.
    Reject {
        /// HTTP status code.
        status: u16,
        /// Plain-text body.
        body: &'static str,
    },
}

/// Request classifier guarding every route of the server mode.
#[derive(Debug, Clone)]
pub struct SessionGate {
    secret: Arc<SessionSecret>,
}

impl SessionGate {
    /// Creates a gate for the process secret.
    pub fn new(secret: SessionSecret) -> Self {
        Self {
            secret: Arc::new(secret),
        }
    }

    /// Process secret guarded by this gate.
    pub fn secret(&self) -> &SessionSecret {
        &self.secret
    }

    /// Classifies one request. Precedence: token, then cookie, then reject.
    pub fn admit(&self, request: &GateRequest<'_>) -> Admission {
        if request
            .query_token()
            .is_some_and(|token| self.secret.matches(&token))
        {
            return Admission::Handshake {
                location: HANDSHAKE_LOCATION,
                set_cookie: SessionCookie::for_secret(&self.secret).set_cookie_header(),
            };
        }

        if request
            .cookie(SESSION_COOKIE_NAME)
            .is_some_and(|cookie| self.secret.matches(cookie))
        {
            return Admission::Forward;
        }

        Admission::Reject {
            status: DENIED_STATUS,
            body: DENIAL_BODY,
        }
    }

    /// Builds the one-time URL that performs the handshake against `base`.
    pub fn auth_url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair(TOKEN_QUERY_PARAM, self.secret.as_str());
        url
    }
}

/// Errors raised when constructing session values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Secret text is not 32 lowercase hex digits.
    #[error("session secret must be {} lowercase hex digits", SECRET_BYTES * 2)]
    MalformedSecret,
}
