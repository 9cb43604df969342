//! Tracing subscriber setup and log redaction.

use tracing_subscriber::EnvFilter;

/// Env var holding the log filter; `RUST_LOG` is consulted when unset.
pub const LOG_ENV: &str = "QUBIC_WALLET_LOG";

const REDACTED: &str = "<redacted>";
const AUTHORIZATION_KEY: &str = "authorization=";
const SECRET_KEYS: [&str; 4] = ["token=", "session=", AUTHORIZATION_KEY, "bearer "];

/// Installs the global stderr subscriber. Later calls are no-ops.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Replaces values of secret-bearing `key=value` pairs with `<redacted>`.
///
/// Values end at `&`, `;`, `#`, whitespace, or end of input, so URLs and
/// cookie strings keep their shape. An `authorization=` value that starts
/// with an auth scheme (`Bearer abc`) also covers the credential after it.
pub fn redact_sensitive(input: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut redacted = String::with_capacity(input.len());
    let mut cursor = 0;

    while cursor < input.len() {
        let next = SECRET_KEYS
            .iter()
            .filter_map(|key| lower[cursor..].find(*key).map(|offset| (cursor + offset, *key)))
            .min_by_key(|(position, _)| *position);

        let Some((position, key)) = next else {
            break;
        };

        let value_start = position + key.len();
        let mut value_end = scan_value_end(input, value_start);
        if key == AUTHORIZATION_KEY && is_auth_scheme(&input[value_start..value_end]) {
            let rest = &input[value_end..];
            let credential_start = value_end + (rest.len() - rest.trim_start().len());
            if credential_start > value_end && credential_start < input.len() {
                value_end = scan_value_end(input, credential_start);
            }
        }

        redacted.push_str(&input[cursor..value_start]);
        if value_end > value_start {
            redacted.push_str(REDACTED);
        }
        cursor = value_end;
    }

    redacted.push_str(&input[cursor..]);
    redacted
}

fn scan_value_end(input: &str, start: usize) -> usize {
    input[start..]
        .find(|c: char| matches!(c, '&' | ';' | '#') || c.is_whitespace())
        .map_or(input.len(), |offset| start + offset)
}

fn is_auth_scheme(word: &str) -> bool {
    !word.is_empty() && word.bytes().all(|b| b.is_ascii_alphabetic())
}
