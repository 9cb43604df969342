//! Maps request paths onto files under the staged asset root.

use std::path::{Path, PathBuf};

use mime_guess::{MimeGuess, mime};

/// Document served for `/`, directories, and client-side routes.
pub const INDEX_FILE: &str = "index.html";

/// Resolves `request_target` (path with optional query) under `root`.
///
/// Returns `None` for traversal attempts, dot-prefixed segments (which keeps
/// the version marker private), malformed escapes, and misses that look like
/// file requests. Extension-less misses fall back to `index.html`.
pub fn resolve_static_path(root: &Path, request_target: &str) -> Option<PathBuf> {
    let path = request_target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut resolved = root.to_path_buf();
    let mut last_segment = String::new();
    for raw_segment in path.split('/') {
        if raw_segment.is_empty() || raw_segment == "." {
            continue;
        }
        let segment = percent_decode(raw_segment)?;
        if segment.starts_with('.') || segment.contains(['/', '\\', ':', '\0']) {
            return None;
        }
        resolved.push(&segment);
        last_segment = segment;
    }

    if resolved.is_dir() {
        resolved.push(INDEX_FILE);
    }
    if resolved.is_file() {
        return Some(resolved);
    }

    if !last_segment.contains('.') {
        let index = root.join(INDEX_FILE);
        if index.is_file() {
            return Some(index);
        }
    }

    None
}

/// Content type for a served file, by extension. Text types are labelled
/// UTF-8.
pub fn content_type(path: &Path) -> String {
    let guess = MimeGuess::from_path(path).first_or_octet_stream();
    let textual = guess.type_() == mime::TEXT || guess.subtype() == mime::JAVASCRIPT;
    if textual && guess.get_param(mime::CHARSET).is_none() {
        format!("{}; charset=utf-8", guess.essence_str())
    } else {
        guess.essence_str().to_string()
    }
}

fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let hex = bytes.get(index + 1..index + 3)?;
            let hex = std::str::from_utf8(hex).ok()?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_decoding_rejects_truncated_escapes() {
        assert_eq!(percent_decode("a%20b").as_deref(), Some("a b"));
        assert_eq!(percent_decode("a%2"), None);
        assert_eq!(percent_decode("%zz"), None);
    }

    #[test]
    fn content_type_defaults_to_octet_stream() {
        assert_eq!(content_type(Path::new("app.CSS")), "text/css; charset=utf-8");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }

    #[test]
    fn content_type_covers_modern_asset_formats() {
        assert_eq!(content_type(Path::new("logo.webp")), "image/webp");
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("icon.png")), "image/png");
        assert!(content_type(Path::new("data.xml")).contains("xml"));
        assert!(content_type(Path::new("app.js")).ends_with("javascript; charset=utf-8"));
    }
}
