//! Shared fixtures for asset staging tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Builds an in-memory zip archive from `(path, contents)` entries.
pub fn bundle_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (path, contents) in entries {
        writer
            .start_file(*path, options)
            .expect("zip entry should start");
        writer
            .write_all(contents.as_bytes())
            .expect("zip entry should be written");
    }
    writer
        .finish()
        .expect("zip archive should finish")
        .into_inner()
}
