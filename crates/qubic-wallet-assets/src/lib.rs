#![warn(missing_docs)]
//! # qubic-wallet-assets
//!
//! ## Purpose
//! Materializes the UI asset bundle embedded in the wallet binary to a
//! per-user directory, once per binary version.
//!
//! ## Responsibilities
//! - Resolve the directory both run modes serve assets from.
//! - Reuse an extracted tree whose version marker matches the binary.
//! - Replace the whole tree when the version changes, never partially.
//! - Cache the embedded window icon next to the asset tree.
//!
//! ## Data flow
//! Launcher -> [`AssetStager::resolve_asset_root`] -> marker check ->
//! optional wipe + extract + marker write -> [`StagedAssets::root`] handed to
//! the server or the desktop window.
//!
//! ## Ownership and lifetimes
//! [`AssetBundle`] borrows the archive bytes, which are `'static` when they
//! come from `include_bytes!`. Resolved paths are owned.
//!
//! ## Error model
//! Extraction failures are fatal and returned as [`AssetError`]; the caller
//! aborts startup. Icon caching reports errors too, but callers treat it as
//! best-effort.
//!
//! ## Concurrency notes
//! Staging runs once at startup before any listener or window exists. Two
//! processes of the same user staging concurrently are not coordinated.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

/// Directory name under the platform's local data directory.
pub const APP_DATA_DIR_NAME: &str = "QubicWallet";

/// Directory holding the extracted (or unpackaged) asset tree.
pub const ASSET_DIR_NAME: &str = "wwwroot";

/// Marker file recording which version extracted the tree.
pub const VERSION_MARKER_FILE: &str = ".version";

/// File name of the window icon.
pub const ICON_FILE_NAME: &str = "icon.ico";

/// Embedded asset archive and the build token that identifies it.
#[derive(Debug, Clone, Copy)]
pub struct AssetBundle<'a> {
    archive: &'a [u8],
    version: &'a str,
}

impl<'a> AssetBundle<'a> {
    /// Creates a bundle from zip archive bytes and their version token.
    pub const fn new(archive: &'a [u8], version: &'a str) -> Self {
        Self { archive, version }
    }

    /// Zip archive bytes.
    pub fn archive(&self) -> &'a [u8] {
        self.archive
    }

    /// Version token written to the marker file.
    pub fn version(&self) -> &'a str {
        self.version
    }
}

/// How the asset root was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// No embedded bundle; serving the directory beside the executable.
    Unpackaged,
    /// Existing tree matched the current version.
    Reused,
    /// Tree was (re)extracted.
    Extracted,
}

/// Ready-to-serve asset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedAssets {
    /// Directory to serve.
    pub root: PathBuf,
    /// Path taken to produce `root`.
    pub outcome: StageOutcome,
}

/// Resolves the asset root, extracting the embedded bundle when needed.
#[derive(Debug, Clone)]
pub struct AssetStager<'a> {
    bundle: Option<AssetBundle<'a>>,
    target_dir: PathBuf,
    unpackaged_dir: PathBuf,
}

impl<'a> AssetStager<'a> {
    /// Creates a stager with explicit directories.
    ///
    /// `target_dir` receives extracted bundles; `unpackaged_dir` is served
    /// as-is when no bundle is embedded.
    pub fn new(
        bundle: Option<AssetBundle<'a>>,
        target_dir: impl Into<PathBuf>,
        unpackaged_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bundle,
            target_dir: target_dir.into(),
            unpackaged_dir: unpackaged_dir.into(),
        }
    }

    /// Creates a stager using the per-user data directory and the directory
    /// beside the running executable.
    ///
    /// # Errors
    /// Returns [`AssetError::NoDataDir`] or [`AssetError::NoExecutableDir`]
    /// when either location cannot be determined.
    pub fn for_current_user(bundle: Option<AssetBundle<'a>>) -> Result<Self, AssetError> {
        Ok(Self::new(
            bundle,
            app_data_dir()?.join(ASSET_DIR_NAME),
            executable_dir()?.join(ASSET_DIR_NAME),
        ))
    }

    /// Directory extracted bundles are written to.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Returns a directory ready to serve. Safe to call on every startup.
    ///
    /// # Errors
    /// Returns [`AssetError`] for any archive or filesystem failure during
    /// extraction. A failed extraction leaves no version marker behind, so the
    /// next call starts over.
    pub fn resolve_asset_root(&self) -> Result<StagedAssets, AssetError> {
        let Some(bundle) = self.bundle else {
            debug!(dir = %self.unpackaged_dir.display(), "no embedded assets, serving unpackaged dir");
            return Ok(StagedAssets {
                root: self.unpackaged_dir.clone(),
                outcome: StageOutcome::Unpackaged,
            });
        };

        if marker_matches(&self.target_dir, bundle.version()) {
            debug!(version = bundle.version(), "asset tree is current");
            return Ok(StagedAssets {
                root: self.target_dir.clone(),
                outcome: StageOutcome::Reused,
            });
        }

        info!(
            version = bundle.version(),
            dir = %self.target_dir.display(),
            "extracting ui assets"
        );
        extract_bundle(&bundle, &self.target_dir)?;

        Ok(StagedAssets {
            root: self.target_dir.clone(),
            outcome: StageOutcome::Extracted,
        })
    }
}

/// Per-user application data directory (`<local data>/QubicWallet`).
///
/// # Errors
/// Returns [`AssetError::NoDataDir`] when the platform reports none.
pub fn app_data_dir() -> Result<PathBuf, AssetError> {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DATA_DIR_NAME))
        .ok_or(AssetError::NoDataDir)
}

/// Directory containing the running executable.
///
/// # Errors
/// Returns [`AssetError::NoExecutableDir`] when the executable path cannot be
/// resolved.
pub fn executable_dir() -> Result<PathBuf, AssetError> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .ok_or(AssetError::NoExecutableDir)
}

/// Reads the version marker of `dir`. Missing or unreadable markers yield
/// `None`.
pub fn read_version_marker(dir: &Path) -> Option<String> {
    fs::read_to_string(dir.join(VERSION_MARKER_FILE))
        .ok()
        .map(|content| content.trim().to_string())
}

fn marker_matches(dir: &Path, version: &str) -> bool {
    read_version_marker(dir).is_some_and(|marker| marker == version)
}

fn extract_bundle(bundle: &AssetBundle<'_>, target_dir: &Path) -> Result<(), AssetError> {
    // Parse before touching the disk so a corrupt archive keeps the old tree.
    let mut archive = ZipArchive::new(Cursor::new(bundle.archive()))?;

    if target_dir.exists() {
        fs::remove_dir_all(target_dir).map_err(|source| AssetError::io(target_dir, source))?;
    }
    fs::create_dir_all(target_dir).map_err(|source| AssetError::io(target_dir, source))?;

    archive.extract(target_dir)?;

    let marker = target_dir.join(VERSION_MARKER_FILE);
    fs::write(&marker, bundle.version()).map_err(|source| AssetError::io(&marker, source))?;
    debug!(entries = archive.len(), "asset extraction complete");
    Ok(())
}

/// Locates a window icon file.
///
/// Prefers `icon.ico` beside the executable. Otherwise writes `embedded` to
/// `app_data_dir/icon.ico` (skipping the write when identical bytes are
/// already there). Returns `None` when neither source exists.
///
/// # Errors
/// Returns [`AssetError::Io`] when the cached copy cannot be written.
pub fn resolve_icon_path(
    embedded: Option<&[u8]>,
    executable_dir: &Path,
    app_data_dir: &Path,
) -> Result<Option<PathBuf>, AssetError> {
    let beside_exe = executable_dir.join(ICON_FILE_NAME);
    if beside_exe.is_file() {
        return Ok(Some(beside_exe));
    }

    let Some(bytes) = embedded else {
        return Ok(None);
    };

    let cached = app_data_dir.join(ICON_FILE_NAME);
    if fs::read(&cached).is_ok_and(|existing| existing == bytes) {
        return Ok(Some(cached));
    }

    fs::create_dir_all(app_data_dir).map_err(|source| AssetError::io(app_data_dir, source))?;
    fs::write(&cached, bytes).map_err(|source| AssetError::io(&cached, source))?;
    Ok(Some(cached))
}

/// Errors raised while staging assets.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Platform has no local application data directory.
    #[error("no local application data directory is available")]
    NoDataDir,
    /// Executable location could not be resolved.
    #[error("unable to resolve the executable directory")]
    NoExecutableDir,
    /// Embedded archive is unreadable or an entry failed to extract.
    #[error("asset archive error: {0}")]
    Archive(#[from] ZipError),
    /// Filesystem operation failed.
    #[error("asset io error at '{}': {source}", .path.display())]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

impl AssetError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for marker handling and icon caching.

    use super::*;

    #[test]
    fn marker_is_trimmed_when_read() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(dir.path().join(VERSION_MARKER_FILE), "build-7\r\n").expect("marker write");
        assert_eq!(read_version_marker(dir.path()).as_deref(), Some("build-7"));
        assert!(marker_matches(dir.path(), "build-7"));
        assert!(!marker_matches(dir.path(), "build-8"));
    }

    #[test]
    fn missing_marker_never_matches() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        assert_eq!(read_version_marker(dir.path()), None);
        assert!(!marker_matches(&dir.path().join("absent"), "anything"));
    }

    #[test]
    fn unpackaged_run_returns_sibling_dir_without_io() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let target = dir.path().join("target");
        let stager = AssetStager::new(None, &target, dir.path().join("wwwroot"));
        let staged = stager.resolve_asset_root().expect("unpackaged resolve");
        assert_eq!(staged.outcome, StageOutcome::Unpackaged);
        assert_eq!(staged.root, dir.path().join("wwwroot"));
        assert!(!target.exists());
    }

    #[test]
    fn icon_beside_executable_wins() {
        let exe_dir = tempfile::tempdir().expect("tempdir should be created");
        let data_dir = tempfile::tempdir().expect("tempdir should be created");
        fs::write(exe_dir.path().join(ICON_FILE_NAME), b"local").expect("icon write");

        let path = resolve_icon_path(Some(b"embedded"), exe_dir.path(), data_dir.path())
            .expect("icon resolve");
        assert_eq!(path, Some(exe_dir.path().join(ICON_FILE_NAME)));
        assert!(!data_dir.path().join(ICON_FILE_NAME).exists());
    }

    #[test]
    fn embedded_icon_is_cached_in_data_dir() {
        let exe_dir = tempfile::tempdir().expect("tempdir should be created");
        let data_dir = tempfile::tempdir().expect("tempdir should be created");
        let app_dir = data_dir.path().join(APP_DATA_DIR_NAME);

        let path = resolve_icon_path(Some(b"embedded"), exe_dir.path(), &app_dir)
            .expect("icon resolve")
            .expect("embedded icon should produce a path");
        assert_eq!(fs::read(&path).expect("cached icon read"), b"embedded");
        assert_eq!(
            resolve_icon_path(None, exe_dir.path(), &app_dir).expect("icon resolve"),
            None
        );
    }
}
