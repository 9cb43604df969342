//! Native file dialogs offloaded to a small worker pool so the window's event
//! loop never blocks on them.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde::Deserialize;
use tracing::warn;

/// Worker threads serving dialog requests.
pub const DIALOG_WORKERS: usize = 2;

/// Extension appended to saved paths that have none.
pub const DEFAULT_SAVE_EXTENSION: &str = ".dat";

/// Named group of file extensions offered by a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogFilter {
    /// Label shown in the dialog.
    pub name: String,
    /// Extensions, with or without a leading `*.` / `.`.
    pub extensions: Vec<String>,
}

impl DialogFilter {
    /// Extensions without wildcard or dot prefixes.
    pub fn bare_extensions(&self) -> Vec<String> {
        self.extensions
            .iter()
            .map(|extension| {
                extension
                    .trim_start_matches('*')
                    .trim_start_matches('.')
                    .to_string()
            })
            .filter(|extension| !extension.is_empty())
            .collect()
    }
}

/// Parameters of an open-file dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenDialogRequest {
    /// Window title.
    pub title: String,
    /// Initial directory; empty means platform default.
    pub start_dir: PathBuf,
    /// Offered filters.
    pub filters: Vec<DialogFilter>,
}

/// Parameters of a save-file dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDialogRequest {
    /// Window title.
    pub title: String,
    /// Initial directory; empty means platform default.
    pub start_dir: PathBuf,
    /// Extension appended when the chosen name has none.
    pub default_extension: String,
    /// Offered filters.
    pub filters: Vec<DialogFilter>,
}

/// Platform dialog capability. Implementations block until the user answers.
pub trait DialogBackend: Send + Sync {
    /// Shows a save dialog; `None` when cancelled.
    fn save_file(&self, request: &SaveDialogRequest) -> Option<PathBuf>;

    /// Shows an open dialog; `None` when cancelled.
    fn open_file(&self, request: &OpenDialogRequest) -> Option<PathBuf>;
}

/// Turns a caller-supplied default path into a starting directory.
///
/// Blank input yields an empty path; a path with an extension is treated as
/// a file and replaced by its parent directory.
pub fn normalize_start_dir(path: &str) -> PathBuf {
    if path.trim().is_empty() {
        return PathBuf::new();
    }
    let path = Path::new(path);
    if path.extension().is_some() {
        return path.parent().map(Path::to_path_buf).unwrap_or_default();
    }
    path.to_path_buf()
}

/// Appends `extension` to `path` when the file name has none.
pub fn apply_default_extension(path: PathBuf, extension: &str) -> PathBuf {
    if extension.is_empty() || path.extension().is_some() {
        return path;
    }
    let mut raw = path.into_os_string();
    raw.push(extension);
    PathBuf::from(raw)
}

/// Result of a dialog that may still be open.
#[derive(Debug)]
pub struct PendingDialog {
    receiver: Receiver<Option<PathBuf>>,
}

impl PendingDialog {
    fn resolved(path: Option<PathBuf>) -> Self {
        let (sender, receiver) = mpsc::channel();
        let _ = sender.send(path);
        Self { receiver }
    }

    /// Blocks until the dialog closes. `None` when cancelled or the worker
    /// went away.
    pub fn wait(self) -> Option<PathBuf> {
        self.receiver.recv().ok().flatten()
    }
}

type Job = Box<dyn FnOnce() + Send + 'static>;

struct WorkerPool {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    fn new(size: usize) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let workers = (0..size)
            .filter_map(|index| {
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("dialog-worker-{index}"))
                    .spawn(move || {
                        loop {
                            let job = match receiver.lock() {
                                Ok(guard) => guard.recv(),
                                Err(_) => break,
                            };
                            match job {
                                Ok(job) => job(),
                                Err(_) => break,
                            }
                        }
                    })
                    .map_err(|error| warn!(%error, "failed to spawn dialog worker"))
                    .ok()
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers,
        }
    }

    fn execute(&self, job: Job) -> bool {
        let Ok(guard) = self.sender.lock() else {
            return false;
        };
        guard
            .as_ref()
            .is_some_and(|sender| sender.send(job).is_ok())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

/// File dialog front-end used by the UI.
pub struct FileDialogService {
    backend: Option<Arc<dyn DialogBackend>>,
    pool: WorkerPool,
}

impl FileDialogService {
    /// Creates the service. Without a backend every request resolves to
    /// `None` immediately.
    pub fn new(backend: Option<Arc<dyn DialogBackend>>) -> Self {
        let workers = if backend.is_some() { DIALOG_WORKERS } else { 0 };
        Self {
            backend,
            pool: WorkerPool::new(workers),
        }
    }

    /// Whether native dialogs can be shown.
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Shows a save dialog on the pool and calls `on_done` with the result.
    pub fn save_file_then(
        &self,
        title: &str,
        default_path: &str,
        default_extension: &str,
        filters: Vec<DialogFilter>,
        on_done: impl FnOnce(Option<PathBuf>) + Send + 'static,
    ) {
        let request = SaveDialogRequest {
            title: title.to_string(),
            start_dir: normalize_start_dir(default_path),
            default_extension: default_extension.to_string(),
            filters,
        };
        self.submit(on_done, move |backend| {
            backend
                .save_file(&request)
                .map(|path| apply_default_extension(path, &request.default_extension))
        });
    }

    /// Shows an open dialog on the pool and calls `on_done` with the result.
    pub fn open_file_then(
        &self,
        title: &str,
        default_path: &str,
        filters: Vec<DialogFilter>,
        on_done: impl FnOnce(Option<PathBuf>) + Send + 'static,
    ) {
        let request = OpenDialogRequest {
            title: title.to_string(),
            start_dir: normalize_start_dir(default_path),
            filters,
        };
        self.submit(on_done, move |backend| backend.open_file(&request));
    }

    /// Shows a save dialog and returns a handle to its result.
    pub fn show_save_file(
        &self,
        title: &str,
        default_path: &str,
        default_extension: &str,
        filters: Vec<DialogFilter>,
    ) -> PendingDialog {
        if !self.is_available() {
            return PendingDialog::resolved(None);
        }
        let (sender, receiver) = mpsc::channel();
        self.save_file_then(title, default_path, default_extension, filters, move |path| {
            let _ = sender.send(path);
        });
        PendingDialog { receiver }
    }

    /// Shows an open dialog and returns a handle to its result.
    pub fn show_open_file(
        &self,
        title: &str,
        default_path: &str,
        filters: Vec<DialogFilter>,
    ) -> PendingDialog {
        if !self.is_available() {
            return PendingDialog::resolved(None);
        }
        let (sender, receiver) = mpsc::channel();
        self.open_file_then(title, default_path, filters, move |path| {
            let _ = sender.send(path);
        });
        PendingDialog { receiver }
    }

    fn submit(
        &self,
        on_done: impl FnOnce(Option<PathBuf>) + Send + 'static,
        show: impl FnOnce(&dyn DialogBackend) -> Option<PathBuf> + Send + 'static,
    ) {
        let Some(backend) = self.backend.clone() else {
            on_done(None);
            return;
        };

        // The job owns `on_done`; if it is rejected the pool is shutting down
        // and the closure is dropped, which closes any pending channel.
        let job: Job = Box::new(move || on_done(show(backend.as_ref())));
        if !self.pool.execute(job) {
            warn!("dialog pool unavailable, request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_dir_uses_parent_of_file_paths() {
        assert_eq!(normalize_start_dir(""), PathBuf::new());
        assert_eq!(normalize_start_dir("  "), PathBuf::new());
        assert_eq!(
            normalize_start_dir("/home/user/wallet.dat"),
            PathBuf::from("/home/user")
        );
        assert_eq!(normalize_start_dir("/home/user"), PathBuf::from("/home/user"));
        assert_eq!(normalize_start_dir("seed.txt"), PathBuf::new());
    }

    #[test]
    fn default_extension_only_applies_when_missing() {
        assert_eq!(
            apply_default_extension(PathBuf::from("/tmp/vault"), ".dat"),
            PathBuf::from("/tmp/vault.dat")
        );
        assert_eq!(
            apply_default_extension(PathBuf::from("/tmp/vault.bin"), ".dat"),
            PathBuf::from("/tmp/vault.bin")
        );
        assert_eq!(
            apply_default_extension(PathBuf::from("/tmp/vault"), ""),
            PathBuf::from("/tmp/vault")
        );
    }

    #[test]
    fn filter_extensions_are_stripped() {
        let filter = DialogFilter {
            name: "Vault".to_string(),
            extensions: vec!["*.dat".to_string(), ".bin".to_string(), "qv".to_string()],
        };
        assert_eq!(filter.bare_extensions(), vec!["dat", "bin", "qv"]);
    }
}
