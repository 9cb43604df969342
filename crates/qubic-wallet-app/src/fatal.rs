//! Process-wide reporting of uncaught panics in desktop mode.

use std::panic;

use tracing::error;

/// Title of the modal shown for an uncaught panic.
pub const FATAL_TITLE: &str = "Fatal exception";

/// Installs a panic hook that logs the panic, hands `(title, message)` to
/// `present`, then runs the previously installed hook.
///
/// `present` must not panic itself; a panic inside a panic hook aborts.
pub fn install_fatal_hook<F>(present: F)
where
    F: Fn(&str, &str) + Send + Sync + 'static,
{
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let message = info.to_string();
        error!(%message, "fatal exception");
        present(FATAL_TITLE, &message);
        previous(info);
    }));
}
