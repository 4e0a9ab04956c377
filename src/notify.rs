//! User notification seam.

use tracing::info;

/// Fire-and-forget toast sink.
///
/// Implementations must not block and must not fail loudly; a notification
/// with no UI attached is simply dropped.
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str);
}

/// Notifier that records toasts to the log, for headless operation.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, message: &str) {
        info!(title, message, "notification");
    }
}
