//! Reporter trait for dependency injection
//!
//! This trait allows core logic to report progress and status without
//! being coupled to a specific terminal implementation.

pub trait Reporter: Send + Sync {
    /// Indicates a new pipeline phase has started (e.g. "Resolving", "Downloading").
    fn phase(&self, title: &str);

    /// Updates the progress of a download.
    fn downloading(&self, current: u64, total: Option<u64>);

    /// Updates the progress of an extraction (entries written so far).
    fn extracting(&self, current: u64, total: Option<u64>);

    /// Marks the run as successfully completed.
    fn done(&self, detail: &str);

    /// Marks the current phase as failed with a specific reason.
    fn failed(&self, reason: &str);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn phase(&self, title: &str) {
        (**self).phase(title);
    }
    fn downloading(&self, current: u64, total: Option<u64>) {
        (**self).downloading(current, total);
    }
    fn extracting(&self, current: u64, total: Option<u64>) {
        (**self).extracting(current, total);
    }
    fn done(&self, detail: &str) {
        (**self).done(detail);
    }
    fn failed(&self, reason: &str) {
        (**self).failed(reason);
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., `--quiet`, testing).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn phase(&self, _: &str) {}
    fn downloading(&self, _: u64, _: Option<u64>) {}
    fn extracting(&self, _: u64, _: Option<u64>) {}
    fn done(&self, _: &str) {}
    fn failed(&self, _: &str) {}
    fn info(&self, _: &str) {}
    fn warning(&self, _: &str) {}
}
