//! Status reporting for the drop and watch adapters.

use crate::batch::BatchReport;
use crate::error::SortError;
use std::path::Path;
use std::sync::Mutex;

/// Receives sort outcomes for display.
///
/// Implementations are shared with watch workers, so they must be `Send +
/// Sync` and cheap to call.
pub trait StatusSink: Send + Sync {
    /// A file was sorted; `file_name` becomes the "last sorted" status.
    fn file_sorted(&self, file_name: &str);

    /// A dropped file could not be sorted. Not called for watched folders.
    fn sort_failed(&self, source: &Path, error: &SortError);

    /// A drop batch finished.
    fn batch_done(&self, report: &BatchReport);

    /// One item of a batch was handled, whatever the outcome.
    fn item_processed(&self, _source: &Path) {}
}

/// The "Last sorted file" line.
#[derive(Debug, Default)]
pub struct StatusLine {
    last_sorted: Mutex<Option<String>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_sorted(&self) -> Option<String> {
        self.last_sorted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn set(&self, file_name: &str) {
        *self
            .last_sorted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(file_name.to_string());
    }

    /// Text shown to the user, e.g. `Last sorted file: photo.JPG`.
    pub fn text(&self) -> String {
        format!(
            "Last sorted file: {}",
            self.last_sorted().as_deref().unwrap_or("None")
        )
    }
}

impl StatusSink for StatusLine {
    fn file_sorted(&self, file_name: &str) {
        self.set(file_name);
    }

    fn sort_failed(&self, _source: &Path, _error: &SortError) {}

    fn batch_done(&self, _report: &BatchReport) {}
}
