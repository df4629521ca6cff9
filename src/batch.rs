//! Sorting a batch of dropped files.
//!
//! Items are handled in the order they were dropped. A failing item never
//! stops the rest of the batch and nothing is rolled back.

use crate::file_organizer::{SortedFile, Sorter};
use crate::status::StatusSink;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Outcome of one drop.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub moved: Vec<SortedFile>,
    /// Paths that were missing, not regular files, or filtered out.
    pub skipped: Vec<PathBuf>,
    /// Paths that failed, with the error message.
    pub failed: Vec<(PathBuf, String)>,
}

impl BatchReport {
    /// Name of the last file moved in this batch.
    pub fn last_sorted(&self) -> Option<&str> {
        self.moved.last().map(|sorted| sorted.file_name.as_str())
    }

    pub fn total(&self) -> usize {
        self.moved.len() + self.skipped.len() + self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of moved files per category directory.
    pub fn category_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for sorted in &self.moved {
            *counts
                .entry(sorted.category.dir_name().to_string())
                .or_insert(0) += 1;
        }
        counts
    }
}

/// Sorts every path in `paths` into `destination_root`.
///
/// Failures are reported through [`StatusSink::sort_failed`] as they happen.
/// After the batch the last moved file (if any) is reported through
/// [`StatusSink::file_sorted`], followed by one [`StatusSink::batch_done`].
pub fn sort_batch<P: AsRef<Path>>(
    sorter: &Sorter,
    paths: &[P],
    destination_root: &Path,
    status: &dyn StatusSink,
) -> BatchReport {
    let mut report = BatchReport::default();

    for path in paths {
        let path = path.as_ref();

        if !sorter.accepts(path) {
            tracing::debug!(path = %path.display(), "excluded by filters");
            report.skipped.push(path.to_path_buf());
        } else {
            match sorter.sort_file(path, destination_root) {
                Ok(sorted) => report.moved.push(sorted),
                Err(e) if e.is_silent() => {
                    tracing::debug!(path = %path.display(), "not a file, skipped");
                    report.skipped.push(path.to_path_buf());
                }
                Err(e) => {
                    status.sort_failed(path, &e);
                    report.failed.push((path.to_path_buf(), e.to_string()));
                }
            }
        }

        status.item_processed(path);
    }

    if let Some(last) = report.last_sorted() {
        status.file_sorted(last);
    }
    status.batch_done(&report);

    report
}
