//! Append-only activity log.
//!
//! Every sort attempt leaves one line in `LOGS/file_sorter.log`:
//!
//! ```text
//! 2026-10-16 09:41:07,215 - Moved: /home/me/Downloads/a.png → /home/me/Sorted/Images/a.png
//! 2026-10-16 09:41:09,002 - Failed to move /home/me/Downloads/b.iso: failed to move to ...
//! ```
//!
//! Entries are mirrored to `tracing` at debug level under the
//! `somesort::activity` target.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Process-wide, line-oriented text log shared by every adapter.
#[derive(Debug)]
pub struct ActivityLog {
    path: Option<PathBuf>,
    file: Option<Mutex<File>>,
}

impl ActivityLog {
    /// Opens (or creates) the log file in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            file: Some(Mutex::new(file)),
        })
    }

    /// A log that only forwards to `tracing`.
    pub fn tracing_only() -> Self {
        Self {
            path: None,
            file: None,
        }
    }

    /// Location of the log file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: &str) {
        tracing::debug!(target: "somesort::activity", "{message}");
        self.append(message);
    }

    pub fn error(&self, message: &str) {
        tracing::debug!(target: "somesort::activity", failed = true, "{message}");
        self.append(message);
    }

    /// Records a successful move.
    pub fn moved(&self, source: &Path, destination: &Path) {
        self.info(&format!(
            "Moved: {} → {}",
            source.display(),
            destination.display()
        ));
    }

    /// Records a failed move.
    pub fn failed(&self, source: &Path, error: &dyn std::fmt::Display) {
        self.error(&format!("Failed to move {}: {}", source.display(), error));
    }

    fn append(&self, message: &str) {
        let Some(file) = &self.file else {
            return;
        };

        let line = format_line(&chrono::Local::now(), message);
        let mut file = file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = file.write_all(line.as_bytes()) {
            // Losing a log line must never abort a sort.
            tracing::warn!(error = %e, "could not append to activity log");
        }
    }
}

fn format_line<Tz>(timestamp: &chrono::DateTime<Tz>, message: &str) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{} - {}\n", timestamp.format(TIMESTAMP_FORMAT), message)
}
