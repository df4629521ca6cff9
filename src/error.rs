//! Error types for sorting, installation and watching.

use std::path::PathBuf;

/// Errors that can occur while sorting a single file.
#[derive(thiserror::Error, Debug)]
pub enum SortError {
    /// The source path is not (or no longer) a regular file.
    ///
    /// Callers skip these silently; nothing is logged or moved.
    #[error("not a file: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// The source path has no file name component.
    #[error("path has no file name: {}", .0.display())]
    InvalidSource(PathBuf),

    /// Failed to create the category directory.
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file with the same name exists and the conflict policy is `reject`.
    #[error("destination already exists: {}", .0.display())]
    DestinationExists(PathBuf),

    /// The rename (or copy fallback) failed.
    #[error("failed to move to {}: {source}", .destination.display())]
    MoveFailure {
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SortError {
    /// Returns true for outcomes that are skipped without notifying anyone.
    pub fn is_silent(&self) -> bool {
        matches!(self, SortError::SourceNotFound(_))
    }
}

/// Result type for sort operations.
pub type SortResult<T> = Result<T, SortError>;

/// Errors that can occur while creating the installation layout.
#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    #[error("installation parent does not exist: {}", .0.display())]
    MissingParent(PathBuf),

    #[error("failed to create {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    WriteReadme {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open activity log {}: {source}", .path.display())]
    OpenLog {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised when starting or stopping folder watchers.
#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("already watching {}", .0.display())]
    AlreadyWatching(PathBuf),

    #[error("failed to watch {}: {source}", .path.display())]
    Notify {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to spawn watch worker: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Errors raised while starting a session or changing its settings.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Install(#[from] InstallError),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("cannot use {} as destination: {source}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
