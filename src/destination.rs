//! The current destination directory.
//!
//! [`SharedDestination`] is held by exactly one owner (the session), which is
//! the only place the destination can change. Adapters get a
//! [`DestinationReader`] and read the value at the moment they sort a file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Owning handle; the only way to change the destination.
#[derive(Debug)]
pub struct SharedDestination {
    inner: Arc<RwLock<PathBuf>>,
}

/// Read-only handle given to the drop and watch adapters.
#[derive(Debug, Clone)]
pub struct DestinationReader {
    inner: Arc<RwLock<PathBuf>>,
}

impl SharedDestination {
    pub fn new(initial: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }

    pub fn set(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!(destination = %path.display(), "destination changed");
        *self
            .inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path;
    }

    pub fn get(&self) -> PathBuf {
        read(&self.inner)
    }

    pub fn reader(&self) -> DestinationReader {
        DestinationReader {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl DestinationReader {
    pub fn get(&self) -> PathBuf {
        read(&self.inner)
    }

    /// A reader over a fixed path, for one-shot callers without a session.
    pub fn fixed(path: &Path) -> Self {
        Self {
            inner: Arc::new(RwLock::new(path.to_path_buf())),
        }
    }
}

fn read(inner: &RwLock<PathBuf>) -> PathBuf {
    inner
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}
