//! First-run installation layout.
//!
//! ```text
//! <parent>/SomeSort Main/
//! ├── LOGS/file_sorter.log
//! ├── README/README.txt
//! └── SortedFiles/
//! ```

use crate::error::InstallError;
use std::fs;
use std::path::{Path, PathBuf};

pub const TOOL_NAME: &str = "SomeSort";
pub const LOG_FILE_NAME: &str = "file_sorter.log";

const README_TEXT: &str = "\
Thank you for using SomeSort, a lightweight tool that sorts your files for you!

Drop files onto the session (or pass them to `somesort sort`) and they are moved
into category folders under the destination directory. Watched folders are sorted
automatically as new files arrive.

Every move is recorded in LOGS/file_sorter.log.
";

/// Directories of a set-up installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    root: PathBuf,
}

impl Installation {
    /// Creates (or reuses) the installation folder under `parent`.
    ///
    /// Idempotent: existing directories are kept and the README is only
    /// written when missing.
    pub fn setup(parent: &Path) -> Result<Self, InstallError> {
        if !parent.is_dir() {
            return Err(InstallError::MissingParent(parent.to_path_buf()));
        }

        let installation = Self::locate(parent);

        for dir in [
            installation.logs_dir(),
            installation.readme_dir(),
            installation.sorted_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(|e| InstallError::CreateDir {
                path: dir.clone(),
                source: e,
            })?;
        }

        let readme = installation.readme_path();
        if !readme.is_file() {
            fs::write(&readme, README_TEXT).map_err(|e| InstallError::WriteReadme {
                path: readme.clone(),
                source: e,
            })?;
            tracing::info!(path = %readme.display(), "wrote README");
        }

        tracing::debug!(root = %installation.root.display(), "installation ready");
        Ok(installation)
    }

    /// The installation under `parent`, without touching the filesystem.
    pub fn locate(parent: &Path) -> Self {
        Self {
            root: parent.join(format!("{TOOL_NAME} Main")),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("LOGS")
    }

    pub fn readme_dir(&self) -> PathBuf {
        self.root.join("README")
    }

    pub fn readme_path(&self) -> PathBuf {
        self.readme_dir().join("README.txt")
    }

    /// Default destination root.
    pub fn sorted_dir(&self) -> PathBuf {
        self.root.join("SortedFiles")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }
}
