//! A running SomeSort session.
//!
//! [`Session`] is the single owner of the runtime state: the installation
//! folder, the shared [`Sorter`], the destination root and the running
//! watchers. Both the drop path ([`Session::drop_files`]) and the watch path
//! read the destination through the same [`SharedDestination`], so a change
//! made with [`Session::set_destination`] applies to files sorted afterwards
//! by either one.

use crate::activity_log::ActivityLog;
use crate::batch::{BatchReport, sort_batch};
use crate::config::SortConfig;
use crate::destination::SharedDestination;
use crate::error::{InstallError, SessionError, WatchError};
use crate::file_category::CategoryTable;
use crate::file_organizer::Sorter;
use crate::install::Installation;
use crate::status::StatusSink;
use crate::watcher::{WatchContext, WatchService, WatchState};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug)]
pub struct Session {
    installation: Installation,
    sorter: Arc<Sorter>,
    destination: SharedDestination,
    watchers: WatchService,
}

impl Session {
    /// Sets up the installation under `install_parent` and opens its log.
    ///
    /// The destination defaults to the installation's `SortedFiles/` folder
    /// unless the configuration names one.
    pub fn start(
        config: &SortConfig,
        install_parent: &Path,
        status: Arc<dyn StatusSink>,
    ) -> Result<Self, SessionError> {
        let installation = Installation::setup(install_parent)?;

        let log_path = installation.log_file();
        let log = ActivityLog::open(&log_path).map_err(|source| InstallError::OpenLog {
            path: log_path.clone(),
            source,
        })?;

        let filters = config.filters.compile()?;
        let sorter = Arc::new(Sorter::new(
            CategoryTable::standard(),
            filters,
            config.sorter.on_conflict,
            Arc::new(log),
        ));

        let initial = match &config.sorter.destination {
            Some(dir) => dir.clone(),
            None => installation.sorted_dir(),
        };
        let destination = SharedDestination::new(ensure_dir(&initial)?);

        let context = WatchContext {
            sorter: Arc::clone(&sorter),
            destination: destination.reader(),
            status,
            grace_period: config.sorter.grace_period(),
        };
        let watchers = WatchService::new(context, config.sorter.watch_policy);

        tracing::debug!(
            root = %installation.root().display(),
            destination = %destination.get().display(),
            "session started"
        );

        Ok(Self {
            installation,
            sorter,
            destination,
            watchers,
        })
    }

    pub fn installation(&self) -> &Installation {
        &self.installation
    }

    pub fn sorter(&self) -> &Sorter {
        &self.sorter
    }

    pub fn destination(&self) -> PathBuf {
        self.destination.get()
    }

    /// Points both the drop and the watch path at `dir`, creating it if needed.
    pub fn set_destination(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        let dir = ensure_dir(dir)?;
        self.destination.set(dir.clone());
        Ok(dir)
    }

    /// Sorts a batch of dropped paths into the current destination.
    pub fn drop_files<P: AsRef<Path>>(&self, paths: &[P], status: &dyn StatusSink) -> BatchReport {
        sort_batch(&self.sorter, paths, &self.destination.get(), status)
    }

    pub fn watch(&mut self, dir: &Path) -> Result<(), WatchError> {
        self.watchers.watch(dir)
    }

    pub fn unwatch(&mut self, dir: &Path) -> bool {
        self.watchers.unwatch(dir)
    }

    pub fn unwatch_all(&mut self) {
        self.watchers.stop_all();
    }

    pub fn watch_state(&self) -> WatchState {
        self.watchers.state()
    }

    /// Stops every watcher. Pending files that have not finished their grace
    /// period are left where they are.
    pub fn shutdown(mut self) {
        self.watchers.stop_all();
        tracing::debug!("session closed");
    }
}

fn ensure_dir(dir: &Path) -> Result<PathBuf, SessionError> {
    fs::create_dir_all(dir)
        .and_then(|_| dir.canonicalize())
        .map_err(|source| SessionError::Destination {
            path: dir.to_path_buf(),
            source,
        })
}
