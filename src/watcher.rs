//! Sorting files as they appear in watched folders.
//!
//! Each watched folder gets a [`WatchHandle`]: a non-recursive `notify`
//! watcher whose callback only pushes creation events onto a channel, and a
//! worker thread that drains the channel. The worker holds every new path for
//! a grace period (so the writer can finish) and then sorts it once.
//!
//! ```text
//! notify callback ──Created(path)──▶ channel ──▶ worker
//!                                                 │ wait until created + grace
//!                                                 ▼
//!                                        Sorter::sort_file(path, destination)
//! ```
//!
//! [`WatchService`] owns the handles and applies the [`WatchPolicy`] when a
//! folder is added while others are being watched.

use crate::config::WatchPolicy;
use crate::destination::DestinationReader;
use crate::error::WatchError;
use crate::file_organizer::Sorter;
use crate::status::StatusSink;
use notify::event::CreateKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Everything a watch worker needs to sort a file.
#[derive(Clone)]
pub struct WatchContext {
    pub sorter: Arc<Sorter>,
    pub destination: DestinationReader,
    pub status: Arc<dyn StatusSink>,
    pub grace_period: Duration,
}

impl WatchContext {
    /// Sorts one path that showed up in a watched folder.
    ///
    /// Failures are already in the activity log; nobody is notified.
    fn process(&self, path: &Path) {
        if !self.sorter.accepts(path) {
            tracing::debug!(path = %path.display(), "excluded by filters");
            return;
        }

        match self.sorter.sort_file(path, &self.destination.get()) {
            Ok(sorted) => self.status.file_sorted(&sorted.file_name),
            Err(e) if e.is_silent() => {
                tracing::debug!(path = %path.display(), "gone before sorting");
            }
            Err(_) => {}
        }
    }
}

#[derive(Debug)]
enum WatchMessage {
    Created(PathBuf),
    Shutdown,
}

/// A running watcher for one folder.
///
/// Dropping the handle stops the watcher and joins its worker.
pub struct WatchHandle {
    dir: PathBuf,
    watcher: Option<RecommendedWatcher>,
    sender: Sender<WatchMessage>,
    worker: Option<JoinHandle<()>>,
    context: WatchContext,
}

impl WatchHandle {
    /// Starts watching `dir` (non-recursively).
    pub fn start(dir: &Path, context: WatchContext) -> Result<Self, WatchError> {
        if !dir.is_dir() {
            return Err(WatchError::NotADirectory(dir.to_path_buf()));
        }

        let (sender, receiver) = mpsc::channel();

        let events = sender.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => forward_created(&events, event),
                Err(e) => tracing::warn!(error = %e, "watch error"),
            }
        })
        .map_err(|source| WatchError::Notify {
            path: dir.to_path_buf(),
            source,
        })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Notify {
                path: dir.to_path_buf(),
                source,
            })?;

        let worker_context = context.clone();
        let worker = thread::Builder::new()
            .name("somesort-watch".to_string())
            .spawn(move || run_worker(receiver, worker_context))
            .map_err(WatchError::Spawn)?;

        context
            .sorter
            .log()
            .info(&format!("Started watching folder: {}", dir.display()));

        Ok(Self {
            dir: dir.to_path_buf(),
            watcher: Some(watcher),
            sender,
            worker: Some(worker),
            context,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stops the watcher. Files still inside their grace period are left alone.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let Some(mut watcher) = self.watcher.take() else {
            return;
        };

        if let Err(e) = watcher.unwatch(&self.dir) {
            tracing::debug!(error = %e, "unwatch failed");
        }
        drop(watcher);

        // The worker may already be gone; nothing to do then.
        let _ = self.sender.send(WatchMessage::Shutdown);
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::warn!(dir = %self.dir.display(), "watch worker panicked");
        }

        self.context
            .sorter
            .log()
            .info(&format!("Stopped watching folder: {}", self.dir.display()));
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchHandle")
            .field("dir", &self.dir)
            .field("running", &self.watcher.is_some())
            .finish()
    }
}

fn forward_created(sender: &Sender<WatchMessage>, event: Event) {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => {}
        EventKind::Create(_) => {
            for path in event.paths {
                // Send only fails once the worker has shut down.
                let _ = sender.send(WatchMessage::Created(path));
            }
        }
        _ => {}
    }
}

/// Worker loop: queue created paths, sort each once its grace period is over.
fn run_worker(receiver: Receiver<WatchMessage>, context: WatchContext) {
    let mut pending: VecDeque<(Instant, PathBuf)> = VecDeque::new();

    loop {
        let next_due = pending.front().map(|(due, _)| *due);
        let message = match next_due {
            Some(due) => {
                let now = Instant::now();
                if due <= now {
                    if let Some((_, path)) = pending.pop_front() {
                        context.process(&path);
                    }
                    continue;
                }
                receiver.recv_timeout(due - now)
            }
            None => receiver
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
        };

        match message {
            Ok(WatchMessage::Created(path)) => {
                // A single grace period applies, so the queue stays ordered by due time.
                if !pending.iter().any(|(_, queued)| *queued == path) {
                    pending.push_back((Instant::now() + context.grace_period, path));
                }
            }
            Ok(WatchMessage::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    if !pending.is_empty() {
        tracing::debug!(count = pending.len(), "dropping files still in grace period");
    }
}

/// Whether any folder is being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching(Vec<PathBuf>),
}

/// Owns every running watcher.
#[derive(Debug)]
pub struct WatchService {
    context: WatchContext,
    policy: WatchPolicy,
    handles: Vec<WatchHandle>,
}

impl WatchService {
    pub fn new(context: WatchContext, policy: WatchPolicy) -> Self {
        Self {
            context,
            policy,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> WatchState {
        if self.handles.is_empty() {
            WatchState::Idle
        } else {
            WatchState::Watching(self.watched())
        }
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.handles
            .iter()
            .map(|handle| handle.dir().to_path_buf())
            .collect()
    }

    /// Starts watching `dir`.
    ///
    /// Under [`WatchPolicy::Replace`] the previous watchers are stopped once
    /// the new one is running; under [`WatchPolicy::Add`] they keep running.
    pub fn watch(&mut self, dir: &Path) -> Result<(), WatchError> {
        let dir = dir
            .canonicalize()
            .map_err(|_| WatchError::NotADirectory(dir.to_path_buf()))?;

        if self.handles.iter().any(|handle| handle.dir() == dir) {
            return Err(WatchError::AlreadyWatching(dir));
        }

        let handle = WatchHandle::start(&dir, self.context.clone())?;

        if self.policy == WatchPolicy::Replace {
            self.stop_all();
        }
        self.handles.push(handle);
        Ok(())
    }

    /// Stops the watcher for `dir`. Returns false if it was not watched.
    pub fn unwatch(&mut self, dir: &Path) -> bool {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        match self.handles.iter().position(|handle| handle.dir() == dir) {
            Some(index) => {
                self.handles.remove(index).stop();
                true
            }
            None => false,
        }
    }

    pub fn stop_all(&mut self) {
        for handle in self.handles.drain(..) {
            handle.stop();
        }
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        self.stop_all();
    }
}

impl std::fmt::Debug for WatchContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchContext")
            .field("destination", &self.destination)
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}
