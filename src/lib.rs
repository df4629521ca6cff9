//! somesort - sorts files into category folders by extension
//!
//! This library classifies files by their final extension, moves them into
//! `<destination>/<Category>/` folders, records every move in a flat activity
//! log, and drives the sorter from dropped paths or watched folders.

pub mod activity_log;
pub mod batch;
pub mod cli;
pub mod config;
pub mod destination;
pub mod error;
pub mod file_category;
pub mod file_organizer;
pub mod install;
pub mod interactive;
pub mod output;
pub mod session;
pub mod status;
pub mod watcher;

pub use activity_log::ActivityLog;
pub use batch::{BatchReport, sort_batch};
pub use config::{CompiledFilters, ConfigError, ConflictPolicy, SortConfig, WatchPolicy};
pub use destination::{DestinationReader, SharedDestination};
pub use error::{InstallError, SessionError, SortError, SortResult, WatchError};
pub use file_category::{Category, CategoryTable, classify};
pub use file_organizer::{SortedFile, Sorter};
pub use install::Installation;
pub use session::Session;
pub use status::{StatusLine, StatusSink};
pub use watcher::{WatchService, WatchState};

pub use cli::{Cli, run};
