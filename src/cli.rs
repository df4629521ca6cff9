//! Command-line interface for somesort.
//!
//! This module handles:
//! - Argument parsing (clap)
//! - Resolving the installation folder and configuration overrides
//! - One-shot sorting, with an optional dry run
//! - Starting the interactive session, optionally with watched folders

use crate::activity_log::ActivityLog;
use crate::config::{SortConfig, WatchPolicy};
use crate::file_category::{self, CategoryTable};
use crate::file_organizer::Sorter;
use crate::install::Installation;
use crate::interactive::run_interactive;
use crate::output::{ConsoleStatus, OutputFormatter};
use crate::session::Session;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "somesort",
    version,
    about = "Sort files into category folders by extension"
)]
pub struct Cli {
    /// Configuration file (defaults to ./.somesortrc.toml, then the user config)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Folder in which "SomeSort Main" is created (defaults to the home folder)
    #[arg(long, global = true, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the interactive drop session (default)
    Run {
        /// Destination root for sorted files
        #[arg(short, long, value_name = "DIR")]
        dest: Option<PathBuf>,
    },

    /// Create the installation folder and exit
    Install,

    /// Sort the given files once
    Sort {
        #[arg(required = true, value_name = "FILES")]
        files: Vec<PathBuf>,

        /// Destination root for sorted files
        #[arg(short, long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Show where files would go without moving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Watch folders and sort new files, then continue interactively
    Watch {
        #[arg(required = true, value_name = "DIRS")]
        dirs: Vec<PathBuf>,

        /// Destination root for sorted files
        #[arg(short, long, value_name = "DIR")]
        dest: Option<PathBuf>,

        /// Watching another folder later stops the previous ones
        #[arg(long)]
        replace: bool,
    },

    /// Print the category of each file name
    Classify {
        #[arg(required = true, value_name = "NAMES")]
        names: Vec<String>,
    },
}

/// Runs the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        install_dir,
        command,
        ..
    } = cli;

    let mut config =
        SortConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    match command.unwrap_or(Command::Run { dest: None }) {
        Command::Classify { names } => {
            classify_names(&names);
            Ok(())
        }
        Command::Install => {
            let parent = install_parent(install_dir.as_deref(), &config)?;
            let installation = Installation::setup(&parent)
                .with_context(|| format!("Failed to set up {}", parent.display()))?;
            OutputFormatter::success(&format!(
                "Installed to {}",
                installation.root().display()
            ));
            OutputFormatter::plain(&format!("  Logs: {}", installation.log_file().display()));
            OutputFormatter::plain(&format!(
                "  Sorted files: {}",
                installation.sorted_dir().display()
            ));
            Ok(())
        }
        Command::Sort {
            files,
            dest,
            dry_run,
        } => {
            apply_destination(&mut config, dest);
            let parent = install_parent(install_dir.as_deref(), &config)?;
            if dry_run {
                dry_run_sort(&files, &config, &parent)
            } else {
                sort_files(&files, &config, &parent)
            }
        }
        Command::Run { dest } => {
            apply_destination(&mut config, dest);
            let parent = install_parent(install_dir.as_deref(), &config)?;
            interactive_session(&config, &parent, &[])
        }
        Command::Watch {
            dirs,
            dest,
            replace,
        } => {
            apply_destination(&mut config, dest);
            if replace {
                config.sorter.watch_policy = WatchPolicy::Replace;
            }
            let parent = install_parent(install_dir.as_deref(), &config)?;
            interactive_session(&config, &parent, &dirs)
        }
    }
}

/// `--install-dir`, then `sorter.install_dir`, then the home folder.
fn install_parent(flag: Option<&Path>, config: &SortConfig) -> Result<PathBuf> {
    if let Some(dir) = flag.or(config.sorter.install_dir.as_deref()) {
        return Ok(dir.to_path_buf());
    }

    match dirs::home_dir() {
        Some(home) => Ok(home),
        None => bail!("Could not determine the home folder; pass --install-dir"),
    }
}

fn apply_destination(config: &mut SortConfig, dest: Option<PathBuf>) {
    if dest.is_some() {
        config.sorter.destination = dest;
    }
}

fn classify_names(names: &[String]) {
    for name in names {
        let category = file_category::classify(name);
        let extension = file_category::extension_of(name);
        OutputFormatter::plain(&format!(
            "{} [{}] → {}/",
            name,
            if extension.is_empty() { "-" } else { extension.as_str() },
            category.dir_name()
        ));
    }
}

fn sort_files(files: &[PathBuf], config: &SortConfig, parent: &Path) -> Result<()> {
    let console = Arc::new(ConsoleStatus::new());
    let session = Session::start(config, parent, console.clone())
        .context("Failed to start session")?;

    OutputFormatter::info(&format!(
        "Sorting {} into {}",
        plural_files(files.len()),
        session.destination().display()
    ));

    if files.len() > 1 {
        console.start_progress(files.len() as u64);
    }
    let report = session.drop_files(files, &*console);
    if !report.moved.is_empty() {
        OutputFormatter::summary_table(&report.category_counts(), report.moved.len());
    }
    session.shutdown();
    Ok(())
}

/// Prints where each file would go. Nothing is created, moved or logged.
fn dry_run_sort(files: &[PathBuf], config: &SortConfig, parent: &Path) -> Result<()> {
    let filters = config
        .filters
        .compile()
        .context("Error compiling filters")?;
    let sorter = Sorter::new(
        CategoryTable::standard(),
        filters,
        config.sorter.on_conflict,
        Arc::new(ActivityLog::tracing_only()),
    );
    let destination_root = match &config.sorter.destination {
        Some(dir) => dir.clone(),
        None => Installation::locate(parent).sorted_dir(),
    };

    OutputFormatter::dry_run_notice(&format!(
        "Files would be sorted into {}",
        destination_root.display()
    ));

    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut planned = 0;

    for file in files {
        if !file.is_file() {
            OutputFormatter::warning(&format!("Skipping {}: not a file", file.display()));
            continue;
        }
        if !sorter.accepts(file) {
            OutputFormatter::plain(&format!(" - {} (excluded by filters)", file.display()));
            continue;
        }

        match sorter.plan(file, &destination_root) {
            Ok(plan) => {
                OutputFormatter::plain(&format!(" - {}", file.display()));
                OutputFormatter::plain(&format!("   → Would move to {}/", plan.category_dir));
                *category_counts.entry(plan.category_dir).or_insert(0) += 1;
                planned += 1;
            }
            Err(e) => OutputFormatter::error(&e.to_string()),
        }
    }

    if planned == 0 {
        OutputFormatter::warning("No files to sort.");
        return Ok(());
    }

    OutputFormatter::summary_table(&category_counts, planned);
    OutputFormatter::success("Dry run complete. No files were modified.");
    Ok(())
}

fn interactive_session(config: &SortConfig, parent: &Path, watch_dirs: &[PathBuf]) -> Result<()> {
    let console = Arc::new(ConsoleStatus::new());
    let mut session = Session::start(config, parent, console.clone())
        .context("Failed to start session")?;

    for dir in watch_dirs {
        session
            .watch(dir)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;
    }

    let stdin = io::stdin();
    run_interactive(&mut session, &console, stdin.lock()).context("Failed to read input")?;

    session.shutdown();
    OutputFormatter::plain("Bye!");
    Ok(())
}

fn plural_files(count: usize) -> String {
    if count == 1 {
        "1 file".to_string()
    } else {
        format!("{count} files")
    }
}
