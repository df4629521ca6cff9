//! Console output.
//!
//! All user-facing terminal output goes through [`OutputFormatter`]: colored
//! status lines, the batch progress bar and the dry-run summary table.
//! [`ConsoleStatus`] plugs it into the adapters as a [`StatusSink`].

use crate::batch::BatchReport;
use crate::error::SortError;
use crate::status::{StatusLine, StatusSink};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Status line in dim italics, as shown under the drop area.
    pub fn status(message: &str) {
        println!("{}", message.dimmed().italic());
    }

    /// Creates a progress bar for a batch of `total` files.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use somesort::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(3);
    /// pb.inc(1);
    /// pb.finish_and_clear();
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints files per category with a total row.
    pub fn summary_table(category_counts: &BTreeMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let width = category_counts
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max("Category".len());

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (category, count) in category_counts {
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                plural(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files),
            width = width
        );
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

/// Terminal status sink.
///
/// Failures on the drop path are printed immediately; the status line is
/// printed whenever it changes. While a progress bar is attached, messages are
/// routed through it so the bar is not torn.
#[derive(Default)]
pub struct ConsoleStatus {
    line: StatusLine,
    progress: Mutex<Option<ProgressBar>>,
}

impl ConsoleStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&self) -> &StatusLine {
        &self.line
    }

    /// Shows a progress bar for the next batch of `total` files.
    pub fn start_progress(&self, total: u64) {
        *self.progress_slot() = Some(OutputFormatter::create_progress_bar(total));
    }

    fn progress_slot(&self) -> std::sync::MutexGuard<'_, Option<ProgressBar>> {
        self.progress
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn finish_progress(&self) {
        if let Some(pb) = self.progress_slot().take() {
            pb.finish_and_clear();
        }
    }
}

impl StatusSink for ConsoleStatus {
    fn file_sorted(&self, file_name: &str) {
        self.line.set(file_name);
        let text = self.line.text();
        match self.progress_slot().as_ref() {
            Some(pb) => pb.println(text),
            None => OutputFormatter::status(&text),
        }
    }

    fn sort_failed(&self, source: &Path, error: &SortError) {
        let message = format!("Failed to move {}: {}", source.display(), error);
        match self.progress_slot().as_ref() {
            Some(pb) => pb.println(format!("{} {}", "✗".red(), message)),
            None => OutputFormatter::error(&message),
        }
    }

    fn batch_done(&self, report: &BatchReport) {
        self.finish_progress();

        if report.moved.is_empty() && report.failed.is_empty() {
            OutputFormatter::warning("Nothing to sort.");
        } else if report.is_complete_success() {
            OutputFormatter::success(&format!(
                "Done: {} {} sorted.",
                report.moved.len(),
                plural(report.moved.len())
            ));
        } else {
            OutputFormatter::warning(&format!(
                "Done: {} sorted, {} failed. See the log for details.",
                report.moved.len(),
                report.failed.len()
            ));
        }

        if !report.skipped.is_empty() {
            OutputFormatter::plain(&format!("  Skipped: {}", report.skipped.len()));
        }
    }

    fn item_processed(&self, source: &Path) {
        if let Some(pb) = self.progress_slot().as_ref() {
            pb.set_message(
                source
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
            pb.inc(1);
        }
    }
}
