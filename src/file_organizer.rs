/// Moving files into category directories.
///
/// This module provides the [`Sorter`], which classifies a file, makes sure
/// its category directory exists under a destination root, relocates the
/// file there, and records the outcome in the activity log.
use crate::activity_log::ActivityLog;
use crate::config::{CompiledFilters, ConflictPolicy};
use crate::error::{SortError, SortResult};
use crate::file_category::{Category, CategoryTable};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A successfully sorted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedFile {
    /// Base name of the file, unchanged unless a collision forced a rename.
    pub file_name: String,
    /// Where the file was before the move.
    pub source: PathBuf,
    /// Where the file ended up.
    pub destination: PathBuf,
    /// The category the file was sorted into.
    pub category: Category,
}

/// Where a file would go, without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub category_dir: String,
    pub destination: PathBuf,
}

/// Classifies and moves files into `<destination root>/<category>/`.
///
/// A `Sorter` is immutable once built and is shared between the drop path
/// and every watch worker through an `Arc`.
#[derive(Debug)]
pub struct Sorter {
    table: CategoryTable,
    filters: CompiledFilters,
    on_conflict: ConflictPolicy,
    log: Arc<ActivityLog>,
}

impl Sorter {
    pub fn new(
        table: CategoryTable,
        filters: CompiledFilters,
        on_conflict: ConflictPolicy,
        log: Arc<ActivityLog>,
    ) -> Self {
        Self {
            table,
            filters,
            on_conflict,
            log,
        }
    }

    /// A sorter with the standard table, no filters and the default
    /// conflict policy.
    pub fn with_log(log: Arc<ActivityLog>) -> Self {
        Self::new(
            CategoryTable::standard(),
            CompiledFilters::allow_all(),
            ConflictPolicy::default(),
            log,
        )
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Returns true if the configured filters let `path` through.
    pub fn accepts(&self, path: &Path) -> bool {
        self.filters.should_include(path)
    }

    /// Category for `path`, judged by its final extension.
    pub fn category_of(&self, path: &Path) -> Category {
        self.table.classify(&path.to_string_lossy())
    }

    /// Computes where `source` would be moved without moving it.
    pub fn plan(&self, source: &Path, destination_root: &Path) -> SortResult<PlannedMove> {
        let file_name = source
            .file_name()
            .ok_or_else(|| SortError::InvalidSource(source.to_path_buf()))?;
        let category_dir = self.category_of(source).dir_name();

        Ok(PlannedMove {
            source: source.to_path_buf(),
            category_dir: category_dir.to_string(),
            destination: destination_root.join(category_dir).join(file_name),
        })
    }

    /// Moves `source` into its category directory under `destination_root`.
    ///
    /// The category directory is created when missing; creating it again is
    /// not an error. If `source` is not a regular file the call is a no-op
    /// returning [`SortError::SourceNotFound`], and nothing is logged.
    /// A file already sitting at its planned destination is returned as is,
    /// without a log line. Every other outcome leaves one line in the
    /// activity log.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use somesort::activity_log::ActivityLog;
    /// use somesort::file_organizer::Sorter;
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// let sorter = Sorter::with_log(Arc::new(ActivityLog::tracing_only()));
    /// match sorter.sort_file(Path::new("/tmp/photo.JPG"), Path::new("/tmp/sorted")) {
    ///     Ok(sorted) => println!("Moved to {}", sorted.destination.display()),
    ///     Err(e) if e.is_silent() => {}
    ///     Err(e) => eprintln!("Sort failed: {}", e),
    /// }
    /// ```
    pub fn sort_file(&self, source: &Path, destination_root: &Path) -> SortResult<SortedFile> {
        if !source.is_file() {
            return Err(SortError::SourceNotFound(source.to_path_buf()));
        }

        if let Some(sorted) = self.already_in_place(source, destination_root) {
            tracing::debug!(path = %source.display(), "already in its category folder");
            return Ok(sorted);
        }

        match self.relocate(source, destination_root) {
            Ok(sorted) => {
                self.log.moved(&sorted.source, &sorted.destination);
                Ok(sorted)
            }
            Err(e) => {
                self.log.failed(source, &e);
                Err(e)
            }
        }
    }

    /// The file is already where it would be moved to, so there is nothing to do.
    fn already_in_place(&self, source: &Path, destination_root: &Path) -> Option<SortedFile> {
        let planned = self.plan(source, destination_root).ok()?;
        let same = match (source.canonicalize(), planned.destination.canonicalize()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same {
            return None;
        }

        Some(SortedFile {
            file_name: source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source: source.to_path_buf(),
            destination: source.to_path_buf(),
            category: self.category_of(source),
        })
    }

    fn relocate(&self, source: &Path, destination_root: &Path) -> SortResult<SortedFile> {
        let planned = self.plan(source, destination_root)?;
        let category_path = destination_root.join(&planned.category_dir);

        fs::create_dir_all(&category_path).map_err(|e| SortError::DirectoryCreation {
            path: category_path.clone(),
            source: e,
        })?;

        let destination = self.resolve_conflict(planned.destination)?;

        move_file(source, &destination).map_err(|e| SortError::MoveFailure {
            destination: destination.clone(),
            source: e,
        })?;

        let file_name = destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(SortedFile {
            file_name,
            source: source.to_path_buf(),
            destination,
            category: self.category_of(source),
        })
    }

    fn resolve_conflict(&self, destination: PathBuf) -> SortResult<PathBuf> {
        if !destination.exists() {
            return Ok(destination);
        }

        match self.on_conflict {
            ConflictPolicy::Rename => Ok(unique_destination(&destination)),
            ConflictPolicy::Overwrite => {
                tracing::debug!(path = %destination.display(), "overwriting existing file");
                Ok(destination)
            }
            ConflictPolicy::Reject => Err(SortError::DestinationExists(destination)),
        }
    }
}

/// Renames `source` to `destination`, copying across filesystems.
fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                src = %source.display(),
                dest = %destination.display(),
                "rename crosses devices, falling back to copy+remove"
            );
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to `destination` and removes `source`. A failed copy
/// removes whatever part of `destination` it wrote.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if let Err(e) = fs::copy(source, destination) {
        if let Err(cleanup) = fs::remove_file(destination)
            && cleanup.kind() != io::ErrorKind::NotFound
        {
            tracing::warn!(
                path = %destination.display(),
                error = %cleanup,
                "could not remove partial copy"
            );
        }
        return Err(e);
    }
    fs::remove_file(source)
}

/// Picks `name (1).ext`, `name (2).ext`, ... next to an occupied path.
fn unique_destination(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (1u32..)
        .map(|index| parent.join(format!("{stem} ({index}){extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sorter_with_policy(dir: &Path, on_conflict: ConflictPolicy) -> Sorter {
        let log = ActivityLog::open(&dir.join("sorter.log")).expect("Failed to open log");
        Sorter::new(
            CategoryTable::standard(),
            CompiledFilters::allow_all(),
            on_conflict,
            Arc::new(log),
        )
    }

    fn read_log(dir: &Path) -> String {
        fs::read_to_string(dir.join("sorter.log")).unwrap_or_default()
    }

    #[test]
    fn test_sort_file_creates_category_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("sorted");
        fs::create_dir(&dest).expect("Failed to create destination");

        let file_path = base_path.join("photo.JPG");
        fs::write(&file_path, "jpeg bytes").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        let sorted = sorter.sort_file(&file_path, &dest).expect("Failed to sort file");

        assert_eq!(sorted.file_name, "photo.JPG");
        assert_eq!(sorted.category, Category::Images);
        assert_eq!(sorted.destination, dest.join("Images").join("photo.JPG"));
        assert!(!file_path.exists());
        assert!(sorted.destination.is_file());

        let log = read_log(base_path);
        assert!(log.contains("Moved: "));
        assert!(log.contains("photo.JPG"));
    }

    #[test]
    fn test_sort_file_creates_missing_destination_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("does").join("not").join("exist");

        let file_path = base_path.join("song.mp3");
        fs::write(&file_path, "mp3").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        sorter.sort_file(&file_path, &dest).expect("Failed to sort file");

        assert!(dest.join("Music").join("song.mp3").is_file());
    }

    #[test]
    fn test_sort_file_uses_existing_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);

        for name in ["first.pdf", "second.pdf"] {
            let file_path = base_path.join(name);
            fs::write(&file_path, name).expect("Failed to write test file");
            sorter
                .sort_file(&file_path, base_path)
                .expect("Failed to sort file");
        }

        assert!(base_path.join("Documents").join("first.pdf").is_file());
        assert!(base_path.join("Documents").join("second.pdf").is_file());
    }

    #[test]
    fn test_missing_source_is_silent_noop() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);

        let result = sorter.sort_file(&base_path.join("ghost.png"), base_path);

        match result {
            Err(e) => assert!(e.is_silent()),
            Ok(sorted) => panic!("unexpected move: {:?}", sorted),
        }
        assert!(!base_path.join("Images").exists());
        assert!(read_log(base_path).is_empty());
    }

    #[test]
    fn test_directory_source_is_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let folder = base_path.join("album.zip");
        fs::create_dir(&folder).expect("Failed to create folder");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        let result = sorter.sort_file(&folder, base_path);

        assert!(matches!(result, Err(SortError::SourceNotFound(_))));
        assert!(folder.is_dir());
        assert!(!base_path.join("Archives").exists());
    }

    #[test]
    fn test_conflict_rename_appends_counter() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("out");
        fs::create_dir_all(dest.join("Documents")).expect("Failed to create category");
        fs::write(dest.join("Documents").join("notes.txt"), "old").expect("Failed to write");
        fs::write(dest.join("Documents").join("notes (1).txt"), "older").expect("Failed to write");

        let file_path = base_path.join("notes.txt");
        fs::write(&file_path, "new").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        let sorted = sorter.sort_file(&file_path, &dest).expect("Failed to sort file");

        assert_eq!(sorted.file_name, "notes (2).txt");
        let old = fs::read_to_string(dest.join("Documents").join("notes.txt")).expect("read");
        assert_eq!(old, "old");
        let new = fs::read_to_string(&sorted.destination).expect("read");
        assert_eq!(new, "new");
    }

    #[test]
    fn test_conflict_overwrite_replaces_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("out");
        fs::create_dir_all(dest.join("Archives")).expect("Failed to create category");
        fs::write(dest.join("Archives").join("a.zip"), "old").expect("Failed to write");

        let file_path = base_path.join("a.zip");
        fs::write(&file_path, "new").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Overwrite);
        let sorted = sorter.sort_file(&file_path, &dest).expect("Failed to sort file");

        assert_eq!(sorted.file_name, "a.zip");
        let content = fs::read_to_string(&sorted.destination).expect("read");
        assert_eq!(content, "new");
        assert!(!file_path.exists());
    }

    #[test]
    fn test_conflict_reject_leaves_source_and_logs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let dest = base_path.join("out");
        fs::create_dir_all(dest.join("Videos")).expect("Failed to create category");
        fs::write(dest.join("Videos").join("clip.mp4"), "old").expect("Failed to write");

        let file_path = base_path.join("clip.mp4");
        fs::write(&file_path, "new").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Reject);
        let result = sorter.sort_file(&file_path, &dest);

        assert!(matches!(result, Err(SortError::DestinationExists(_))));
        assert!(file_path.exists());
        assert!(read_log(base_path).contains("Failed to move"));
    }

    #[test]
    fn test_file_already_in_category_is_left_alone() {
        for policy in [ConflictPolicy::Rename, ConflictPolicy::Reject] {
            let temp_dir = TempDir::new().expect("Failed to create temp directory");
            let base_path = temp_dir.path();
            let dest = base_path.join("out");
            let images = dest.join("Images");
            fs::create_dir_all(&images).expect("Failed to create category");
            let photo = images.join("photo.png");
            fs::write(&photo, "png").expect("Failed to write test file");

            let sorter = sorter_with_policy(base_path, policy);
            let sorted = sorter.sort_file(&photo, &dest).expect("Failed to sort file");

            assert_eq!(sorted.file_name, "photo.png");
            assert_eq!(sorted.destination, photo);
            assert_eq!(fs::read_to_string(&photo).expect("read"), "png");
            assert!(!images.join("photo (1).png").exists());
            assert_eq!(fs::read_dir(&images).expect("read_dir").count(), 1);
            assert!(!read_log(base_path).contains("Failed to move"));
        }
    }

    #[test]
    fn test_file_already_in_category_via_relative_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let docs = base_path.join("out").join("Documents");
        fs::create_dir_all(&docs).expect("Failed to create category");
        let report = docs.join("report.pdf");
        fs::write(&report, "pdf").expect("Failed to write test file");

        // Same folder reached through a `..` component
        let root = docs.join("..");
        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        sorter.sort_file(&report, &root).expect("Failed to sort file");

        assert!(report.is_file());
        assert!(!docs.join("report (1).pdf").exists());
    }

    #[test]
    fn test_failed_copy_leaves_no_partial_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let source = base_path.join("not-a-file");
        fs::create_dir(&source).expect("Failed to create source dir");
        let destination = base_path.join("copy.bin");

        assert!(copy_then_remove(&source, &destination).is_err());
        assert!(!destination.exists());
        assert!(source.is_dir());
    }

    #[test]
    fn test_copy_then_remove_moves_contents() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        let source = base_path.join("movie.mkv");
        fs::write(&source, "frames").expect("Failed to write test file");
        let destination = base_path.join("Videos-movie.mkv");

        copy_then_remove(&source, &destination).expect("Failed to copy");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).expect("read"), "frames");
    }

    #[test]
    fn test_directory_creation_failure_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base_path = temp_dir.path();
        // A regular file where the destination root should be
        let blocker = base_path.join("blocker");
        fs::write(&blocker, "not a directory").expect("Failed to write blocker");

        let file_path = base_path.join("photo.png");
        fs::write(&file_path, "png").expect("Failed to write test file");

        let sorter = sorter_with_policy(base_path, ConflictPolicy::Rename);
        let result = sorter.sort_file(&file_path, &blocker);

        assert!(matches!(result, Err(SortError::DirectoryCreation { .. })));
        assert!(file_path.exists());
        assert!(read_log(base_path).contains("Failed to move"));
    }

    #[test]
    fn test_plan_does_not_touch_filesystem() {
        let sorter = Sorter::with_log(Arc::new(ActivityLog::tracing_only()));
        let planned = sorter
            .plan(Path::new("/downloads/backup.tar.gz"), Path::new("/sorted"))
            .expect("plan");

        assert_eq!(planned.category_dir, "Archives");
        assert_eq!(
            planned.destination,
            Path::new("/sorted").join("Archives").join("backup.tar.gz")
        );
    }

    #[test]
    fn test_unique_destination_without_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let taken = temp_dir.path().join("LICENSE");
        fs::write(&taken, "mit").expect("Failed to write");

        assert_eq!(unique_destination(&taken), temp_dir.path().join("LICENSE (1)"));
    }

    #[test]
    fn test_unique_destination_counts_before_last_extension() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let taken = temp_dir.path().join("archive.tar.gz");
        fs::write(&taken, "gz").expect("Failed to write");

        assert_eq!(
            unique_destination(&taken),
            temp_dir.path().join("archive.tar (1).gz")
        );
    }
}
