//! Runtime configuration.
//!
//! Settings are read from a TOML file and cover two areas: how the sorter
//! behaves (installation directory, destination, grace period, collision and
//! watch policies) and which files the drop and watch paths hand to it.
//!
//! # Configuration File Format
//!
//! ```toml
//! [sorter]
//! install_dir = "/home/me"
//! destination = "/home/me/Sorted"
//! grace_period_ms = 1000
//! on_conflict = "rename"   # rename | overwrite | reject
//! watch_policy = "add"     # add | replace
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.part", "*.crdownload"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! Every section and key is optional.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCAL_CONFIG_NAME: &str = ".somesortrc.toml";
const DEFAULT_GRACE_PERIOD_MS: u64 = 1000;

/// Errors that can occur during configuration loading and filter compilation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    #[error("IO error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do when the destination already holds a file with the same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Keep both; the incoming file becomes `name (1).ext`, `name (2).ext`, ...
    #[default]
    Rename,
    /// Replace the existing file.
    Overwrite,
    /// Leave the source in place and report a failure.
    Reject,
}

/// What to do when a folder is chosen while others are already watched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchPolicy {
    /// Start an additional, independent watcher.
    #[default]
    Add,
    /// Stop every running watcher first.
    Replace,
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    #[serde(default)]
    pub sorter: SorterSettings,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Behaviour of the sorter and its adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SorterSettings {
    /// Parent directory of the `SomeSort Main` installation folder.
    #[serde(default)]
    pub install_dir: Option<PathBuf>,

    /// Destination root; defaults to the installation's `SortedFiles/`.
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Delay between a file appearing in a watched folder and sorting it.
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    #[serde(default)]
    pub on_conflict: ConflictPolicy,

    #[serde(default)]
    pub watch_policy: WatchPolicy,
}

fn default_grace_period_ms() -> u64 {
    DEFAULT_GRACE_PERIOD_MS
}

impl Default for SorterSettings {
    fn default() -> Self {
        Self {
            install_dir: None,
            destination: None,
            grace_period_ms: DEFAULT_GRACE_PERIOD_MS,
            on_conflict: ConflictPolicy::default(),
            watch_policy: WatchPolicy::default(),
        }
    }
}

impl SorterSettings {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

/// Which files the adapters pass to the sorter.
///
/// The defaults let every file through; filtering only happens once rules
/// are configured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether hidden files (starting with ".") are sorted. Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist; a match here overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the full path (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions without the dot, case-insensitive (e.g., "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regexes matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SortConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.somesortrc.toml` in the current directory
    /// 3. `somesort/config.toml` in the user's config directory
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a file is found (or explicitly given) but cannot be
    /// read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_NAME);
        if local_config.is_file() {
            return Self::load_from_file(&local_config);
        }

        if let Some(user_config) = Self::user_config_path()
            && user_config.is_file()
        {
            return Self::load_from_file(&user_config);
        }

        tracing::debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// `<config dir>/somesort/config.toml`, when the platform has a config dir.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("somesort").join("config.toml"))
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }
}

impl FilterRules {
    /// Compiles the rules into matchers.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn compile(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(self)
    }
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Filters that let every path through, hidden files included.
    pub fn allow_all() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Returns true if `file_path` should be sorted.
    ///
    /// Include patterns win outright; after that a path is dropped if it is
    /// hidden (unless enabled), or matches an excluded name, extension, glob
    /// or regex.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension()
            && self
                .exclude_extensions
                .contains(&ext.to_string_lossy().to_lowercase())
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn compile(rules: FilterRules) -> CompiledFilters {
        rules.compile().expect("Failed to compile filters")
    }

    #[test]
    fn test_defaults() {
        let config = SortConfig::default();
        assert_eq!(config.sorter.grace_period(), Duration::from_secs(1));
        assert_eq!(config.sorter.on_conflict, ConflictPolicy::Rename);
        assert_eq!(config.sorter.watch_policy, WatchPolicy::Add);
        assert!(config.sorter.destination.is_none());
        assert!(config.filters.enable_hidden_files);
    }

    #[test]
    fn test_parse_full_config() {
        let config = SortConfig::from_toml(
            r#"
            [sorter]
            install_dir = "/opt"
            destination = "/data/sorted"
            grace_period_ms = 250
            on_conflict = "reject"
            watch_policy = "replace"

            [filters]
            enable_hidden_files = false

            [filters.exclude]
            patterns = ["*.part"]
            "#,
        )
        .expect("Failed to parse config");

        assert_eq!(config.sorter.install_dir, Some(PathBuf::from("/opt")));
        assert_eq!(config.sorter.destination, Some(PathBuf::from("/data/sorted")));
        assert_eq!(config.sorter.grace_period(), Duration::from_millis(250));
        assert_eq!(config.sorter.on_conflict, ConflictPolicy::Reject);
        assert_eq!(config.sorter.watch_policy, WatchPolicy::Replace);
        assert!(!config.filters.enable_hidden_files);
        assert_eq!(config.filters.exclude.patterns, vec!["*.part".to_string()]);
    }

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = SortConfig::from_toml("[sorter]\non_conflict = \"overwrite\"\n")
            .expect("Failed to parse config");

        assert_eq!(config.sorter.on_conflict, ConflictPolicy::Overwrite);
        assert_eq!(config.sorter.grace_period_ms, 1000);
        assert_eq!(config.sorter.watch_policy, WatchPolicy::Add);
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let result = SortConfig::from_toml("[sorter]\non_conflict = \"merge\"\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("somesort.toml");
        fs::write(&path, "[sorter]\ngrace_period_ms = 5\n").expect("Failed to write config");

        let config = SortConfig::load(Some(&path)).expect("Failed to load config");
        assert_eq!(config.sorter.grace_period_ms, 5);
    }

    #[test]
    fn test_load_missing_explicit_path() {
        let result = SortConfig::load(Some(Path::new("/no/such/somesort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }

    #[test]
    fn test_hidden_files_included_by_default() {
        let compiled = compile(FilterRules::default());
        assert!(compiled.should_include(Path::new("/projects/.env")));
        assert!(compiled.should_include(Path::new(".gitignore")));

        // A filters section without the key keeps the default
        let config = SortConfig::from_toml("[filters.exclude]\nextensions = [\"tmp\"]\n")
            .expect("Failed to parse config");
        assert!(config.filters.enable_hidden_files);
        let compiled = compile(config.filters);
        assert!(compiled.should_include(Path::new("/projects/.env")));
        assert!(!compiled.should_include(Path::new("/projects/build.tmp")));
    }

    #[test]
    fn test_hidden_files_excluded_when_disabled() {
        let compiled = compile(FilterRules {
            enable_hidden_files: false,
            ..Default::default()
        });

        assert!(!compiled.should_include(Path::new(".DS_Store")));
        assert!(!compiled.should_include(Path::new("/downloads/.~lock.report.odt#")));
        assert!(compiled.should_include(Path::new("/downloads/report.odt")));
    }

    #[test]
    fn test_allow_all_includes_hidden() {
        let compiled = CompiledFilters::allow_all();
        assert!(compiled.should_include(Path::new(".bashrc")));
    }

    #[test]
    fn test_exclude_filenames_and_extensions() {
        let compiled = compile(FilterRules {
            enable_hidden_files: true,
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                extensions: vec!["tmp".to_string(), ".BAK".to_string()],
                ..Default::default()
            },
            include: IncludeRules::default(),
        });

        assert!(!compiled.should_include(Path::new("/x/Thumbs.db")));
        assert!(!compiled.should_include(Path::new("/x/file.TMP")));
        assert!(!compiled.should_include(Path::new("/x/file.bak")));
        assert!(compiled.should_include(Path::new("/x/file.txt")));
    }

    #[test]
    fn test_exclude_partial_downloads_by_glob() {
        let compiled = compile(FilterRules {
            enable_hidden_files: true,
            exclude: ExcludeRules {
                patterns: vec!["*.part".to_string(), "*.crdownload".to_string()],
                ..Default::default()
            },
            include: IncludeRules::default(),
        });

        assert!(!compiled.should_include(Path::new("/home/me/Downloads/movie.mkv.part")));
        assert!(!compiled.should_include(Path::new("setup.exe.crdownload")));
        assert!(compiled.should_include(Path::new("/home/me/Downloads/movie.mkv")));
    }

    #[test]
    fn test_exclude_regex_matches_file_name() {
        let compiled = compile(FilterRules {
            enable_hidden_files: true,
            exclude: ExcludeRules {
                regex: vec![r"^~\$".to_string()],
                ..Default::default()
            },
            include: IncludeRules::default(),
        });

        assert!(!compiled.should_include(Path::new("/docs/~$report.docx")));
        assert!(compiled.should_include(Path::new("/docs/report.docx")));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let compiled = compile(FilterRules {
            enable_hidden_files: false,
            exclude: ExcludeRules {
                extensions: vec!["tmp".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec!["*keep.tmp".to_string(), "*.important".to_string()],
            },
        });

        assert!(compiled.should_include(Path::new("/x/keep.tmp")));
        assert!(compiled.should_include(Path::new(".important")));
        assert!(!compiled.should_include(Path::new("/x/drop.tmp")));
    }

    #[test]
    fn test_invalid_patterns_return_errors() {
        let bad_regex = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_regex.compile(),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));

        let bad_glob = FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            bad_glob.compile(),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }
}
