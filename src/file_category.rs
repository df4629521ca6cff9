/// Extension-based file categorization.
///
/// This module maps a file name's extension to one of a fixed set of
/// categories (e.g., "Images", "Documents", "Archives"). The lookup table is
/// ordered: an extension listed under several categories resolves to the one
/// declared first.
///
/// # Examples
///
/// ```
/// use somesort::file_category::{Category, classify};
///
/// assert_eq!(classify("photo.JPG"), Category::Images);
/// assert_eq!(classify("backup.tar.gz"), Category::Archives);
/// assert_eq!(classify("report.csv"), Category::Documents);
/// assert_eq!(classify("Makefile"), Category::Others);
/// ```
use std::collections::HashSet;
use std::sync::LazyLock;

/// A named bucket of file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Images,
    Documents,
    Videos,
    Music,
    Archives,
    Scripts,
    Fonts,
    Spreadsheets,
    Presentations,
    Executables,
    /// Catch-all for files no other category claims.
    Others,
}

impl Category {
    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use somesort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "Images");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "Images",
            Category::Documents => "Documents",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Archives => "Archives",
            Category::Scripts => "Scripts",
            Category::Fonts => "Fonts",
            Category::Spreadsheets => "Spreadsheets",
            Category::Presentations => "Presentations",
            Category::Executables => "Executables",
            Category::Others => "Others",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Standard categories in lookup order. `Others` is implicit.
const STANDARD_CATEGORIES: &[(Category, &[&str])] = &[
    (
        Category::Images,
        &[
            ".png", ".jpg", ".jpeg", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp", ".heic",
        ],
    ),
    (
        Category::Documents,
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt", ".pptx",
            ".csv", ".md", ".tex",
        ],
    ),
    (
        Category::Videos,
        &[
            ".mp4", ".mov", ".avi", ".mkv", ".flv", ".wmv", ".mpeg", ".mpg", ".webm", ".3gp",
        ],
    ),
    (
        Category::Music,
        &[".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".alac"],
    ),
    (
        Category::Archives,
        &[".zip", ".rar", ".tar", ".gz", ".7z", ".bz2", ".xz", ".lzma", ".iso"],
    ),
    (
        Category::Scripts,
        &[".py", ".sh", ".bat", ".js", ".pl", ".rb", ".php", ".ps1", ".lua", ".groovy"],
    ),
    (Category::Fonts, &[".ttf", ".otf", ".woff", ".woff2", ".eot"]),
    (Category::Spreadsheets, &[".xls", ".xlsx", ".ods", ".csv"]),
    (Category::Presentations, &[".ppt", ".pptx", ".odp"]),
    (
        Category::Executables,
        &[".exe", ".msi", ".apk", ".bin", ".appimage"],
    ),
];

static STANDARD_TABLE: LazyLock<CategoryTable> = LazyLock::new(CategoryTable::standard);

/// One row of the lookup table.
#[derive(Debug, Clone)]
struct CategoryEntry {
    category: Category,
    extensions: HashSet<&'static str>,
}

/// Ordered, immutable mapping from categories to extension sets.
///
/// Rows are checked in declaration order and the first row containing the
/// extension wins. Files matching no row fall into [`Category::Others`].
#[derive(Debug, Clone)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
}

impl CategoryTable {
    /// Builds the standard table.
    pub fn standard() -> Self {
        Self::from_rows(STANDARD_CATEGORIES)
    }

    /// Builds a table from `(category, extensions)` rows, keeping their order.
    ///
    /// Extensions are expected lowercase with the leading dot. Rows for
    /// [`Category::Others`] are ignored since it is always the fallback.
    pub fn from_rows(rows: &[(Category, &[&'static str])]) -> Self {
        let entries = rows
            .iter()
            .filter(|(category, _)| *category != Category::Others)
            .map(|(category, extensions)| CategoryEntry {
                category: *category,
                extensions: extensions.iter().copied().collect(),
            })
            .collect();
        Self { entries }
    }

    /// Categories in lookup order, ending with the catch-all.
    pub fn categories(&self) -> Vec<Category> {
        self.entries
            .iter()
            .map(|entry| entry.category)
            .chain(std::iter::once(Category::Others))
            .collect()
    }

    /// Extensions declared for `category`, sorted. Empty for the catch-all.
    pub fn extensions(&self, category: Category) -> Vec<&'static str> {
        let mut extensions: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| entry.category == category)
            .flat_map(|entry| entry.extensions.iter().copied())
            .collect();
        extensions.sort_unstable();
        extensions
    }

    /// Classifies a file name or path by its final extension.
    pub fn classify(&self, filename: &str) -> Category {
        let ext = extension_of(filename);
        if ext.is_empty() {
            return Category::Others;
        }

        self.entries
            .iter()
            .find(|entry| entry.extensions.contains(ext.as_str()))
            .map(|entry| entry.category)
            .unwrap_or(Category::Others)
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Classifies `filename` against the standard table.
pub fn classify(filename: &str) -> Category {
    STANDARD_TABLE.classify(filename)
}

/// Returns the lowercase extension of the last path component, dot included.
///
/// Both `/` and `\` separate components. Leading dots do not start an
/// extension, so `.bashrc` has none.
///
/// ```
/// use somesort::file_category::extension_of;
///
/// assert_eq!(extension_of("dir/archive.TAR.GZ"), ".gz");
/// assert_eq!(extension_of(r"C:\Users\me\notes.Md"), ".md");
/// assert_eq!(extension_of(".bashrc"), "");
/// assert_eq!(extension_of("README"), "");
/// ```
pub fn extension_of(filename: &str) -> String {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim_start_matches('.');

    match name.rfind('.') {
        Some(idx) => name[idx..].to_lowercase(),
        None => String::new(),
    }
}
