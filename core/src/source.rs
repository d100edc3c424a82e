//! Configuration sources: where rule documents come from.
//!
//! A [`ConfigSource`] turns an identifier into a [`RawRules`] document.
//! Absence ([`SourceError::Absent`]) is reported separately from read and
//! parse failures so callers can log them differently; the loader treats all
//! of them as "no filtering".

use crate::{RawRules, SourceError};
use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Environment variable naming the default filter file.
pub const FILTERS_ENV: &str = "MAILSIFT_FILTERS";

/// The default rule document location.
///
/// `$MAILSIFT_FILTERS` when set and non-empty, otherwise
/// `~/.mailsift/filters.yaml`. `None` if neither is available.
#[must_use]
pub fn default_identifier() -> Option<String> {
    if let Some(path) = std::env::var_os(FILTERS_ENV).filter(|p| !p.is_empty()) {
        return Some(path.to_string_lossy().into_owned());
    }
    dirs::home_dir().map(|home| {
        home.join(".mailsift")
            .join("filters.yaml")
            .to_string_lossy()
            .into_owned()
    })
}

/// Supplies raw rule documents by identifier.
///
/// # Example
///
/// ```
/// use mailsift::{ConfigSource, MemorySource};
///
/// let source = MemorySource::new().with("work", "spam: read\n");
/// assert!(source.exists("work"));
/// assert_eq!(source.load("work").unwrap().len(), 1);
/// assert!(source.load("home").unwrap_err().is_absent());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot supply rule documents",
    note = "implement `mailsift::ConfigSource`, or use `FileSource` / `MemorySource`"
)]
pub trait ConfigSource: Send + Sync {
    /// Whether a document exists under `id`.
    fn exists(&self, id: &str) -> bool;

    /// Load and parse the document under `id`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::Absent`] if nothing exists under `id`
    /// - [`SourceError::Read`] if it exists but cannot be read
    /// - [`SourceError::Malformed`] if it is not a descriptor mapping
    fn load(&self, id: &str) -> Result<RawRules, SourceError>;

    /// The identifier rule sets for `id` are cached under.
    ///
    /// Two spellings that name the same document must map to the same
    /// string. The default returns `id` unchanged.
    fn canonical_id(&self, id: &str) -> String {
        id.to_owned()
    }

    /// Identifier used for [`RuleSource::Default`](crate::RuleSource::Default).
    fn default_id(&self) -> Option<String> {
        default_identifier()
    }
}

/// Parse a document, choosing JSON for `.json` identifiers and YAML otherwise.
///
/// A blank document is an empty rule list.
fn parse_document(id: &str, content: &str) -> Result<RawRules, SourceError> {
    if content.trim().is_empty() {
        return Ok(RawRules::default());
    }

    let is_json = Path::new(id)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let parsed = if is_json {
        serde_json::from_str(content).map_err(|e| format!("JSON parse error: {e}"))
    } else {
        // Default to YAML (handles .yaml and .yml)
        serde_yaml::from_str(content).map_err(|e| format!("YAML parse error: {e}"))
    };
    parsed.map_err(|reason| SourceError::Malformed {
        id: id.to_owned(),
        reason,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// FileSource
// ═══════════════════════════════════════════════════════════════════════════════

/// Reads rule documents from the filesystem. Identifiers are paths.
///
/// Relative identifiers resolve against the root given to
/// [`with_root()`](Self::with_root), or the working directory.
#[derive(Debug, Clone, Default)]
pub struct FileSource {
    root: Option<PathBuf>,
    default_path: Option<PathBuf>,
}

impl FileSource {
    /// Create a source reading paths as given.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve relative identifiers against `root`.
    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Use `path` instead of [`default_identifier()`] for the default source.
    #[must_use]
    pub fn with_default_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_path = Some(path.into());
        self
    }

    fn resolve(&self, id: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(id),
            None => PathBuf::from(id),
        }
    }
}

/// Make `path` absolute and fold away `.` and `..` without touching the
/// filesystem. Symlinks are left as written.
fn normalize(path: &Path) -> PathBuf {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

impl ConfigSource for FileSource {
    fn exists(&self, id: &str) -> bool {
        self.resolve(id).is_file()
    }

    fn load(&self, id: &str) -> Result<RawRules, SourceError> {
        let path = self.resolve(id);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                SourceError::Absent { id: id.to_owned() }
            } else {
                SourceError::Read {
                    id: id.to_owned(),
                    source,
                }
            }
        })?;
        parse_document(id, &content)
    }

    /// The canonical absolute path, or a lexically normalized one when the
    /// file cannot be resolved (e.g. it does not exist yet).
    fn canonical_id(&self, id: &str) -> String {
        let path = self.resolve(id);
        std::fs::canonicalize(&path)
            .unwrap_or_else(|_| normalize(&path))
            .to_string_lossy()
            .into_owned()
    }

    fn default_id(&self) -> Option<String> {
        match &self.default_path {
            Some(path) => Some(path.to_string_lossy().into_owned()),
            None => default_identifier(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MemorySource
// ═══════════════════════════════════════════════════════════════════════════════

/// Serves rule documents held in memory.
///
/// Documents are stored as text and parsed on every [`load()`](ConfigSource::load),
/// exactly like files, so malformed documents behave the same way.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: HashMap<String, String>,
    default_id: Option<String>,
}

impl MemorySource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document (builder pattern).
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, document: impl Into<String>) -> Self {
        self.insert(id, document);
        self
    }

    /// Add or replace a document.
    pub fn insert(&mut self, id: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(id.into(), document.into());
    }

    /// Identifier to use for the default source. Without one, the default
    /// source is absent.
    #[must_use]
    pub fn with_default_id(mut self, id: impl Into<String>) -> Self {
        self.default_id = Some(id.into());
        self
    }
}

impl ConfigSource for MemorySource {
    fn exists(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    fn load(&self, id: &str) -> Result<RawRules, SourceError> {
        let document = self
            .documents
            .get(id)
            .ok_or_else(|| SourceError::Absent { id: id.to_owned() })?;
        parse_document(id, document)
    }

    fn default_id(&self) -> Option<String> {
        self.default_id.clone()
    }
}
