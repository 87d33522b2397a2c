//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`RepoPath`] - Normalized repository-relative path
//! - [`ChangeEntry`] - One logical change inside a comparison context
//!
//! # Validation
//!
//! These types enforce validity at construction time. A `RepoPath` is
//! always forward-slash separated, never empty, never absolute and never
//! escapes the repository root, so set operations over paths coming from
//! git, from the ContextStore and from the command line agree.
//!
//! # Examples
//!
//! ```
//! use vgl::core::types::{BranchName, Oid, RepoPath};
//!
//! let branch = BranchName::new("feature/login").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! let path = RepoPath::new("./src\\main.rs").unwrap();
//!
//! assert_eq!(branch.as_str(), "feature/login");
//! assert_eq!(oid.short(7), "abc123d");
//! assert_eq!(path.as_str(), "src/main.rs");
//! assert!(BranchName::new("bad..name").is_err());
//! ```

use std::fmt;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// A validated Git branch name.
///
/// Follows the rules of `git check-ref-format --branch`: no empty names,
/// no `@` alone, no leading `-`, no component starting with `.` or ending
/// with `.lock`, no `..`, `@{`, `//`, trailing `/`, control characters,
/// or any of `` ~^:\?*[`` and space.
///
/// ```
/// use vgl::core::types::BranchName;
///
/// assert!(BranchName::new("main").is_ok());
/// assert!(BranchName::new("user@topic").is_ok());
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("topic.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` naming the first rule violated.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if let Some(problem) = Self::problem(&name) {
            return Err(TypeError::InvalidBranchName(format!("'{name}' {problem}")));
        }
        Ok(Self(name))
    }

    /// The branch that new repositories and unreadable contexts fall back to.
    pub fn default_branch() -> Self {
        Self("main".to_string())
    }

    fn problem(name: &str) -> Option<&'static str> {
        const FORBIDDEN: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];

        if name.is_empty() {
            return Some("is empty");
        }
        if name == "@" {
            return Some("is reserved");
        }
        if name.starts_with('-') {
            return Some("starts with '-'");
        }
        if name.ends_with('/') {
            return Some("ends with '/'");
        }
        for sequence in ["..", "@{", "//"] {
            if name.contains(sequence) {
                return Some("contains a forbidden sequence");
            }
        }
        if name
            .chars()
            .any(|c| c.is_ascii_control() || FORBIDDEN.contains(&c))
        {
            return Some("contains a forbidden character");
        }
        if name
            .split('/')
            .any(|part| part.starts_with('.') || part.ends_with(".lock"))
        {
            return Some("has a component starting with '.' or ending with '.lock'");
        }
        None
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The local ref for this branch (`refs/heads/<name>`).
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }

    /// The remote-tracking ref for this branch under `remote`.
    pub fn remote_ref(&self, remote: &str) -> String {
        format!("refs/remotes/{}/{}", remote, self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// ```
/// use vgl::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert!(Oid::new("not-a-sha").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` unless the input is 40 or 64 hex digits.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID.
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Oid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<Oid> for String {
    fn from(oid: Oid) -> Self {
        oid.0
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A normalized, repository-relative path.
///
/// Normalization: `\` turned into `/`, leading `./` and `/` stripped,
/// empty and `.` components dropped, trailing `/` dropped. Whitespace is
/// part of the name and kept. Paths that end up empty, contain `..`, or
/// contain control characters are rejected.
///
/// Ordering is plain byte ordering of the normalized string, which keeps
/// every listing in the crate deterministic.
///
/// ```
/// use vgl::core::types::RepoPath;
///
/// let dir = RepoPath::new("vendor/").unwrap();
/// let file = RepoPath::new("/vendor//lib/a.rs").unwrap();
/// assert_eq!(file.as_str(), "vendor/lib/a.rs");
/// assert!(file.is_within(&dir));
/// assert!(RepoPath::new("../outside").is_err());
/// assert!(RepoPath::new("./.").is_err());
/// assert_eq!(RepoPath::new(" notes.txt").unwrap().as_str(), " notes.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoPath(String);

impl RepoPath {
    /// Normalize and validate a repository-relative path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` for empty, escaping or control-character paths.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TypeError> {
        let raw = raw.as_ref();
        let unified = raw.replace('\\', "/");

        let mut parts = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(TypeError::InvalidPath(format!(
                        "'{raw}' escapes the repository root"
                    )))
                }
                _ => parts.push(part),
            }
        }

        if parts.is_empty() {
            return Err(TypeError::InvalidPath(format!("'{raw}' is empty")));
        }
        let joined = parts.join("/");
        if joined.chars().any(|c| c.is_control()) {
            return Err(TypeError::InvalidPath(format!(
                "'{}' contains control characters",
                raw.escape_debug()
            )));
        }
        Ok(Self(joined))
    }

    /// Build a `RepoPath` from a relative filesystem path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPath` for absolute or non-UTF-8 paths.
    pub fn from_relative(path: &Path) -> Result<Self, TypeError> {
        let mut parts = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str().ok_or_else(|| {
                    TypeError::InvalidPath(format!("'{}' is not UTF-8", path.display()))
                })?),
                Component::CurDir => {}
                _ => {
                    return Err(TypeError::InvalidPath(format!(
                        "'{}' is not repository-relative",
                        path.display()
                    )))
                }
            }
        }
        Self::new(parts.join("/"))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final component.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// True when this path is `dir` itself or lies beneath it.
    pub fn is_within(&self, dir: &RepoPath) -> bool {
        self.0 == dir.0
            || (self.0.len() > dir.0.len()
                && self.0.starts_with(&dir.0)
                && self.0.as_bytes()[dir.0.len()] == b'/')
    }

    /// The path as a relative filesystem path under `root`.
    pub fn under(&self, root: &Path) -> std::path::PathBuf {
        root.join(&self.0)
    }
}

impl TryFrom<String> for RepoPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RepoPath> for String {
    fn from(path: RepoPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of a logical change after rename unification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    /// Single-letter marker used in listings.
    pub fn letter(self) -> char {
        match self {
            ChangeKind::Added => 'A',
            ChangeKind::Modified => 'M',
            ChangeKind::Deleted => 'D',
            ChangeKind::Renamed => 'R',
        }
    }
}

/// One logical change within a single comparison context.
///
/// `source` is set only for [`ChangeKind::Renamed`] entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub path: RepoPath,
    pub kind: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<RepoPath>,
}

impl ChangeEntry {
    pub fn added(path: RepoPath) -> Self {
        Self {
            path,
            kind: ChangeKind::Added,
            source: None,
        }
    }

    pub fn modified(path: RepoPath) -> Self {
        Self {
            path,
            kind: ChangeKind::Modified,
            source: None,
        }
    }

    pub fn deleted(path: RepoPath) -> Self {
        Self {
            path,
            kind: ChangeKind::Deleted,
            source: None,
        }
    }

    pub fn renamed(source: RepoPath, path: RepoPath) -> Self {
        Self {
            path,
            kind: ChangeKind::Renamed,
            source: Some(source),
        }
    }
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{} {} -> {}", self.kind.letter(), source, self.path),
            None => write!(f, "{} {}", self.kind.letter(), self.path),
        }
    }
}
