//! core::context::schema
//!
//! The on-disk ContextStore record and its single parser/renderer pair.
//!
//! # Format
//!
//! Newline-delimited `key=value` records. Blank lines and lines starting
//! with `#` or `!` are skipped. The first `=` splits key from value; both
//! are trimmed. A backslash escapes the next character on read, and the
//! renderer escapes backslashes, so Windows paths survive a round trip.
//!
//! | key               | value                                   |
//! |-------------------|-----------------------------------------|
//! | `local.dir`       | absolute repository root                |
//! | `local.branch`    | branch name                             |
//! | `remote.url`      | remote URL                              |
//! | `remote.branch`   | remote branch name                      |
//! | `tracked.files`   | comma-joined repo-relative paths        |
//! | `untracked.files` | comma-joined repo-relative paths        |
//! | `undecided.files` | comma-joined repo-relative paths        |
//! | `jump.<key>`      | the four scalar keys for the alternate  |
//!
//! # Defaulting rules
//!
//! Every field is optional here; defaults are applied one layer up in
//! [`RepoContext::from_file`](super::RepoContext::from_file).
//!
//! - absent key: `None` / empty set
//! - blank value: `None` / empty set
//! - malformed value (invalid branch name, escaping path): `None` or the
//!   element is dropped, and a warning is recorded
//! - malformed line (no `=`): skipped with a warning
//! - content that is not UTF-8: every field absent, one warning
//!
//! Parsing never fails.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::core::types::{BranchName, RepoPath};

/// Recognized keys.
pub mod keys {
    pub const LOCAL_DIR: &str = "local.dir";
    pub const LOCAL_BRANCH: &str = "local.branch";
    pub const REMOTE_URL: &str = "remote.url";
    pub const REMOTE_BRANCH: &str = "remote.branch";
    pub const TRACKED_FILES: &str = "tracked.files";
    pub const UNTRACKED_FILES: &str = "untracked.files";
    pub const UNDECIDED_FILES: &str = "undecided.files";
    pub const JUMP_PREFIX: &str = "jump.";
}

/// The scalar half of a record: where a context points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointRecord {
    pub local_dir: Option<PathBuf>,
    pub local_branch: Option<BranchName>,
    pub remote_url: Option<String>,
    pub remote_branch: Option<BranchName>,
}

impl EndpointRecord {
    fn is_empty(&self) -> bool {
        self.local_dir.is_none()
            && self.local_branch.is_none()
            && self.remote_url.is_none()
            && self.remote_branch.is_none()
    }
}

/// Typed view of one ContextStore file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextFile {
    pub endpoint: EndpointRecord,
    pub tracked: BTreeSet<RepoPath>,
    pub untracked: BTreeSet<RepoPath>,
    pub undecided: BTreeSet<RepoPath>,
    pub jump: Option<EndpointRecord>,
}

/// Result of parsing: the record plus anything that was discarded.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub file: ContextFile,
    pub warnings: Vec<String>,
}

impl ContextFile {
    /// Parse raw file bytes.
    pub fn parse(bytes: &[u8]) -> ParseOutcome {
        let mut warnings = Vec::new();

        let text = match std::str::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                warnings.push("context file is not UTF-8; ignoring its contents".to_string());
                return ParseOutcome {
                    file: ContextFile::default(),
                    warnings,
                };
            }
        };

        let mut raw = BTreeMap::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            match line.split_once('=') {
                Some((key, value)) => {
                    raw.insert(key.trim().to_string(), unescape(value.trim()));
                }
                None => warnings.push(format!("line {}: expected key=value", index + 1)),
            }
        }

        let mut reader = RawRecords {
            raw,
            warnings: &mut warnings,
        };

        let endpoint = reader.endpoint("");
        let tracked = reader.paths(keys::TRACKED_FILES);
        let untracked = reader.paths(keys::UNTRACKED_FILES);
        let undecided = reader.paths(keys::UNDECIDED_FILES);
        let jump = Some(reader.endpoint(keys::JUMP_PREFIX)).filter(|j| !j.is_empty());

        for key in reader.raw.keys() {
            tracing::debug!(key = %key, "ignoring unknown context key");
        }

        ParseOutcome {
            file: ContextFile {
                endpoint,
                tracked,
                untracked,
                undecided,
                jump,
            },
            warnings,
        }
    }

    /// Render the record in its canonical form: fixed key order, sorted paths.
    ///
    /// Paths containing a comma cannot be represented in a comma-joined
    /// list and are left out with a warning.
    pub fn render(&self) -> String {
        let mut out = String::from("# vgl context\n");
        render_endpoint(&mut out, "", &self.endpoint);
        render_paths(&mut out, keys::TRACKED_FILES, &self.tracked);
        render_paths(&mut out, keys::UNTRACKED_FILES, &self.untracked);
        render_paths(&mut out, keys::UNDECIDED_FILES, &self.undecided);
        if let Some(jump) = &self.jump {
            render_endpoint(&mut out, keys::JUMP_PREFIX, jump);
        }
        out
    }
}

struct RawRecords<'w> {
    raw: BTreeMap<String, String>,
    warnings: &'w mut Vec<String>,
}

impl RawRecords<'_> {
    fn take(&mut self, key: &str) -> Option<String> {
        self.raw.remove(key).filter(|value| !value.is_empty())
    }

    fn branch(&mut self, key: &str) -> Option<BranchName> {
        let value = self.take(key)?;
        match BranchName::new(value) {
            Ok(branch) => Some(branch),
            Err(e) => {
                self.warnings.push(format!("{key}: {e}"));
                None
            }
        }
    }

    fn endpoint(&mut self, prefix: &str) -> EndpointRecord {
        EndpointRecord {
            local_dir: self
                .take(&format!("{prefix}{}", keys::LOCAL_DIR))
                .map(PathBuf::from),
            local_branch: self.branch(&format!("{prefix}{}", keys::LOCAL_BRANCH)),
            remote_url: self.take(&format!("{prefix}{}", keys::REMOTE_URL)),
            remote_branch: self.branch(&format!("{prefix}{}", keys::REMOTE_BRANCH)),
        }
    }

    fn paths(&mut self, key: &str) -> BTreeSet<RepoPath> {
        let Some(value) = self.take(key) else {
            return BTreeSet::new();
        };
        let mut paths = BTreeSet::new();
        for element in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match RepoPath::new(element) {
                Ok(path) => {
                    paths.insert(path);
                }
                Err(e) => self.warnings.push(format!("{key}: {e}")),
            }
        }
        paths
    }
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\")
}

fn render_endpoint(out: &mut String, prefix: &str, endpoint: &EndpointRecord) {
    let dir = endpoint
        .local_dir
        .as_ref()
        .map(|d| d.display().to_string())
        .unwrap_or_default();
    let branch = endpoint
        .local_branch
        .as_ref()
        .map(BranchName::as_str)
        .unwrap_or_default();
    let url = endpoint.remote_url.as_deref().unwrap_or_default();
    let remote_branch = endpoint
        .remote_branch
        .as_ref()
        .map(BranchName::as_str)
        .unwrap_or_default();

    for (key, value) in [
        (keys::LOCAL_DIR, dir.as_str()),
        (keys::LOCAL_BRANCH, branch),
        (keys::REMOTE_URL, url),
        (keys::REMOTE_BRANCH, remote_branch),
    ] {
        out.push_str(&format!("{prefix}{key}={}\n", escape(value)));
    }
}

fn render_paths(out: &mut String, key: &str, paths: &BTreeSet<RepoPath>) {
    let joined = paths
        .iter()
        .filter(|path| {
            let representable = !path.as_str().contains(',');
            if !representable {
                tracing::warn!(path = %path, key, "path contains ',' and cannot be stored");
            }
            representable
        })
        .map(|path| escape(path.as_str()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&format!("{key}={joined}\n"));
}
