//! core::context
//!
//! The per-repository context record: which root, branch and remote a
//! command acts on, plus the user's tracking decisions.
//!
//! # Architecture
//!
//! - [`schema`] owns the file format and the absent/blank/malformed rules.
//! - [`RepoContext`] is the in-memory model with defaults applied and the
//!   disjointness invariants enforced.
//! - [`ContextStore`] reads and writes the record at `<root>/.vgl`.
//!
//! A `RepoContext` is built once per invocation by the resolver and passed
//! explicitly to every later stage. It is never cached across invocations.
//!
//! # Invariants
//!
//! - `tracked ∩ untracked = ∅`
//! - `undecided ∩ (tracked ∪ untracked) = ∅`
//! - the jump alternate carries no path sets and no alternate of its own

pub mod schema;

pub use schema::{ContextFile, EndpointRecord, ParseOutcome};

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::paths::{self, lexical_normalize};
use crate::core::types::{BranchName, RepoPath};

/// Errors from ContextStore IO and invariant checks.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to write context file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete context file '{path}': {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("context invariant violated for '{path}': {message}")]
    Invariant { path: RepoPath, message: String },
}

/// The effective repository context for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoContext {
    pub local_root: PathBuf,
    pub local_branch: BranchName,
    pub remote_url: Option<String>,
    pub remote_branch: Option<BranchName>,
    pub tracked: BTreeSet<RepoPath>,
    pub untracked: BTreeSet<RepoPath>,
    pub undecided: BTreeSet<RepoPath>,
    /// Alternate context that `jump` returns to.
    pub jump: Option<Box<RepoContext>>,
}

impl RepoContext {
    /// A context with no remote and no recorded decisions.
    pub fn new(local_root: impl Into<PathBuf>, local_branch: BranchName) -> Self {
        Self {
            local_root: local_root.into(),
            local_branch,
            remote_url: None,
            remote_branch: None,
            tracked: BTreeSet::new(),
            untracked: BTreeSet::new(),
            undecided: BTreeSet::new(),
            jump: None,
        }
    }

    /// Attach a remote. The remote branch defaults to the local branch.
    pub fn with_remote(mut self, url: impl Into<String>, branch: Option<BranchName>) -> Self {
        self.remote_branch = Some(branch.unwrap_or_else(|| self.local_branch.clone()));
        self.remote_url = Some(url.into());
        self
    }

    /// True when a remote URL is configured.
    pub fn has_remote(&self) -> bool {
        self.remote_url.is_some()
    }

    /// The remote branch to compare against, falling back to the local branch.
    pub fn effective_remote_branch(&self) -> &BranchName {
        self.remote_branch.as_ref().unwrap_or(&self.local_branch)
    }

    /// Build a context from a parsed record found at `found_at`.
    ///
    /// Returns the context and any diagnostics worth showing. A stored
    /// `local.dir` that disagrees with `found_at` is ignored: records are
    /// never shared across repositories.
    pub fn from_file(
        file: ContextFile,
        found_at: &Path,
        default_branch: &BranchName,
    ) -> (Self, Vec<String>) {
        let mut diagnostics = Vec::new();

        if let Some(stored) = &file.endpoint.local_dir {
            if lexical_normalize(stored) != lexical_normalize(found_at) {
                diagnostics.push(format!(
                    "Context file at {} names a different directory ({}); using {}",
                    found_at.display(),
                    stored.display(),
                    found_at.display()
                ));
            }
        }

        let mut ctx = Self::from_endpoint(file.endpoint, found_at, default_branch);
        ctx.local_root = found_at.to_path_buf();
        ctx.tracked = file.tracked;
        ctx.untracked = file.untracked;
        ctx.undecided = file.undecided;
        ctx.jump = file
            .jump
            .map(|jump| Box::new(Self::from_endpoint(jump, found_at, default_branch)));

        if ctx.normalize() {
            diagnostics.push(format!(
                "Context file at {} listed a path in more than one decision set; repaired",
                found_at.display()
            ));
        }
        (ctx, diagnostics)
    }

    fn from_endpoint(endpoint: EndpointRecord, fallback_root: &Path, default: &BranchName) -> Self {
        Self {
            local_root: endpoint
                .local_dir
                .unwrap_or_else(|| fallback_root.to_path_buf()),
            local_branch: endpoint.local_branch.unwrap_or_else(|| default.clone()),
            remote_url: endpoint.remote_url,
            remote_branch: endpoint.remote_branch,
            tracked: BTreeSet::new(),
            untracked: BTreeSet::new(),
            undecided: BTreeSet::new(),
            jump: None,
        }
    }

    /// Serialize to the on-disk record.
    pub fn to_file(&self) -> ContextFile {
        ContextFile {
            endpoint: self.endpoint_record(),
            tracked: self.tracked.clone(),
            untracked: self.untracked.clone(),
            undecided: self.undecided.clone(),
            jump: self.jump.as_ref().map(|j| j.endpoint_record()),
        }
    }

    fn endpoint_record(&self) -> EndpointRecord {
        EndpointRecord {
            local_dir: Some(self.local_root.clone()),
            local_branch: Some(self.local_branch.clone()),
            remote_url: self.remote_url.clone(),
            remote_branch: self.remote_branch.clone(),
        }
    }

    /// The endpoint alone, without decisions or alternate.
    pub fn endpoint(&self) -> RepoContext {
        RepoContext {
            jump: None,
            tracked: BTreeSet::new(),
            untracked: BTreeSet::new(),
            undecided: BTreeSet::new(),
            ..self.clone()
        }
    }

    /// Check the disjointness invariants.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Invariant` naming the first offending path.
    pub fn validate(&self) -> Result<(), ContextError> {
        if let Some(path) = self.tracked.intersection(&self.untracked).next() {
            return Err(ContextError::Invariant {
                path: path.clone(),
                message: "both tracked and untracked".to_string(),
            });
        }
        if let Some(path) = self
            .undecided
            .iter()
            .find(|p| self.tracked.contains(*p) || self.untracked.contains(*p))
        {
            return Err(ContextError::Invariant {
                path: path.clone(),
                message: "undecided but already decided".to_string(),
            });
        }
        if let Some(jump) = &self.jump {
            if jump.jump.is_some() || !jump.tracked.is_empty() || !jump.untracked.is_empty() {
                return Err(ContextError::Invariant {
                    path: paths::context_repo_path(),
                    message: "jump alternate carries decisions".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Repair overlapping decision sets. Tracked wins over untracked;
    /// undecided loses to both. Returns `true` if anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.untracked.len() + self.undecided.len();
        self.untracked.retain(|p| !self.tracked.contains(p));
        let (tracked, untracked) = (&self.tracked, &self.untracked);
        self.undecided
            .retain(|p| !tracked.contains(p) && !untracked.contains(p));
        before != self.untracked.len() + self.undecided.len()
    }

    /// Record a decision to track `path`.
    pub fn mark_tracked(&mut self, path: RepoPath) {
        self.untracked.remove(&path);
        self.undecided.remove(&path);
        self.tracked.insert(path);
    }

    /// Record a decision not to track `path`.
    pub fn mark_untracked(&mut self, path: RepoPath) {
        self.tracked.remove(&path);
        self.undecided.remove(&path);
        self.untracked.insert(path);
    }

    /// Replace the undecided list, dropping anything already decided.
    pub fn set_undecided(&mut self, paths: impl IntoIterator<Item = RepoPath>) {
        self.undecided = paths
            .into_iter()
            .filter(|p| !self.tracked.contains(p) && !self.untracked.contains(p))
            .collect();
    }

    /// Remember `previous` as the alternate for `jump`.
    pub fn remember_jump(&mut self, previous: &RepoContext) {
        self.jump = Some(Box::new(previous.endpoint()));
    }
}

/// Reads and writes the ContextStore record for one repository root.
#[derive(Debug, Clone)]
pub struct ContextStore {
    path: PathBuf,
}

impl ContextStore {
    /// Store for the repository rooted at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            path: paths::context_file_path(root),
        }
    }

    /// Path of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the record exists on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and parse the record.
    ///
    /// Returns `None` when no record exists. Never fails: unreadable content
    /// is reported as a warning on an empty outcome.
    pub fn read(&self) -> Option<ParseOutcome> {
        match fs::read(&self.path) {
            Ok(bytes) => {
                let outcome = ContextFile::parse(&bytes);
                for warning in &outcome.warnings {
                    tracing::debug!(path = %self.path.display(), "{}", warning);
                }
                Some(outcome)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "context file unreadable");
                Some(ParseOutcome {
                    file: ContextFile::default(),
                    warnings: vec![format!("context file unreadable: {e}")],
                })
            }
        }
    }

    /// Write the record atomically (temp file, fsync, rename).
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Write` if any step fails.
    pub fn save(&self, ctx: &RepoContext) -> Result<(), ContextError> {
        let contents = ctx.to_file().render();
        let temp_path = self
            .path
            .with_file_name(format!("{}.tmp", paths::CONTEXT_FILE_NAME));
        let write_err = |source| ContextError::Write {
            path: self.path.clone(),
            source,
        };

        let mut file = fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(contents.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(write_err)?;
        tracing::debug!(path = %self.path.display(), "context saved");
        Ok(())
    }

    /// Remove the record. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns `ContextError::Delete` if the file exists but cannot be removed.
    pub fn delete(&self) -> Result<(), ContextError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ContextError::Delete {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
