//! git::traits
//!
//! The narrow VCS interface consumed by the reconciliation engine.
//!
//! # Architecture
//!
//! Engine stages take `&dyn Vcs` and never see `git2` types. [`Git`]
//! implements it over libgit2; [`MockVcs`] implements it in memory for
//! unit tests.
//!
//! [`Git`]: super::Git
//! [`MockVcs`]: super::MockVcs

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::GitError;
use crate::core::types::{BranchName, Oid, RepoPath};

/// Raw status sets for one working tree.
///
/// Names follow the index/working-tree split: `added`, `changed` and
/// `removed` compare HEAD to the index; `modified` and `missing` compare
/// the index to the working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcsStatus {
    pub added: BTreeSet<RepoPath>,
    pub changed: BTreeSet<RepoPath>,
    pub modified: BTreeSet<RepoPath>,
    pub removed: BTreeSet<RepoPath>,
    pub missing: BTreeSet<RepoPath>,
    pub conflicting: BTreeSet<RepoPath>,
    pub untracked: BTreeSet<RepoPath>,
    pub ignored: BTreeSet<RepoPath>,
}

impl VcsStatus {
    /// Paths the VCS already knows about, from any index comparison.
    pub fn known(&self) -> impl Iterator<Item = &RepoPath> {
        self.added
            .iter()
            .chain(&self.changed)
            .chain(&self.modified)
            .chain(&self.removed)
            .chain(&self.missing)
            .chain(&self.conflicting)
    }

    /// True when nothing is staged or modified. Untracked files don't count.
    pub fn is_clean(&self) -> bool {
        self.known().next().is_none()
    }
}

/// Kind of a raw diff entry, before rename unification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Untracked,
}

/// One raw diff entry. `source` is set for renames and copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiffDelta {
    pub kind: DeltaKind,
    pub path: RepoPath,
    pub source: Option<RepoPath>,
}

impl DiffDelta {
    pub fn new(kind: DeltaKind, path: RepoPath) -> Self {
        Self {
            kind,
            path,
            source: None,
        }
    }

    pub fn moved(kind: DeltaKind, source: RepoPath, path: RepoPath) -> Self {
        Self {
            kind,
            path,
            source: Some(source),
        }
    }
}

/// Commits on each side of a local/upstream pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AheadBehind {
    pub ahead: usize,
    pub behind: usize,
}

/// Information about a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    /// The commit OID
    pub oid: Oid,
    /// First line of the commit message
    pub summary: String,
    /// Author name
    pub author_name: String,
    /// Author timestamp
    pub author_time: chrono::DateTime<chrono::Utc>,
}

/// A branch's configured upstream (`branch.<name>.remote` / `.merge`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchUpstream {
    pub remote: Option<String>,
    pub merge: Option<BranchName>,
}

/// Read-side VCS operations used by the engine.
pub trait Vcs {
    /// Root of the working tree.
    fn work_dir(&self) -> &Path;

    /// Raw status sets, untracked and ignored included.
    fn status(&self) -> Result<VcsStatus, GitError>;

    /// HEAD commit, or `None` for an unborn branch.
    fn head_oid(&self) -> Result<Option<Oid>, GitError>;

    /// Every file path in the HEAD tree. Empty for an unborn branch.
    fn head_paths(&self) -> Result<BTreeSet<RepoPath>, GitError>;

    /// Tree-to-tree diff with native rename and copy detection. `old` of
    /// `None` means the empty tree.
    fn diff_trees(&self, old: Option<&Oid>, new: &Oid) -> Result<Vec<DiffDelta>, GitError>;

    /// Diff from `old` (or the empty tree) to the working tree through the
    /// index, untracked files included as rename candidates.
    fn diff_tree_to_working_tree(&self, old: Option<&Oid>) -> Result<Vec<DiffDelta>, GitError>;

    /// Resolve a ref to a commit, `None` when it doesn't exist.
    fn resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError>;

    /// Ahead/behind counts of `branch` against `upstream_ref`, `None` when
    /// either side doesn't exist.
    fn tracking_status(
        &self,
        branch: &BranchName,
        upstream_ref: &str,
    ) -> Result<Option<AheadBehind>, GitError>;

    /// Best common ancestor of two commits, `None` for unrelated histories.
    fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError>;

    /// Commits reachable from `tip` but not from `base`, newest first.
    fn commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<CommitInfo>, GitError>;

    /// Branch HEAD points at, born or unborn. `None` when detached.
    fn current_branch(&self) -> Result<Option<BranchName>, GitError>;

    /// URL of the named remote.
    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError>;

    /// Name of the first remote whose URL equals `url`.
    fn remote_for_url(&self, url: &str) -> Result<Option<String>, GitError>;

    /// Preferred remote: `origin` if present, otherwise the first one.
    fn default_remote(&self) -> Result<Option<String>, GitError>;

    /// Upstream configuration of a local branch.
    fn branch_upstream(&self, branch: &BranchName) -> Result<BranchUpstream, GitError>;
}
