//! git::interface
//!
//! Git interface implementation using git2.
//!
//! # Architecture
//!
//! The `Git` struct is the only way to read a Git repository. No other
//! module imports `git2`. Commands that must go through the network or
//! the user's hooks use [`super::remote`] instead.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist
//! - [`GitError::ObjectNotFound`]: Requested object does not exist
//! - [`GitError::CommandFailed`]: A `git` subprocess failed
//!
//! # Example
//!
//! ```ignore
//! use vgl::git::{Git, Vcs};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if let Some(oid) = git.head_oid()? {
//!     println!("HEAD is at {}", oid.short(7));
//! }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::traits::{
    AheadBehind, BranchUpstream, CommitInfo, DeltaKind, DiffDelta, Vcs, VcsStatus,
};
use crate::core::types::{BranchName, Oid, RepoPath, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// A value read from the repository failed validation.
    #[error("invalid value from repository: {message}")]
    InvalidValue {
        /// Description of the problem
        message: String,
    },

    /// A `git` subprocess exited unsuccessfully or could not start.
    #[error("{command} failed: {message}")]
    CommandFailed {
        /// The command line, for display
        command: String,
        /// stderr or the spawn error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            other => GitError::InvalidValue {
                message: other.to_string(),
            },
        }
    }
}

/// The Git interface.
///
/// Holds one open repository for the duration of a command. Dropping it
/// releases the handle.
pub struct Git {
    repo: git2::Repository,
    work_dir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
    git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
}

fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
    Oid::new(oid.to_string()).map_err(GitError::from)
}

fn delta_path(file: git2::DiffFile<'_>) -> Option<RepoPath> {
    file.path().and_then(|p| RepoPath::from_relative(p).ok())
}

fn collect_deltas(diff: &git2::Diff<'_>) -> Vec<DiffDelta> {
    diff.deltas()
        .filter_map(|delta| {
            let kind = match delta.status() {
                git2::Delta::Added => DeltaKind::Added,
                git2::Delta::Deleted => DeltaKind::Deleted,
                git2::Delta::Modified | git2::Delta::Typechange | git2::Delta::Conflicted => {
                    DeltaKind::Modified
                }
                git2::Delta::Renamed => DeltaKind::Renamed,
                git2::Delta::Copied => DeltaKind::Copied,
                git2::Delta::Untracked => DeltaKind::Untracked,
                _ => return None,
            };
            let path = delta_path(delta.new_file()).or_else(|| delta_path(delta.old_file()))?;
            let source = match kind {
                DeltaKind::Renamed | DeltaKind::Copied => delta_path(delta.old_file()),
                _ => None,
            };
            Some(DiffDelta { kind, path, source })
        })
        .collect()
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Self::from_repo(repo)
    }

    /// Initialize a new repository at `path` with HEAD on `branch`.
    pub fn init(path: &Path, branch: &BranchName) -> Result<Self, GitError> {
        let mut opts = git2::RepositoryInitOptions::new();
        opts.initial_head(branch.as_str());
        let repo = git2::Repository::init_opts(path, &opts)
            .map_err(|e| GitError::from_git2(e, &path.display().to_string()))?;
        Self::from_repo(repo)
    }

    fn from_repo(repo: git2::Repository) -> Result<Self, GitError> {
        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        Ok(Self { repo, work_dir })
    }

    /// Path of the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Check if a local branch exists.
    pub fn branch_exists(&self, branch: &BranchName) -> bool {
        self.repo
            .find_branch(branch.as_str(), git2::BranchType::Local)
            .is_ok()
    }

    /// List all local branches.
    pub fn list_branches(&self) -> Result<Vec<BranchName>, GitError> {
        let branches = self.repo.branches(Some(git2::BranchType::Local))?;

        let mut names = Vec::new();
        for branch in branches {
            let (branch, _) = branch?;
            if let Some(name) = branch.name().ok().flatten() {
                if let Ok(branch_name) = BranchName::new(name) {
                    names.push(branch_name);
                }
            }
        }
        Ok(names)
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Add paths to the index. Paths missing from the working tree are
    /// removed from the index instead.
    pub fn stage_paths(&self, paths: &[RepoPath]) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        for path in paths {
            let relative = Path::new(path.as_str());
            if path.under(&self.work_dir).exists() {
                index
                    .add_path(relative)
                    .map_err(|e| GitError::from_git2(e, path.as_str()))?;
            } else {
                index
                    .remove_path(relative)
                    .map_err(|e| GitError::from_git2(e, path.as_str()))?;
            }
        }
        index.write()?;
        Ok(())
    }

    /// Remove paths from the index, leaving the working tree alone.
    pub fn unstage_paths(&self, paths: &[RepoPath]) -> Result<(), GitError> {
        let mut index = self.repo.index()?;
        for path in paths {
            index
                .remove_path(Path::new(path.as_str()))
                .map_err(|e| GitError::from_git2(e, path.as_str()))?;
        }
        index.write()?;
        Ok(())
    }

    // =========================================================================
    // Commit Information
    // =========================================================================

    /// Get information about a commit.
    pub fn commit_info(&self, oid: &Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        let author = commit.author();
        let author_time = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH);

        Ok(CommitInfo {
            oid: oid.clone(),
            summary: commit.summary().unwrap_or("").to_string(),
            author_name: author.name().unwrap_or("").to_string(),
            author_time,
        })
    }

    /// Commits reachable from HEAD, newest first, at most `limit`.
    ///
    /// Empty on an unborn branch.
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<CommitInfo>, GitError> {
        let Some(head) = self.head_oid()? else {
            return Ok(Vec::new());
        };
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(to_git2(&head)?)?;

        let mut commits = Vec::new();
        for oid in revwalk.take(limit.unwrap_or(usize::MAX)) {
            commits.push(self.commit_info(&from_git2_oid(oid?)?)?);
        }
        Ok(commits)
    }

    /// True while a merge is stopped on conflicts.
    pub fn merge_in_progress(&self) -> bool {
        self.repo.state() == git2::RepositoryState::Merge
    }

    fn commit_tree(&self, oid: &Oid) -> Result<git2::Tree<'_>, GitError> {
        let commit = self
            .repo
            .find_commit(to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;
        commit
            .tree()
            .map_err(|e| GitError::from_git2(e, oid.as_str()))
    }
}

impl Vcs for Git {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn status(&self) -> Result<VcsStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(true)
            .recurse_ignored_dirs(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut result = VcsStatus::default();
        for entry in statuses.iter() {
            let Some(path) = entry.path().and_then(|p| RepoPath::new(p).ok()) else {
                tracing::debug!(path = ?entry.path(), "skipping unrepresentable status path");
                continue;
            };
            let status = entry.status();

            if status.is_conflicted() {
                result.conflicting.insert(path.clone());
            }
            if status.is_index_new() {
                result.added.insert(path.clone());
            }
            if status.is_index_modified() || status.is_index_renamed() || status.is_index_typechange()
            {
                result.changed.insert(path.clone());
            }
            if status.is_index_deleted() {
                result.removed.insert(path.clone());
            }
            if status.is_wt_modified() || status.is_wt_typechange() || status.is_wt_renamed() {
                result.modified.insert(path.clone());
            }
            if status.is_wt_deleted() {
                result.missing.insert(path.clone());
            }
            if status.is_wt_new() {
                result.untracked.insert(path.clone());
            }
            if status.is_ignored() {
                result.ignored.insert(path);
            }
        }
        Ok(result)
    }

    fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e)
                if e.code() == git2::ErrorCode::UnbornBranch
                    || e.code() == git2::ErrorCode::NotFound =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, "HEAD")),
        };
        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;
        Ok(Some(from_git2_oid(commit.id())?))
    }

    fn head_paths(&self) -> Result<BTreeSet<RepoPath>, GitError> {
        let Some(head) = self.head_oid()? else {
            return Ok(BTreeSet::new());
        };
        let tree = self.commit_tree(&head)?;

        let mut paths = BTreeSet::new();
        tree.walk(git2::TreeWalkMode::PreOrder, |root, entry| {
            let is_file = matches!(
                entry.kind(),
                Some(git2::ObjectType::Blob) | Some(git2::ObjectType::Commit)
            );
            if is_file {
                if let Some(path) = entry
                    .name()
                    .and_then(|name| RepoPath::new(format!("{root}{name}")).ok())
                {
                    paths.insert(path);
                }
            }
            git2::TreeWalkResult::Ok
        })?;
        Ok(paths)
    }

    fn diff_trees(&self, old: Option<&Oid>, new: &Oid) -> Result<Vec<DiffDelta>, GitError> {
        let old_tree = old.map(|oid| self.commit_tree(oid)).transpose()?;
        let new_tree = self.commit_tree(new)?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;
        let mut find = git2::DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))?;

        Ok(collect_deltas(&diff))
    }

    fn diff_tree_to_working_tree(&self, old: Option<&Oid>) -> Result<Vec<DiffDelta>, GitError> {
        let old_tree = old.map(|oid| self.commit_tree(oid)).transpose()?;

        let mut opts = git2::DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let mut diff = self
            .repo
            .diff_tree_to_workdir_with_index(old_tree.as_ref(), Some(&mut opts))?;

        let mut find = git2::DiffFindOptions::new();
        find.renames(true).copies(true).for_untracked(true);
        diff.find_similar(Some(&mut find))?;

        Ok(collect_deltas(&diff))
    }

    fn resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        let reference = match self.repo.find_reference(refname) {
            Ok(reference) => reference,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, refname)),
        };
        match reference.peel_to_commit() {
            Ok(commit) => Ok(Some(from_git2_oid(commit.id())?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, refname)),
        }
    }

    fn tracking_status(
        &self,
        branch: &BranchName,
        upstream_ref: &str,
    ) -> Result<Option<AheadBehind>, GitError> {
        let local = self.resolve_ref(&branch.local_ref())?;
        let upstream = self.resolve_ref(upstream_ref)?;
        let (Some(local), Some(upstream)) = (local, upstream) else {
            return Ok(None);
        };

        let (ahead, behind) = self
            .repo
            .graph_ahead_behind(to_git2(&local)?, to_git2(&upstream)?)?;
        Ok(Some(AheadBehind { ahead, behind }))
    }

    fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError> {
        match self.repo.merge_base(to_git2(a)?, to_git2(b)?) {
            Ok(base) => Ok(Some(from_git2_oid(base)?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, a.as_str())),
        }
    }

    fn commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<CommitInfo>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::TIME)?;
        revwalk.push(to_git2(tip)?)?;
        revwalk.hide(to_git2(base)?)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            commits.push(self.commit_info(&from_git2_oid(oid?)?)?);
        }
        Ok(commits)
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        let head = self
            .repo
            .find_reference("HEAD")
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        Ok(head
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/heads/"))
            .and_then(|name| BranchName::new(name).ok()))
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        match self.repo.find_remote(name) {
            Ok(remote) => Ok(remote.url().map(String::from)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, name)),
        }
    }

    fn remote_for_url(&self, url: &str) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;
        for name in remotes.iter().flatten() {
            if self.remote_url(name)?.as_deref() == Some(url) {
                return Ok(Some(name.to_string()));
            }
        }
        Ok(None)
    }

    fn default_remote(&self) -> Result<Option<String>, GitError> {
        let remotes = self.repo.remotes()?;

        if remotes.iter().flatten().any(|name| name == "origin") {
            return Ok(Some("origin".to_string()));
        }
        Ok(remotes.iter().flatten().next().map(String::from))
    }

    fn branch_upstream(&self, branch: &BranchName) -> Result<BranchUpstream, GitError> {
        let config = self.repo.config()?;

        let remote = config
            .get_string(&format!("branch.{}.remote", branch))
            .ok()
            .filter(|remote| remote != ".");
        let merge = config
            .get_string(&format!("branch.{}.merge", branch))
            .ok()
            .and_then(|merge| {
                let name = merge.strip_prefix("refs/heads/").unwrap_or(&merge);
                BranchName::new(name).ok()
            });

        Ok(BranchUpstream { remote, merge })
    }
}
