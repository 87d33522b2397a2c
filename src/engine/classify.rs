//! engine::classify
//!
//! FileClassifier: partitions every known path into exactly one of
//! Tracked, Untracked, Undecided or Ignored.
//!
//! # Algorithm
//!
//! `skip(p)` holds for the ContextStore file and for any path equal to or
//! below a nested repository root.
//!
//! ```text
//! Tracked   = (HEAD ∪ added ∪ changed ∪ modified ∪ removed ∪ missing
//!              ∪ conflicting ∪ store.tracked) − skip − unstaged-by-user
//! Untracked = store.untracked − Tracked − skip
//! Ignored   = (vcs.ignored − Tracked − Untracked − skip) ∪ nested roots
//! Undecided = (vcs.untracked ∪ store.undecided)
//!              − Tracked − Untracked − Ignored − skip
//! ```
//!
//! `unstaged-by-user` is a path the store marks untracked that git also
//! reports as present but not in the index. Working-tree rename targets
//! that would be Undecided are promoted to Tracked.
//!
//! # Invariants
//!
//! - The four sections are pairwise disjoint
//! - Nested roots appear only in Ignored, annotated as repositories
//! - Nothing below a nested root appears at all

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use walkdir::WalkDir;

use crate::core::context::RepoContext;
use crate::core::paths::{self, VCS_DIR_NAME};
use crate::core::types::RepoPath;
use crate::git::VcsStatus;

/// Errors from classification policy checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("'{path}' is inside the nested repository '{repo}'; run vgl there instead")]
    NestedRepository { path: RepoPath, repo: RepoPath },
}

/// The section a path falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileClass {
    Tracked,
    Untracked,
    Undecided,
    Ignored,
}

/// Everything the classifier reads.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyInput<'a> {
    pub status: &'a VcsStatus,
    pub head_paths: &'a BTreeSet<RepoPath>,
    pub context: &'a RepoContext,
    pub nested_roots: &'a BTreeSet<RepoPath>,
    pub rename_targets: &'a BTreeSet<RepoPath>,
}

/// Section sizes, as shown on the compact FILES line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassCounts {
    pub tracked: usize,
    pub untracked: usize,
    pub undecided: usize,
    pub ignored: usize,
}

/// The four-way partition for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileClassification {
    pub tracked: BTreeSet<RepoPath>,
    pub untracked: BTreeSet<RepoPath>,
    pub undecided: BTreeSet<RepoPath>,
    /// Ignored plain paths. Nested roots are kept apart in `nested`.
    pub ignored: BTreeSet<RepoPath>,
    /// Nested repository roots, part of the Ignored section.
    pub nested: BTreeSet<RepoPath>,
    /// Paths the VCS reports as existing in some form.
    #[serde(skip)]
    live: BTreeSet<RepoPath>,
}

impl FileClassification {
    /// Compute the partition.
    pub fn classify(input: ClassifyInput<'_>) -> Self {
        let ClassifyInput {
            status,
            head_paths,
            context,
            nested_roots,
            rename_targets,
        } = input;

        let store_file = paths::context_repo_path();
        let skip = |p: &RepoPath| {
            *p == store_file || nested_roots.iter().any(|root| p.is_within(root))
        };
        let unstaged_by_user =
            |p: &RepoPath| context.untracked.contains(p) && status.untracked.contains(p);

        let mut tracked: BTreeSet<RepoPath> = head_paths
            .iter()
            .chain(status.known())
            .chain(&context.tracked)
            .filter(|&p| !skip(p) && !unstaged_by_user(p))
            .cloned()
            .collect();

        let untracked: BTreeSet<RepoPath> = context
            .untracked
            .iter()
            .filter(|&p| !skip(p) && !tracked.contains(p))
            .cloned()
            .collect();

        let ignored: BTreeSet<RepoPath> = status
            .ignored
            .iter()
            .filter(|&p| !skip(p) && !tracked.contains(p) && !untracked.contains(p))
            .cloned()
            .collect();

        let mut undecided: BTreeSet<RepoPath> = status
            .untracked
            .iter()
            .chain(&context.undecided)
            .filter(|&p| {
                !skip(p) && !tracked.contains(p) && !untracked.contains(p) && !ignored.contains(p)
            })
            .cloned()
            .collect();

        for target in rename_targets {
            if undecided.remove(target) {
                tracing::debug!(path = %target, "rename target promoted to tracked");
                tracked.insert(target.clone());
            }
        }

        let live = head_paths
            .iter()
            .chain(status.known())
            .chain(&status.untracked)
            .chain(&status.ignored)
            .cloned()
            .collect();

        let classification = Self {
            tracked,
            untracked,
            undecided,
            ignored,
            nested: nested_roots.clone(),
            live,
        };
        tracing::debug!(counts = ?classification.counts(), "classified paths");
        classification
    }

    /// Section of `path`, if it is classified at all.
    pub fn class_of(&self, path: &RepoPath) -> Option<FileClass> {
        if self.tracked.contains(path) {
            Some(FileClass::Tracked)
        } else if self.untracked.contains(path) {
            Some(FileClass::Untracked)
        } else if self.undecided.contains(path) {
            Some(FileClass::Undecided)
        } else if self.ignored.contains(path) || self.nested.contains(path) {
            Some(FileClass::Ignored)
        } else {
            None
        }
    }

    pub fn counts(&self) -> ClassCounts {
        ClassCounts {
            tracked: self.tracked.len(),
            untracked: self.untracked.len(),
            undecided: self.undecided.len(),
            ignored: self.ignored.len() + self.nested.len(),
        }
    }

    /// Nested root containing `path`, if any.
    pub fn nested_root_of(&self, path: &RepoPath) -> Option<&RepoPath> {
        self.nested.iter().find(|root| path.is_within(root))
    }

    /// Reject track/untrack/restore targets inside a nested repository.
    ///
    /// # Errors
    ///
    /// Returns [`ClassifyError::NestedRepository`] naming the nested root.
    pub fn ensure_not_nested(&self, path: &RepoPath) -> Result<(), ClassifyError> {
        match self.nested_root_of(path) {
            Some(repo) => Err(ClassifyError::NestedRepository {
                path: path.clone(),
                repo: repo.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Bring the store's decision sets in line with this classification.
    ///
    /// Decisions about paths that no longer exist anywhere are dropped, and
    /// the undecided list is replaced by the current Undecided section.
    /// Returns `true` if the context changed.
    pub fn reconcile(&self, ctx: &mut RepoContext) -> bool {
        let before = (
            ctx.tracked.clone(),
            ctx.untracked.clone(),
            ctx.undecided.clone(),
        );

        let keep = |p: &RepoPath| self.live.contains(p) && self.nested_root_of(p).is_none();
        ctx.tracked.retain(|p| keep(p));
        ctx.untracked.retain(|p| keep(p) && !self.tracked.contains(p));
        ctx.set_undecided(self.undecided.iter().filter(|&p| keep(p)).cloned());

        before != (
            ctx.tracked.clone(),
            ctx.untracked.clone(),
            ctx.undecided.clone(),
        )
    }
}

/// Find independent repository roots below `root`.
///
/// Never descends into `.git` directories or into a nested root once found.
/// Unreadable entries are logged and skipped.
pub fn find_nested_roots(root: &Path) -> BTreeSet<RepoPath> {
    let mut found = BTreeSet::new();
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != VCS_DIR_NAME);

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry during nested scan");
                continue;
            }
        };
        if !entry.file_type().is_dir() || !paths::is_vcs_root(entry.path()) {
            continue;
        }

        if let Some(path) = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(|rel| RepoPath::from_relative(rel).ok())
        {
            tracing::debug!(path = %path, "found nested repository");
            found.insert(path);
        }
        walker.skip_current_dir();
    }
    found
}
