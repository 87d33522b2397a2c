//! engine::workspace
//!
//! Runs every engine stage against one repository handle and collects the
//! result for the summary and for mutating verbs.
//!
//! # Flow
//!
//! ```text
//! status + HEAD ──┐
//! nested scan ────┼─> working deltas ─> unify ─┐
//!                 │                            ├─> classify ─> report
//! remote tip ─────┼─> committed deltas ─> unify┘
//!                 └─> incoming deltas ─> unify ─> report
//!                                   sync state ─> report
//! ```
//!
//! The working context is filtered before unification: the store file,
//! nested repositories and paths the user decided to leave untracked never
//! become change entries.

use std::collections::BTreeSet;

use crate::core::config::RenamePairing;
use crate::core::context::RepoContext;
use crate::core::paths;
use crate::core::types::{Oid, RepoPath};
use crate::git::{DiffDelta, GitError, Vcs, VcsStatus};

use super::classify::{find_nested_roots, ClassifyInput, FileClassification};
use super::renames::{unify, UnifiedChanges};
use super::sync_state::{self, SyncReport};

/// Knobs for [`build`].
#[derive(Debug, Clone)]
pub struct WorkspaceOptions {
    pub pairing: RenamePairing,
    /// Remote name used for the tracking ref.
    pub remote: String,
    /// Also list the commits behind the sync counts.
    pub with_commits: bool,
}

impl Default for WorkspaceOptions {
    fn default() -> Self {
        Self {
            pairing: RenamePairing::default(),
            remote: "origin".to_string(),
            with_commits: false,
        }
    }
}

/// Everything one invocation knows about the workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceReport {
    pub context: RepoContext,
    pub status: VcsStatus,
    pub head: Option<Oid>,
    pub classification: FileClassification,
    pub changes: UnifiedChanges,
    pub sync: SyncReport,
}

impl WorkspaceReport {
    /// Tracked paths whose working-tree state differs from the index.
    pub fn paths_to_stage(&self) -> Vec<RepoPath> {
        let status = &self.status;
        self.classification
            .tracked
            .iter()
            .filter(|p| {
                status.modified.contains(*p)
                    || status.missing.contains(*p)
                    || status.untracked.contains(*p)
            })
            .cloned()
            .collect()
    }

    /// True when there is anything to commit.
    pub fn has_pending_changes(&self) -> bool {
        !self.status.is_clean() || !self.paths_to_stage().is_empty()
    }
}

/// Build the report for `ctx` from `vcs`.
///
/// # Errors
///
/// Returns the first git failure from status or diff queries. Sync
/// problems do not fail; they show up as `SyncState::Error`.
pub fn build(
    vcs: &dyn Vcs,
    ctx: &RepoContext,
    options: &WorkspaceOptions,
) -> Result<WorkspaceReport, GitError> {
    let status = vcs.status()?;
    let head = vcs.head_oid()?;
    let head_paths = vcs.head_paths()?;
    let nested = find_nested_roots(vcs.work_dir());

    let upstream = match head {
        Some(_) => upstream(vcs, ctx, &options.remote),
        None => Upstream::Unknown,
    };
    let committed = committed_deltas(vcs, head.as_ref(), &upstream)?;
    let incoming = incoming_deltas(vcs, head.as_ref(), &upstream)?;
    let working = working_deltas(vcs, ctx, &nested, head.as_ref())?;
    let changes = UnifiedChanges::new(
        unify(&committed, options.pairing),
        unify(&working, options.pairing),
    )
    .with_incoming(unify(&incoming, options.pairing));

    let rename_targets = changes.working.rename_targets();
    let classification = FileClassification::classify(ClassifyInput {
        status: &status,
        head_paths: &head_paths,
        context: ctx,
        nested_roots: &nested,
        rename_targets: &rename_targets,
    });

    let sync = sync_state::report(vcs, ctx, &options.remote, options.with_commits);

    Ok(WorkspaceReport {
        context: ctx.clone(),
        status,
        head,
        classification,
        changes,
        sync,
    })
}

/// What the remote-tracking ref says about the context's remote branch.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Upstream {
    /// No remote, or the ref could not be read.
    Unknown,
    /// The remote has no such branch yet.
    Missing,
    At(Oid),
}

fn upstream(vcs: &dyn Vcs, ctx: &RepoContext, remote: &str) -> Upstream {
    if !ctx.has_remote() {
        return Upstream::Unknown;
    }
    let upstream_ref = ctx.effective_remote_branch().remote_ref(remote);
    match vcs.resolve_ref(&upstream_ref) {
        Ok(Some(tip)) => Upstream::At(tip),
        Ok(None) => Upstream::Missing,
        Err(err) => {
            tracing::debug!(error = %err, upstream = %upstream_ref, "cannot resolve remote tip");
            Upstream::Unknown
        }
    }
}

/// Deltas for local commits the remote doesn't have yet.
///
/// No HEAD or no remote: nothing. Remote branch absent: everything since
/// the empty tree. Otherwise the merge base against HEAD.
fn committed_deltas(
    vcs: &dyn Vcs,
    head: Option<&Oid>,
    upstream: &Upstream,
) -> Result<Vec<DiffDelta>, GitError> {
    let Some(head) = head else {
        return Ok(Vec::new());
    };
    let base = match upstream {
        Upstream::Unknown => return Ok(Vec::new()),
        Upstream::Missing => None,
        Upstream::At(tip) if tip == head => return Ok(Vec::new()),
        Upstream::At(tip) => vcs.merge_base(head, tip)?,
    };
    tracing::debug!(base = ?base.as_ref().map(|b| b.short(7).to_string()), "committed context base");
    vcs.diff_trees(base.as_ref(), head)
}

/// Deltas a pull would bring in: the merge base against the remote tip.
///
/// Empty without a remote tip, or when HEAD already contains it.
fn incoming_deltas(
    vcs: &dyn Vcs,
    head: Option<&Oid>,
    upstream: &Upstream,
) -> Result<Vec<DiffDelta>, GitError> {
    let (Some(head), Upstream::At(tip)) = (head, upstream) else {
        return Ok(Vec::new());
    };
    if tip == head {
        return Ok(Vec::new());
    }
    let base = vcs.merge_base(head, tip)?;
    if base.as_ref() == Some(tip) {
        return Ok(Vec::new());
    }
    tracing::debug!(base = ?base.as_ref().map(|b| b.short(7).to_string()), "incoming context base");
    vcs.diff_trees(base.as_ref(), tip)
}

/// HEAD (or the empty tree) against the working tree, minus paths that
/// never become change entries.
fn working_deltas(
    vcs: &dyn Vcs,
    ctx: &RepoContext,
    nested: &BTreeSet<RepoPath>,
    head: Option<&Oid>,
) -> Result<Vec<DiffDelta>, GitError> {
    let store_file = paths::context_repo_path();
    let excluded = |p: &RepoPath| {
        *p == store_file
            || ctx.untracked.contains(p)
            || nested.iter().any(|root| p.is_within(root))
    };

    Ok(vcs
        .diff_tree_to_working_tree(head)?
        .into_iter()
        .filter(|delta| !excluded(&delta.path))
        .filter(|delta| delta.source.as_ref().map_or(true, |s| !excluded(s)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{BranchName, ChangeEntry};
    use crate::engine::sync_state::SyncState;
    use crate::git::{DeltaKind, MockVcs};

    fn p(s: &str) -> RepoPath {
        RepoPath::new(s).unwrap()
    }

    fn local_ctx() -> RepoContext {
        RepoContext::new("/repo", BranchName::new("main").unwrap())
    }

    fn remote_ctx() -> RepoContext {
        local_ctx().with_remote("https://example.com/r.git", None)
    }

    mod working {
        use super::*;

        #[test]
        fn uncommitted_rename_is_one_entry() {
            let mut vcs = MockVcs::new("/nonexistent-vgl-test-root");
            vcs.head = Some(MockVcs::oid(1));
            vcs.head_paths = [p("a.txt")].into_iter().collect();
            vcs.status.missing.insert(p("a.txt"));
            vcs.status.untracked.insert(p("b.txt"));
            vcs.working_diff = vec![
                DiffDelta::new(DeltaKind::Deleted, p("a.txt")),
                DiffDelta::new(DeltaKind::Untracked, p("b.txt")),
            ];

            let report = build(&vcs, &local_ctx(), &WorkspaceOptions::default()).unwrap();
            assert_eq!(
                report.changes.working.renamed,
                vec![ChangeEntry::renamed(p("a.txt"), p("b.txt"))]
            );
            assert!(report.changes.working.added.is_empty());
            assert!(report.changes.working.deleted.is_empty());
            assert!(report.classification.tracked.contains(&p("b.txt")));
            assert!(report.classification.undecided.is_empty());
            assert_eq!(report.paths_to_stage(), vec![p("a.txt"), p("b.txt")]);
        }

        #[test]
        fn decided_untracked_and_store_file_filtered() {
            let mut vcs = MockVcs::new("/nonexistent-vgl-test-root");
            vcs.status.untracked = [p(".vgl"), p("scratch.log"), p("new.rs")]
                .into_iter()
                .collect();
            vcs.working_diff = vec![
                DiffDelta::new(DeltaKind::Untracked, p(".vgl")),
                DiffDelta::new(DeltaKind::Untracked, p("scratch.log")),
                DiffDelta::new(DeltaKind::Untracked, p("new.rs")),
            ];
            let mut ctx = local_ctx();
            ctx.mark_untracked(p("scratch.log"));

            let report = build(&vcs, &ctx, &WorkspaceOptions::default()).unwrap();
            assert!(report.changes.working.is_empty());
            assert_eq!(
                report.classification.untracked,
                [p("scratch.log")].into_iter().collect()
            );
            assert_eq!(
                report.classification.undecided,
                [p("new.rs")].into_iter().collect()
            );
            assert_eq!(report.sync.state, SyncState::LocalOnly);
        }
    }

    mod committed {
        use super::*;

        fn ahead_vcs() -> MockVcs {
            let mut vcs = MockVcs::new("/nonexistent-vgl-test-root");
            vcs.head = Some(MockVcs::oid(3));
            vcs.refs.insert("refs/heads/main".into(), MockVcs::oid(3));
            vcs
        }

        #[test]
        fn local_only_has_no_committed_context() {
            let mut vcs = ahead_vcs();
            vcs.tree_diffs.insert(
                (None, MockVcs::oid(3)),
                vec![DiffDelta::new(DeltaKind::Added, p("a.txt"))],
            );
            let report = build(&vcs, &local_ctx(), &WorkspaceOptions::default()).unwrap();
            assert!(report.changes.committed.is_empty());
        }

        #[test]
        fn missing_remote_branch_diffs_from_empty_tree() {
            let mut vcs = ahead_vcs();
            vcs.tree_diffs.insert(
                (None, MockVcs::oid(3)),
                vec![DiffDelta::new(DeltaKind::Added, p("a.txt"))],
            );
            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            assert_eq!(
                report.changes.committed.added,
                vec![ChangeEntry::added(p("a.txt"))]
            );
            assert_eq!(report.sync.state, SyncState::RemoteBranchMissing);
        }

        #[test]
        fn diffs_from_merge_base() {
            let mut vcs = ahead_vcs();
            vcs.refs
                .insert("refs/remotes/origin/main".into(), MockVcs::oid(2));
            vcs.merge_bases
                .insert((MockVcs::oid(3), MockVcs::oid(2)), MockVcs::oid(1));
            vcs.tree_diffs.insert(
                (Some(MockVcs::oid(1)), MockVcs::oid(3)),
                vec![DiffDelta::moved(DeltaKind::Renamed, p("old.rs"), p("new.rs"))],
            );

            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            assert_eq!(
                report.changes.committed.renamed,
                vec![ChangeEntry::renamed(p("old.rs"), p("new.rs"))]
            );
        }

        #[test]
        fn in_sync_has_no_committed_context() {
            let mut vcs = ahead_vcs();
            vcs.refs
                .insert("refs/remotes/origin/main".into(), MockVcs::oid(3));
            vcs.tree_diffs.insert(
                (None, MockVcs::oid(3)),
                vec![DiffDelta::new(DeltaKind::Added, p("a.txt"))],
            );
            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            assert!(report.changes.committed.is_empty());
            assert_eq!(report.sync.state, SyncState::InSync);
        }

        #[test]
        fn unpushed_addition_then_working_rename_is_one_rename() {
            let mut vcs = ahead_vcs();
            vcs.head_paths = [p("a.txt")].into_iter().collect();
            vcs.status.missing.insert(p("a.txt"));
            vcs.status.untracked.insert(p("b.txt"));
            vcs.tree_diffs.insert(
                (None, MockVcs::oid(3)),
                vec![DiffDelta::new(DeltaKind::Added, p("a.txt"))],
            );
            vcs.working_diff = vec![
                DiffDelta::new(DeltaKind::Deleted, p("a.txt")),
                DiffDelta::new(DeltaKind::Untracked, p("b.txt")),
            ];

            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            let entries: Vec<String> = report.changes.entries().map(|e| e.to_string()).collect();
            assert_eq!(entries, vec!["R a.txt -> b.txt"]);
        }
    }

    mod incoming {
        use super::*;

        fn diverged_vcs() -> MockVcs {
            let mut vcs = MockVcs::new("/nonexistent-vgl-test-root");
            vcs.head = Some(MockVcs::oid(3));
            vcs.refs.insert("refs/heads/main".into(), MockVcs::oid(3));
            vcs.refs
                .insert("refs/remotes/origin/main".into(), MockVcs::oid(2));
            vcs
        }

        #[test]
        fn lists_remote_changes_from_merge_base() {
            let mut vcs = diverged_vcs();
            vcs.merge_bases
                .insert((MockVcs::oid(3), MockVcs::oid(2)), MockVcs::oid(1));
            vcs.tree_diffs.insert(
                (Some(MockVcs::oid(1)), MockVcs::oid(2)),
                vec![DiffDelta::new(DeltaKind::Added, p("theirs.txt"))],
            );

            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            assert_eq!(
                report.changes.incoming.added,
                vec![ChangeEntry::added(p("theirs.txt"))]
            );
            assert_eq!(report.changes.entries().count(), 0);
        }

        #[test]
        fn nothing_incoming_when_head_contains_the_remote_tip() {
            let mut vcs = diverged_vcs();
            vcs.merge_bases
                .insert((MockVcs::oid(3), MockVcs::oid(2)), MockVcs::oid(2));
            vcs.tree_diffs.insert(
                (None, MockVcs::oid(2)),
                vec![DiffDelta::new(DeltaKind::Added, p("old.txt"))],
            );

            let report = build(&vcs, &remote_ctx(), &WorkspaceOptions::default()).unwrap();
            assert!(report.changes.incoming.is_empty());
        }

        #[test]
        fn local_only_has_nothing_incoming() {
            let vcs = diverged_vcs();
            let report = build(&vcs, &local_ctx(), &WorkspaceOptions::default()).unwrap();
            assert!(report.changes.incoming.is_empty());
        }
    }
}
