//! engine::sync_state
//!
//! SyncStateCalculator: where the local branch stands against its remote
//! counterpart.
//!
//! # Transitions
//!
//! Checked in order, first match wins:
//!
//! | Condition                               | State                 |
//! |-----------------------------------------|-----------------------|
//! | no remote URL in the context            | `LocalOnly`           |
//! | no HEAD commit                          | `NoCommits`           |
//! | remote-tracking ref absent              | `RemoteBranchMissing` |
//! | HEAD equals the remote tip              | `InSync`              |
//! | ahead = behind = 0                      | `InSync`              |
//! | ahead > 0, behind = 0                   | `Ahead(ahead)`        |
//! | ahead = 0, behind > 0                   | `Behind(behind)`      |
//! | both > 0                                | `Diverged`            |
//!
//! Any VCS failure along the way becomes `Error(message)`. Nothing here
//! returns `Err`.

use std::fmt;

use serde::Serialize;

use crate::core::context::RepoContext;
use crate::git::{CommitInfo, GitCli, Vcs};

/// Local/remote synchronization state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    LocalOnly,
    NoCommits,
    RemoteBranchMissing,
    InSync,
    Ahead(usize),
    Behind(usize),
    Diverged { ahead: usize, behind: usize },
    Error(String),
}

fn commits(n: usize) -> &'static str {
    if n == 1 {
        "commit"
    } else {
        "commits"
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::LocalOnly => f.write_str("(local only)"),
            SyncState::NoCommits => f.write_str("(no commits yet)"),
            SyncState::RemoteBranchMissing => f.write_str("(remote branch not found)"),
            SyncState::InSync => f.write_str("in sync"),
            SyncState::Ahead(n) => write!(f, "{n} {} to push", commits(*n)),
            SyncState::Behind(n) => write!(f, "{n} {} to pull", commits(*n)),
            SyncState::Diverged { ahead, behind } => {
                write!(f, "{ahead} to push, {behind} to pull")
            }
            SyncState::Error(message) => write!(f, "(error: {message})"),
        }
    }
}

/// Sync state plus the commits behind the counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub state: SyncState,
    /// Remote name the counts were computed against.
    pub remote: Option<String>,
    pub to_push: Vec<CommitInfo>,
    pub to_pull: Vec<CommitInfo>,
}

impl SyncReport {
    fn bare(state: SyncState, remote: Option<String>) -> Self {
        Self {
            state,
            remote,
            to_push: Vec::new(),
            to_pull: Vec::new(),
        }
    }
}

/// Remote whose URL matches the context, else `default`.
pub fn remote_name_for(vcs: &dyn Vcs, ctx: &RepoContext, default: &str) -> String {
    let Some(url) = ctx.remote_url.as_deref() else {
        return default.to_string();
    };
    match vcs.remote_for_url(url) {
        Ok(Some(name)) => name,
        Ok(None) => default.to_string(),
        Err(err) => {
            tracing::debug!(error = %err, "remote lookup failed; using default remote name");
            default.to_string()
        }
    }
}

/// `git fetch --quiet <remote>`, logging instead of failing.
pub fn fetch_best_effort(cli: &GitCli, remote: &str) -> bool {
    match cli.fetch(remote) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(remote, error = %err, "fetch failed; using last known remote state");
            false
        }
    }
}

/// Compute the state only.
pub fn compute(vcs: &dyn Vcs, ctx: &RepoContext, remote: &str) -> SyncState {
    report(vcs, ctx, remote, false).state
}

/// Compute the state, and with `with_commits` the commit lists too.
pub fn report(vcs: &dyn Vcs, ctx: &RepoContext, remote: &str, with_commits: bool) -> SyncReport {
    if !ctx.has_remote() {
        return SyncReport::bare(SyncState::LocalOnly, None);
    }
    let remote_name = Some(remote.to_string());

    let head = match vcs.head_oid() {
        Ok(Some(head)) => head,
        Ok(None) => return SyncReport::bare(SyncState::NoCommits, remote_name),
        Err(err) => return SyncReport::bare(SyncState::Error(err.to_string()), remote_name),
    };

    let upstream_ref = ctx.effective_remote_branch().remote_ref(remote);
    let remote_tip = match vcs.resolve_ref(&upstream_ref) {
        Ok(Some(tip)) => tip,
        Ok(None) => return SyncReport::bare(SyncState::RemoteBranchMissing, remote_name),
        Err(err) => return SyncReport::bare(SyncState::Error(err.to_string()), remote_name),
    };
    if head == remote_tip {
        tracing::debug!(upstream = %upstream_ref, "HEAD is the remote tip");
        return SyncReport::bare(SyncState::InSync, remote_name);
    }

    let counts = match vcs.tracking_status(&ctx.local_branch, &upstream_ref) {
        Ok(Some(counts)) => counts,
        Ok(None) => {
            let message = format!("local branch '{}' not found", ctx.local_branch);
            return SyncReport::bare(SyncState::Error(message), remote_name);
        }
        Err(err) => return SyncReport::bare(SyncState::Error(err.to_string()), remote_name),
    };

    let state = match (counts.ahead, counts.behind) {
        (0, 0) => SyncState::InSync,
        (ahead, 0) => SyncState::Ahead(ahead),
        (0, behind) => SyncState::Behind(behind),
        (ahead, behind) => SyncState::Diverged { ahead, behind },
    };
    tracing::debug!(%state, upstream = %upstream_ref, "computed sync state");

    let mut report = SyncReport::bare(state, remote_name);
    if with_commits && report.state != SyncState::InSync {
        let local_tip = match vcs.resolve_ref(&ctx.local_branch.local_ref()) {
            Ok(Some(tip)) => tip,
            _ => head,
        };
        report.to_push = vcs
            .commits_between(&remote_tip, &local_tip)
            .unwrap_or_else(|err| {
                tracing::debug!(error = %err, "could not list commits to push");
                Vec::new()
            });
        report.to_pull = vcs
            .commits_between(&local_tip, &remote_tip)
            .unwrap_or_else(|err| {
                tracing::debug!(error = %err, "could not list commits to pull");
                Vec::new()
            });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::BranchName;
    use crate::git::{AheadBehind, MockVcs};

    fn remote_ctx() -> RepoContext {
        RepoContext::new("/repo", BranchName::new("main").unwrap())
            .with_remote("https://example.com/r.git", None)
    }

    fn vcs_with_refs() -> MockVcs {
        let mut vcs = MockVcs::new("/repo");
        vcs.head = Some(MockVcs::oid(1));
        vcs.refs.insert("refs/heads/main".into(), MockVcs::oid(1));
        vcs.refs
            .insert("refs/remotes/origin/main".into(), MockVcs::oid(2));
        vcs
    }

    mod transitions {
        use super::*;

        #[test]
        fn no_remote_is_local_only() {
            let vcs = MockVcs::new("/repo");
            let ctx = RepoContext::new("/repo", BranchName::new("main").unwrap());
            let state = compute(&vcs, &ctx, "origin");
            assert_eq!(state, SyncState::LocalOnly);
            assert_eq!(state.to_string(), "(local only)");
        }

        #[test]
        fn no_head_is_no_commits() {
            let vcs = MockVcs::new("/repo");
            assert_eq!(compute(&vcs, &remote_ctx(), "origin"), SyncState::NoCommits);
        }

        #[test]
        fn missing_remote_ref() {
            let mut vcs = vcs_with_refs();
            vcs.refs.remove("refs/remotes/origin/main");
            assert_eq!(
                compute(&vcs, &remote_ctx(), "origin"),
                SyncState::RemoteBranchMissing
            );
        }

        #[test]
        fn counts_map_to_states() {
            let cases = [
                ((0, 0), SyncState::InSync),
                ((2, 0), SyncState::Ahead(2)),
                ((0, 3), SyncState::Behind(3)),
                ((1, 4), SyncState::Diverged { ahead: 1, behind: 4 }),
            ];
            for ((ahead, behind), expected) in cases {
                let mut vcs = vcs_with_refs();
                vcs.ahead_behind = AheadBehind { ahead, behind };
                assert_eq!(compute(&vcs, &remote_ctx(), "origin"), expected);
            }
        }

        #[test]
        fn remote_branch_overrides_local_name() {
            let mut vcs = vcs_with_refs();
            vcs.refs
                .insert("refs/remotes/upstream/release".into(), MockVcs::oid(3));
            vcs.ahead_behind = AheadBehind { ahead: 0, behind: 1 };
            let ctx = RepoContext::new("/repo", BranchName::new("main").unwrap()).with_remote(
                "https://example.com/r.git",
                Some(BranchName::new("release").unwrap()),
            );
            assert_eq!(compute(&vcs, &ctx, "upstream"), SyncState::Behind(1));
        }

        #[test]
        fn failures_become_error_state() {
            let mut vcs = vcs_with_refs();
            vcs.fail_with = Some("object database corrupt".into());
            let state = compute(&vcs, &remote_ctx(), "origin");
            assert!(matches!(state, SyncState::Error(_)));
            assert!(state.to_string().starts_with("(error: "));
        }

        #[test]
        fn head_at_remote_tip_is_in_sync_whatever_the_branch_counts() {
            let mut vcs = vcs_with_refs();
            vcs.head = Some(MockVcs::oid(2));
            vcs.ahead_behind = AheadBehind { ahead: 3, behind: 1 };
            assert_eq!(compute(&vcs, &remote_ctx(), "origin"), SyncState::InSync);

            vcs.refs.remove("refs/heads/main");
            let report = report(&vcs, &remote_ctx(), "origin", true);
            assert_eq!(report.state, SyncState::InSync);
            assert!(report.to_push.is_empty());
        }

        #[test]
        fn unknown_local_branch_is_error() {
            let mut vcs = vcs_with_refs();
            vcs.refs.remove("refs/heads/main");
            assert!(matches!(
                compute(&vcs, &remote_ctx(), "origin"),
                SyncState::Error(_)
            ));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn strings() {
            assert_eq!(SyncState::NoCommits.to_string(), "(no commits yet)");
            assert_eq!(
                SyncState::RemoteBranchMissing.to_string(),
                "(remote branch not found)"
            );
            assert_eq!(SyncState::InSync.to_string(), "in sync");
            assert_eq!(SyncState::Ahead(1).to_string(), "1 commit to push");
            assert_eq!(SyncState::Ahead(2).to_string(), "2 commits to push");
            assert_eq!(SyncState::Behind(5).to_string(), "5 commits to pull");
            assert_eq!(
                SyncState::Diverged { ahead: 1, behind: 2 }.to_string(),
                "1 to push, 2 to pull"
            );
        }
    }

    mod report {
        use super::*;
        use crate::git::CommitInfo;

        #[test]
        fn lists_commits_when_asked() {
            let mut vcs = vcs_with_refs();
            vcs.ahead_behind = AheadBehind { ahead: 1, behind: 0 };
            let commit = CommitInfo {
                oid: MockVcs::oid(1),
                summary: "local work".into(),
                author_name: "Dev".into(),
                author_time: chrono::DateTime::UNIX_EPOCH,
            };
            vcs.commit_log
                .insert((MockVcs::oid(2), MockVcs::oid(1)), vec![commit.clone()]);

            let report = report(&vcs, &remote_ctx(), "origin", true);
            assert_eq!(report.state, SyncState::Ahead(1));
            assert_eq!(report.remote.as_deref(), Some("origin"));
            assert_eq!(report.to_push, vec![commit]);
            assert!(report.to_pull.is_empty());
        }

        #[test]
        fn remote_name_prefers_matching_url() {
            let mut vcs = MockVcs::new("/repo");
            vcs.remotes = vec![
                ("origin".into(), "https://example.com/other.git".into()),
                ("mine".into(), "https://example.com/r.git".into()),
            ];
            assert_eq!(remote_name_for(&vcs, &remote_ctx(), "origin"), "mine");

            let local = RepoContext::new("/repo", BranchName::new("main").unwrap());
            assert_eq!(remote_name_for(&vcs, &local, "origin"), "origin");
        }
    }
}
