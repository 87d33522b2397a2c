//! git::mock
//!
//! In-memory [`Vcs`] used by engine unit tests and property tests.
//!
//! Every field is public; tests build the repository state they need
//! directly instead of shelling out to `git`.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use super::traits::{AheadBehind, BranchUpstream, CommitInfo, DiffDelta, Vcs, VcsStatus};
use super::GitError;
use crate::core::types::{BranchName, Oid, RepoPath};

/// A scripted repository.
#[derive(Debug, Clone, Default)]
pub struct MockVcs {
    pub work_dir: PathBuf,
    pub status: VcsStatus,
    pub head: Option<Oid>,
    pub head_paths: BTreeSet<RepoPath>,
    /// (old, new) -> deltas
    pub tree_diffs: HashMap<(Option<Oid>, Oid), Vec<DiffDelta>>,
    pub working_diff: Vec<DiffDelta>,
    pub refs: HashMap<String, Oid>,
    pub ahead_behind: AheadBehind,
    /// (a, b) -> common ancestor; looked up in both orders
    pub merge_bases: HashMap<(Oid, Oid), Oid>,
    /// (base, tip) -> commits
    pub commit_log: HashMap<(Oid, Oid), Vec<CommitInfo>>,
    pub branch: Option<BranchName>,
    pub remotes: Vec<(String, String)>,
    pub upstreams: HashMap<BranchName, BranchUpstream>,
    /// When set, every history query fails with this message.
    pub fail_with: Option<String>,
}

impl MockVcs {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Default::default()
        }
    }

    /// A deterministic object id derived from `n`.
    pub fn oid(n: u8) -> Oid {
        Oid::new(format!("{:02x}", n).repeat(20)).expect("40 hex digits form a valid oid")
    }

    fn check(&self) -> Result<(), GitError> {
        match &self.fail_with {
            Some(message) => Err(GitError::Internal {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Vcs for MockVcs {
    fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn status(&self) -> Result<VcsStatus, GitError> {
        Ok(self.status.clone())
    }

    fn head_oid(&self) -> Result<Option<Oid>, GitError> {
        self.check()?;
        Ok(self.head.clone())
    }

    fn head_paths(&self) -> Result<BTreeSet<RepoPath>, GitError> {
        Ok(self.head_paths.clone())
    }

    fn diff_trees(&self, old: Option<&Oid>, new: &Oid) -> Result<Vec<DiffDelta>, GitError> {
        Ok(self
            .tree_diffs
            .get(&(old.cloned(), new.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn diff_tree_to_working_tree(&self, _old: Option<&Oid>) -> Result<Vec<DiffDelta>, GitError> {
        Ok(self.working_diff.clone())
    }

    fn resolve_ref(&self, refname: &str) -> Result<Option<Oid>, GitError> {
        self.check()?;
        Ok(self.refs.get(refname).cloned())
    }

    fn tracking_status(
        &self,
        branch: &BranchName,
        upstream_ref: &str,
    ) -> Result<Option<AheadBehind>, GitError> {
        self.check()?;
        let both = self.refs.contains_key(&branch.local_ref()) && self.refs.contains_key(upstream_ref);
        Ok(both.then_some(self.ahead_behind))
    }

    fn merge_base(&self, a: &Oid, b: &Oid) -> Result<Option<Oid>, GitError> {
        self.check()?;
        if a == b {
            return Ok(Some(a.clone()));
        }
        Ok(self
            .merge_bases
            .get(&(a.clone(), b.clone()))
            .or_else(|| self.merge_bases.get(&(b.clone(), a.clone())))
            .cloned())
    }

    fn commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<CommitInfo>, GitError> {
        Ok(self
            .commit_log
            .get(&(base.clone(), tip.clone()))
            .cloned()
            .unwrap_or_default())
    }

    fn current_branch(&self) -> Result<Option<BranchName>, GitError> {
        Ok(self.branch.clone())
    }

    fn remote_url(&self, name: &str) -> Result<Option<String>, GitError> {
        Ok(self
            .remotes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, url)| url.clone()))
    }

    fn remote_for_url(&self, url: &str) -> Result<Option<String>, GitError> {
        Ok(self
            .remotes
            .iter()
            .find(|(_, u)| u == url)
            .map(|(name, _)| name.clone()))
    }

    fn default_remote(&self) -> Result<Option<String>, GitError> {
        if self.remotes.iter().any(|(n, _)| n == "origin") {
            return Ok(Some("origin".to_string()));
        }
        Ok(self.remotes.first().map(|(n, _)| n.clone()))
    }

    fn branch_upstream(&self, branch: &BranchName) -> Result<BranchUpstream, GitError> {
        Ok(self.upstreams.get(branch).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oids_are_distinct_and_valid() {
        assert_ne!(MockVcs::oid(1), MockVcs::oid(2));
        assert_eq!(MockVcs::oid(10).short(4), "0a0a");
    }

    #[test]
    fn tracking_requires_both_refs() {
        let mut vcs = MockVcs::new("/repo");
        let main = BranchName::new("main").unwrap();
        vcs.ahead_behind = AheadBehind { ahead: 2, behind: 0 };
        vcs.refs.insert(main.local_ref(), MockVcs::oid(1));
        assert_eq!(
            vcs.tracking_status(&main, "refs/remotes/origin/main").unwrap(),
            None
        );

        vcs.refs
            .insert("refs/remotes/origin/main".into(), MockVcs::oid(2));
        assert_eq!(
            vcs.tracking_status(&main, "refs/remotes/origin/main").unwrap(),
            Some(AheadBehind { ahead: 2, behind: 0 })
        );
    }

    #[test]
    fn failure_injection() {
        let mut vcs = MockVcs::new("/repo");
        vcs.fail_with = Some("boom".into());
        assert!(vcs.head_oid().is_err());
        assert!(vcs.resolve_ref("HEAD").is_err());
    }
}
