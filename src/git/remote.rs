//! git::remote
//!
//! Mutating and network operations, run through the `git` executable.
//!
//! Transport, merging, hooks and credential helpers stay with the user's
//! own git installation. Reads go through [`super::Git`] instead.
//!
//! # Output
//!
//! [`GitCli::run`] inherits stdio so the user sees git's own progress and
//! conflict output. [`GitCli::capture`] buffers it, for best-effort calls
//! whose failure only gets logged.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::GitError;
use crate::core::types::{BranchName, RepoPath};

/// Runs `git` subcommands in one directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    dir: PathBuf,
}

impl GitCli {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn command_line(args: &[&str]) -> String {
        format!("git {}", args.join(" "))
    }

    /// Run with inherited stdio.
    pub fn run(&self, args: &[&str]) -> Result<(), GitError> {
        tracing::debug!(dir = %self.dir.display(), args = ?args, "running git");
        let status = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .status()
            .map_err(|e| GitError::CommandFailed {
                command: Self::command_line(args),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(GitError::CommandFailed {
                command: Self::command_line(args),
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }

    /// Run with captured output; returns stdout.
    pub fn capture(&self, args: &[&str]) -> Result<String, GitError> {
        tracing::debug!(dir = %self.dir.display(), args = ?args, "running git (captured)");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| GitError::CommandFailed {
                command: Self::command_line(args),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command: Self::command_line(args),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    // =========================================================================
    // Network
    // =========================================================================

    /// `git fetch --quiet <remote>`.
    pub fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.capture(&["fetch", "--quiet", remote]).map(|_| ())
    }

    /// Push `local` to `remote_branch` on `remote`.
    pub fn push(
        &self,
        remote: &str,
        local: &BranchName,
        remote_branch: &BranchName,
        dry_run: bool,
    ) -> Result<(), GitError> {
        let refspec = format!("{}:{}", local.local_ref(), remote_branch.local_ref());
        let mut args = vec!["push"];
        if dry_run {
            args.push("--dry-run");
        }
        args.extend(["-u", remote, refspec.as_str()]);
        self.run(&args)
    }

    /// Pull `remote_branch` from `remote` into the current branch.
    pub fn pull(&self, remote: &str, remote_branch: &BranchName, dry_run: bool) -> Result<(), GitError> {
        if dry_run {
            return self.run(&["fetch", "--dry-run", remote, remote_branch.as_str()]);
        }
        self.run(&["pull", "--no-rebase", remote, remote_branch.as_str()])
    }

    /// `git remote add <name> <url>`.
    pub fn add_remote(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.capture(&["remote", "add", name, url]).map(|_| ())
    }

    /// `git remote set-url <name> <url>`.
    pub fn set_remote_url(&self, name: &str, url: &str) -> Result<(), GitError> {
        self.capture(&["remote", "set-url", name, url]).map(|_| ())
    }

    /// Delete `branch` on `remote`.
    pub fn delete_remote_branch(&self, remote: &str, branch: &BranchName) -> Result<(), GitError> {
        self.run(&["push", remote, "--delete", branch.as_str()])
    }

    /// Clone `url` into `dest`, optionally checking out `branch`.
    pub fn clone_into(&self, url: &str, dest: &Path, branch: Option<&BranchName>) -> Result<(), GitError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["clone"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch.as_str()]);
        }
        args.extend([url, &*dest]);
        self.run(&args)
    }

    // =========================================================================
    // Local mutations
    // =========================================================================

    /// Commit what is staged. Returns nothing; read HEAD afterwards.
    ///
    /// Amending with an empty message keeps the old one.
    pub fn commit(&self, message: &str, amend: bool) -> Result<(), GitError> {
        let mut args = vec!["commit", "--quiet"];
        if amend {
            args.push("--amend");
        }
        if amend && message.trim().is_empty() {
            args.push("--no-edit");
        } else {
            args.extend(["-m", message]);
        }
        self.run(&args)
    }

    /// Merge `rev` into the current branch.
    pub fn merge(&self, rev: &str) -> Result<(), GitError> {
        self.run(&["merge", "--no-edit", rev])
    }

    /// Give up on a conflicted merge.
    pub fn merge_abort(&self) -> Result<(), GitError> {
        self.run(&["merge", "--abort"])
    }

    /// Check out an existing branch.
    pub fn checkout(&self, branch: &BranchName) -> Result<(), GitError> {
        self.run(&["checkout", "--quiet", branch.as_str()])
    }

    /// Create `branch` at `from` (or HEAD) and check it out.
    pub fn checkout_new_branch(&self, branch: &BranchName, from: Option<&str>) -> Result<(), GitError> {
        let mut args = vec!["checkout", "--quiet", "-b", branch.as_str()];
        if let Some(from) = from {
            args.push(from);
        }
        self.run(&args)
    }

    /// Point an unborn HEAD at `branch`.
    pub fn set_unborn_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        self.capture(&["symbolic-ref", "HEAD", &branch.local_ref()])
            .map(|_| ())
    }

    /// Delete a local branch; `force` also drops unmerged work.
    pub fn delete_branch(&self, branch: &BranchName, force: bool) -> Result<(), GitError> {
        let flag = if force { "-D" } else { "-d" };
        self.run(&["branch", flag, branch.as_str()])
    }

    /// Restore `paths` (or everything) in the working tree and index from `rev`.
    pub fn restore(&self, rev: &str, paths: &[RepoPath]) -> Result<(), GitError> {
        let source = format!("--source={rev}");
        let mut args = vec!["restore", "--staged", "--worktree", source.as_str(), "--"];
        if paths.is_empty() {
            args.push(".");
        } else {
            args.extend(paths.iter().map(RepoPath::as_str));
        }
        self.run(&args)
    }

    /// Show `git diff <rev>` for `paths`, paged by git.
    pub fn diff(&self, rev: &str, paths: &[RepoPath]) -> Result<(), GitError> {
        let mut args = vec!["diff", rev, "--"];
        args.extend(paths.iter().map(RepoPath::as_str));
        self.run(&args)
    }
}
