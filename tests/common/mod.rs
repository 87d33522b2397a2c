//! Shared fixtures for integration tests.
//!
//! Repositories are real `git` repositories in temporary directories.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use vgl::core::context::RepoContext;
use vgl::core::types::BranchName;
use vgl::engine::Context;
use vgl::git::Git;

/// A temporary git repository on `main`.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Empty repository, no commits.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        init_at(dir.path());
        Self { dir }
    }

    /// Repository with `README.md` committed.
    pub fn with_commit() -> Self {
        let repo = Self::new();
        repo.commit_file("README.md", "# Test Repo\n", "Initial commit");
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    /// A context for command handlers: no prompts, no output, no fetch,
    /// and no search above the repository.
    pub fn context(&self) -> Context {
        Context {
            cwd: Some(self.path().to_path_buf()),
            ceiling: Some(self.path().to_path_buf()),
            interactive: false,
            quiet: true,
            fetch: false,
            ..Context::default()
        }
    }

    /// A plain local-only context on `main`.
    pub fn repo_context(&self) -> RepoContext {
        RepoContext::new(self.path(), BranchName::new("main").unwrap())
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn commit_file(&self, rel: &str, content: &str, message: &str) {
        self.write(rel, content);
        run_git(self.path(), &["add", rel]);
        run_git(self.path(), &["commit", "-m", message]);
    }

    pub fn head(&self) -> String {
        git_stdout(self.path(), &["rev-parse", "HEAD"])
    }

    /// Paths in the index.
    pub fn ls_files(&self) -> Vec<String> {
        git_stdout(self.path(), &["ls-files"])
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// `git init` on `main` with a test identity.
pub fn init_at(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    run_git(dir, &["init", "--quiet", "-b", "main"]);
    run_git(dir, &["config", "user.email", "test@example.com"]);
    run_git(dir, &["config", "user.name", "Test User"]);
    run_git(dir, &["config", "core.editor", "true"]);
}

/// A bare repository to push to.
pub fn bare_remote() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("remote.git");
    run_git(dir.path(), &["init", "--quiet", "--bare", "-b", "main", "remote.git"]);
    (dir, path)
}

/// Run a git command in the given directory.
pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

/// Run a git command and return trimmed stdout.
pub fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
