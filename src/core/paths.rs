//! core::paths
//!
//! Centralized path routing for vgl storage locations.
//!
//! # Storage Layout
//!
//! - `<root>/.vgl` - the ContextStore record for the repository at `<root>`
//! - `<root>/.gitignore` - gains a `.vgl` line when vgl adopts a repository
//! - `<git_dir>/vgl.lock` - exclusive lock held by mutating commands
//!
//! No code outside this module should spell out these names.
//!
//! # Example
//!
//! ```
//! use vgl::core::paths::{context_file_path, CONTEXT_FILE_NAME};
//! use std::path::Path;
//!
//! assert_eq!(
//!     context_file_path(Path::new("/work/repo")),
//!     Path::new("/work/repo").join(CONTEXT_FILE_NAME)
//! );
//! ```

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::core::types::RepoPath;

/// File name of the per-repository ContextStore record.
pub const CONTEXT_FILE_NAME: &str = ".vgl";

/// Name of the VCS metadata entry that marks a repository root.
pub const VCS_DIR_NAME: &str = ".git";

/// Lock file name inside the git directory.
pub const LOCK_FILE_NAME: &str = "vgl.lock";

/// Path of the ContextStore record for the repository rooted at `root`.
pub fn context_file_path(root: &Path) -> PathBuf {
    root.join(CONTEXT_FILE_NAME)
}

/// True when `dir` holds a VCS root marker (`.git` directory or gitfile).
pub fn is_vcs_root(dir: &Path) -> bool {
    dir.join(VCS_DIR_NAME).exists()
}

/// True when `dir` holds a ContextStore record.
pub fn has_context_file(dir: &Path) -> bool {
    context_file_path(dir).is_file()
}

/// The repo-relative path of the ContextStore record itself.
pub fn context_repo_path() -> RepoPath {
    RepoPath::new(CONTEXT_FILE_NAME).expect("context file name is a valid path")
}

/// Lexically normalize a path: drop `.` components and fold `..`.
///
/// Does not touch the filesystem, so it works for paths that do not exist.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Map a user-supplied path (absolute, or relative to `cwd`) onto a
/// `RepoPath` under `root`. Returns `None` when it points outside `root`
/// or at `root` itself.
pub fn to_repo_path(root: &Path, cwd: &Path, input: &str) -> Option<RepoPath> {
    let raw = Path::new(input.trim());
    let absolute = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        cwd.join(raw)
    };
    let absolute = lexical_normalize(&absolute);
    let root = lexical_normalize(root);
    let relative = absolute.strip_prefix(&root).ok()?;
    RepoPath::from_relative(relative).ok()
}

/// Make sure `<root>/.gitignore` ignores the ContextStore record.
///
/// Returns `true` when the file was changed.
pub fn ensure_gitignore_entry(root: &Path) -> io::Result<bool> {
    let path = root.join(".gitignore");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let already = existing.lines().any(|line| {
        let line = line.trim();
        line == CONTEXT_FILE_NAME || line.strip_prefix('/') == Some(CONTEXT_FILE_NAME)
    });
    if already {
        return Ok(false);
    }

    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(CONTEXT_FILE_NAME);
    updated.push('\n');
    fs::write(&path, updated)?;
    Ok(true)
}
