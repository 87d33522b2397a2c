//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2` or spawns `git`.
//!
//! - [`Vcs`] is the narrow read interface the engine consumes.
//! - [`Git`] implements it with `git2` and adds index updates.
//! - [`MockVcs`] implements it in memory for tests.
//! - [`GitCli`] runs network and history-rewriting commands through the
//!   `git` executable.
//!
//! # Invariants
//!
//! - No other module calls git2 directly
//! - All operations return strong types (Oid, BranchName, RepoPath)
//! - A repository handle lives for one command and is dropped on every
//!   exit path
//!
//! # Example
//!
//! ```ignore
//! use vgl::git::{Git, Vcs};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let status = git.status()?;
//! println!("{} untracked", status.untracked.len());
//! ```

mod interface;
mod mock;
pub mod remote;
mod traits;

pub use interface::{Git, GitError};
pub use mock::MockVcs;
pub use remote::GitCli;
pub use traits::{
    AheadBehind, BranchUpstream, CommitInfo, DeltaKind, DiffDelta, Vcs, VcsStatus,
};
