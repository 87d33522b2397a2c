//! engine
//!
//! The workspace state reconciliation engine.
//!
//! # Architecture
//!
//! ```text
//! command handler
//!   -> resolver     (which root, branch, remote)
//!   -> workspace    (one Vcs handle, all stages below)
//!        -> classify    (four-way file partition)
//!        -> renames     (logical change entries, two contexts)
//!        -> sync_state  (local vs remote)
//!   -> ui::summary
//! ```
//!
//! # Invariants
//!
//! - The process working directory is read once, by the CLI. Everything
//!   below receives the resolved [`RepoContext`](crate::core::context::RepoContext)
//!   explicitly.
//! - Stages only read through [`Vcs`](crate::git::Vcs); mutations belong to
//!   the verb handlers.
//! - Classification and change entries are recomputed every invocation
//!   and never persisted.

pub mod classify;
pub mod renames;
pub mod resolver;
pub mod sync_state;
pub mod workspace;

pub use classify::{ClassCounts, ClassifyError, FileClass, FileClassification};
pub use renames::{RenameOutcome, UnifiedChanges};
pub use resolver::{ContextResolver, ResolutionKind, Resolution, ResolveRequest};
pub use sync_state::{SyncReport, SyncState};
pub use workspace::{WorkspaceOptions, WorkspaceReport};

use std::path::PathBuf;

use crate::core::config::Config;

/// Execution context for commands.
///
/// Global settings derived from CLI flags and the user configuration.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Explicit repository root, skipping the upward search.
    pub repo: Option<PathBuf>,
    /// Upper bound for the upward search.
    pub ceiling: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
    /// Fetch before computing sync state.
    pub fetch: bool,
    pub config: Config,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            repo: None,
            ceiling: None,
            debug: false,
            quiet: false,
            interactive: true,
            fetch: true,
            config: Config::default(),
        }
    }
}

/// A failure caused by what the user asked for, not by vgl or git.
///
/// Exits with status 1.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UserError {
    message: String,
}

impl UserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Resolution found nothing usable.
    #[error("no repository found{}", .root.as_ref().map(|r| format!(" at {}", r.display())).unwrap_or_default())]
    NoRepository { root: Option<PathBuf> },

    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] crate::git::GitError),

    /// ContextStore error.
    #[error(transparent)]
    Context(#[from] crate::core::context::ContextError),

    /// Nested repository policy.
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

impl EngineError {
    /// True for failures the user can fix by changing the request.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            EngineError::NoRepository { .. } | EngineError::Classify(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RepoPath;

    #[test]
    fn context_defaults() {
        let ctx = Context::default();
        assert!(ctx.interactive);
        assert!(ctx.fetch);
        assert!(ctx.repo.is_none());
    }

    #[test]
    fn user_errors_classified() {
        let err = EngineError::NoRepository { root: None };
        assert_eq!(err.to_string(), "no repository found");
        assert!(err.is_user_error());

        let err = EngineError::NoRepository {
            root: Some(PathBuf::from("/w")),
        };
        assert_eq!(err.to_string(), "no repository found at /w");

        let nested = EngineError::from(ClassifyError::NestedRepository {
            path: RepoPath::new("lib/x").unwrap(),
            repo: RepoPath::new("lib").unwrap(),
        });
        assert!(nested.is_user_error());

        let git = EngineError::from(crate::git::GitError::BareRepo);
        assert!(!git.is_user_error());
    }
}
