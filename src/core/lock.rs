//! core::lock
//!
//! Exclusive lock held by mutating commands while they rewrite the
//! ContextStore and the index.
//!
//! # Storage
//!
//! - `<git_dir>/vgl.lock` - lock file with an OS-level exclusive lock
//!
//! # Invariants
//!
//! - Released on drop, including error paths
//! - Non-blocking: a second process fails fast instead of waiting

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::LOCK_FILE_NAME;

/// Errors from locking.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("repository is locked by another vgl process ({path})")]
    AlreadyLocked { path: PathBuf },

    #[error("failed to open lock file '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to acquire lock: {0}")]
    Acquire(std::io::Error),
}

/// Guard for the repository lock.
#[derive(Debug)]
pub struct ContextLock {
    path: PathBuf,
    file: File,
}

impl ContextLock {
    /// Acquire the lock inside `git_dir`.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another process holds it
    /// - [`LockError::Open`] if the lock file cannot be created
    pub fn acquire(git_dir: &Path) -> Result<Self, LockError> {
        let path = git_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "lock acquired");
                Ok(Self { path, file })
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                Err(LockError::AlreadyLocked { path })
            }
            Err(e) => Err(LockError::Acquire(e)),
        }
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ContextLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release lock");
        }
    }
}
