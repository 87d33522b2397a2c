//! core
//!
//! Core domain types, schemas, and persistence for vgl.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, RepoPath, ChangeEntry
//! - [`paths`] - Fixed file names and path normalization helpers
//! - [`context`] - The per-repository ContextStore (`.vgl`)
//! - [`config`] - User configuration schema and loading
//! - [`lock`] - Exclusive lock for mutating commands
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Persisted formats are parsed leniently and written deterministically
//! - Nothing in this layer talks to the version control system

pub mod config;
pub mod context;
pub mod lock;
pub mod paths;
pub mod types;
