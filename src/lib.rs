//! vgl - a friendlier command-line front end for git
//!
//! vgl offers a small set of verbs (create, track, commit, status, switch,
//! push, pull, ...) on top of git. Its core is a reconciliation engine that
//! works out which repository a command acts on, which files the user has
//! decided to track, what changed, and where the branch stands against its
//! remote.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Context resolution, classification, rename unification,
//!   sync state
//! - [`core`] - Domain types, the per-repository context record, config
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Prompts, output and the status summary
//!
//! # Correctness Invariants
//!
//! 1. Every path is in exactly one of Tracked, Untracked, Undecided, Ignored
//! 2. Summary counts equal the lengths of the lists they summarize
//! 3. Nothing inside a nested repository is ever tracked, untracked or
//!    restored
//! 4. The context record is read at most once and written at most once per
//!    command

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
