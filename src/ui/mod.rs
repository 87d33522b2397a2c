//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Yes/no confirmations behind a trait
//! - [`output`] - Verbosity-aware printing
//! - [`summary`] - The `status` renderer (text and JSON)
//!
//! # Design
//!
//! The engine never prints or prompts on its own. Handlers pass a
//! [`prompts::Prompter`] in and print what comes back out.

pub mod output;
pub mod prompts;
pub mod summary;
