//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the repository once through a [`session::Session`]
//! 2. Runs the engine stages it needs against that one handle
//! 3. Applies its mutation, persists the context once, prints the result
//!
//! Read-only handlers (`status`, `diff`, `log`) never write the context file.

mod abort;
mod checkout;
mod commit;
mod copy;
mod create;
mod delete;
mod diff;
mod log;
mod merge;
mod restore;
mod session;
mod split;
mod status;
mod switch;
mod sync;
mod track;
mod untrack;

// Re-export command functions for testing and direct invocation
pub use abort::abort;
pub use checkout::checkout;
pub use commit::commit;
pub use copy::copy;
pub use create::create;
pub use delete::delete;
pub use diff::diff;
pub use log::log;
pub use merge::merge;
pub use restore::restore;
pub use split::split;
pub use status::{status, StatusOptions};
pub use switch::{jump, switch, SwitchTarget};
pub use sync::{pull, push, sync};
pub use track::track;
pub use untrack::untrack;

use crate::cli::args::Command;
use crate::engine::Context;
use anyhow::Result;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Setup
        Command::Create {
            dir,
            branch,
            remote,
            remote_branch,
            force,
        } => create::create(
            ctx,
            dir.as_deref(),
            branch,
            remote.as_deref(),
            remote_branch,
            force,
        ),
        Command::Checkout { url, dir, branch } => {
            checkout::checkout(ctx, &url, dir.as_deref(), branch.as_ref())
        }
        Command::Copy { into, from, force } => {
            copy::copy(ctx, into.as_deref(), from.as_deref(), force)
        }

        // Files
        Command::Track { patterns, all } => track::track(ctx, &patterns, all),
        Command::Untrack { patterns, all } => untrack::untrack(ctx, &patterns, all),
        Command::Commit { message, amend } => commit::commit(ctx, &message, amend),
        Command::Diff { paths } => diff::diff(ctx, &paths),
        Command::Log { limit } => log::log(ctx, limit),
        Command::Restore { paths, from, force } => restore::restore(ctx, &paths, &from, force),
        Command::Status {
            verbose,
            no_fetch,
            json,
            changes,
            files,
            history,
            context,
        } => status::status(
            ctx,
            StatusOptions {
                verbose,
                no_fetch,
                json,
                context,
                history,
                changes,
                files,
            },
        ),

        // Contexts and branches
        Command::Switch {
            branch,
            remote_url,
            remote_branch,
            dir,
        } => switch::switch(
            ctx,
            SwitchTarget {
                branch,
                remote_url,
                remote_branch,
                dir,
            },
        ),
        Command::Jump => switch::jump(ctx),
        Command::Abort => abort::abort(ctx),
        Command::Merge {
            branch,
            remote_branch,
        } => merge::merge(ctx, branch.as_ref(), remote_branch.as_ref()),
        Command::Split {
            new_branch,
            from,
            push,
        } => split::split(ctx, &new_branch, from.as_ref(), push),
        Command::Delete {
            branch,
            remote_branch,
            force,
        } => delete::delete(ctx, branch.as_ref(), remote_branch.as_ref(), force),

        // Remote
        Command::Push { dry_run } => sync::push(ctx, dry_run),
        Command::Pull { dry_run, force } => sync::pull(ctx, dry_run, force),
        Command::Sync { dry_run } => sync::sync(ctx, dry_run),
    }
}
