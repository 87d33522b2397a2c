//! split command - Start a new branch from the current one

use anyhow::{bail, Result};

use crate::core::types::BranchName;
use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::Session;

/// Create `new_branch` from `from` (or HEAD) and switch to it.
///
/// The previous context is kept for `jump`. With `push` the branch is also
/// created on the remote.
pub fn split(
    ctx: &Context,
    new_branch: &BranchName,
    from: Option<&BranchName>,
    push: bool,
) -> Result<()> {
    let mut session = Session::open_locked(ctx)?;

    if session.git.branch_exists(new_branch) {
        output::warn(
            format!("branch '{new_branch}' already exists; use 'vgl switch --branch {new_branch}'"),
            session.verbosity,
        );
        return Ok(());
    }
    if let Some(from) = from {
        if !session.git.branch_exists(from) {
            bail!(UserError::new(format!(
                "source branch '{from}' does not exist"
            )));
        }
    }

    if !session.git.status()?.is_clean() {
        output::warn(
            "uncommitted changes will be carried to the new branch",
            session.verbosity,
        );
    }

    let previous = session.context.clone();
    if session.git.head_oid()?.is_none() && from.is_none() {
        session.cli().set_unborn_branch(new_branch)?;
    } else {
        session
            .cli()
            .checkout_new_branch(new_branch, from.map(BranchName::as_str))?;
    }

    session.context.local_branch = new_branch.clone();
    session.context.remote_branch = None;
    session.context.remember_jump(&previous);
    session.save()?;

    let origin = from
        .map(|b| format!(" from '{b}'"))
        .unwrap_or_default();
    output::print(
        format!("Created and switched to branch '{new_branch}'{origin}."),
        session.verbosity,
    );

    if push {
        match session.ensure_remote()? {
            Some(remote) => {
                session
                    .cli()
                    .push(&remote, new_branch, new_branch, false)?;
                output::print(
                    format!("Pushed branch '{new_branch}' to '{remote}'."),
                    session.verbosity,
                );
            }
            None => output::warn(
                "no remote configured; branch not pushed. Use 'vgl switch --remote-url URL' first",
                session.verbosity,
            ),
        }
    }
    Ok(())
}
