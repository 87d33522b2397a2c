//! delete command - Delete a local or remote branch

use anyhow::{bail, Result};

use crate::core::types::BranchName;
use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::{self, Session};

/// Delete a local branch or a branch on the remote.
///
/// Asks first unless `force`; a forced local delete also drops unmerged
/// commits. The current branch can't be deleted.
pub fn delete(
    ctx: &Context,
    branch: Option<&BranchName>,
    remote_branch: Option<&BranchName>,
    force: bool,
) -> Result<()> {
    let mut session = Session::open_locked(ctx)?;
    let prompter = session::prompter(ctx);

    if let Some(branch) = branch {
        if session.git.current_branch()?.as_ref() == Some(branch) {
            bail!(UserError::new(format!(
                "cannot delete the current branch '{branch}'; switch to another branch first"
            )));
        }
        if !session.git.branch_exists(branch) {
            output::warn(
                format!("branch '{branch}' does not exist locally"),
                session.verbosity,
            );
        } else if force
            || session::confirm_destructive(
                &prompter,
                &format!("Delete local branch '{branch}'?"),
            )?
        {
            session.cli().delete_branch(branch, force)?;
            let stale_jump = session.context.jump.as_ref().is_some_and(|jump| {
                jump.local_root == session.context.local_root && jump.local_branch == *branch
            });
            if stale_jump {
                session.context.jump = None;
                session.save()?;
            }
            output::print(
                format!("Deleted local branch '{branch}'."),
                session.verbosity,
            );
        } else {
            output::print("Deletion cancelled.", session.verbosity);
        }
    }

    if let Some(remote_branch) = remote_branch {
        let remote = session.require_remote()?;
        let question = format!("Delete branch '{remote_branch}' on '{remote}'? This cannot be undone.");
        if force || session::confirm_destructive(&prompter, &question)? {
            session.cli().delete_remote_branch(&remote, remote_branch)?;
            output::print(
                format!("Deleted remote branch '{remote}/{remote_branch}'."),
                session.verbosity,
            );
        } else {
            output::print("Deletion cancelled.", session.verbosity);
        }
    }
    Ok(())
}
