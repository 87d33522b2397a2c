//! merge command - Merge another branch into the current one

use anyhow::{bail, Context as _, Result};

use crate::core::types::BranchName;
use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::Session;

/// Merge a local branch, or a branch fetched from the remote, into the
/// current branch. Refuses to start with uncommitted changes.
pub fn merge(
    ctx: &Context,
    branch: Option<&BranchName>,
    remote_branch: Option<&BranchName>,
) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    let status = session.git.status()?;
    if !status.is_clean() {
        let pending: Vec<String> = status
            .modified
            .iter()
            .chain(&status.changed)
            .map(|p| format!("M {p}"))
            .chain(status.added.iter().map(|p| format!("A {p}")))
            .chain(status.removed.iter().chain(&status.missing).map(|p| format!("D {p}")))
            .collect();
        bail!(UserError::new(format!(
            "uncommitted changes; commit them before merging:\n{}",
            output::indented(&pending)
        )));
    }

    let current = session
        .git
        .current_branch()?
        .ok_or_else(|| UserError::new("HEAD is detached; switch to a branch first"))?;

    let (rev, label) = match (branch, remote_branch) {
        (Some(branch), _) => {
            if !session.git.branch_exists(branch) {
                bail!(UserError::new(format!("branch '{branch}' does not exist")));
            }
            if *branch == current {
                bail!(UserError::new(format!(
                    "cannot merge branch '{branch}' into itself"
                )));
            }
            (branch.local_ref(), format!("'{branch}'"))
        }
        (None, Some(remote_branch)) => {
            let remote = session.require_remote()?;
            output::print("Fetching from remote...", session.verbosity);
            session
                .cli()
                .fetch(&remote)
                .with_context(|| format!("Failed to fetch from '{remote}'"))?;
            (
                remote_branch.remote_ref(&remote),
                format!("'{remote}/{remote_branch}'"),
            )
        }
        (None, None) => bail!(UserError::new("give --branch or --remote-branch")),
    };

    output::print(
        format!("Merging {label} into '{current}'..."),
        session.verbosity,
    );
    session.cli().merge(&rev).with_context(|| {
        format!("Merge of {label} stopped; resolve conflicts, then 'vgl commit'")
    })?;
    output::print("Merge complete.", session.verbosity);
    Ok(())
}
