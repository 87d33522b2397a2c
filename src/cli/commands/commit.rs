//! commit command - Commit every change to tracked files

use anyhow::{bail, Context as _, Result};

use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::Session;

/// Stage tracked changes and commit them.
///
/// Prints the new commit's seven-character id. Undecided files are left
/// out and mentioned in a warning.
pub fn commit(ctx: &Context, message: &str, amend: bool) -> Result<()> {
    if message.trim().is_empty() && !amend {
        bail!(UserError::new("commit message is empty"));
    }

    let mut session = Session::open_locked(ctx)?;
    let report = session.report(false)?;
    let changed = report.classification.reconcile(&mut session.context);

    let to_stage = report.paths_to_stage();
    if !to_stage.is_empty() {
        tracing::debug!(count = to_stage.len(), "staging tracked changes");
        session
            .git
            .stage_paths(&to_stage)
            .context("Failed to stage tracked changes")?;
    }

    let staged = session.git.status()?;
    let has_staged =
        !(staged.added.is_empty() && staged.changed.is_empty() && staged.removed.is_empty());
    if !has_staged && !amend {
        if changed {
            session.save()?;
        }
        bail!(UserError::new("nothing to commit"));
    }

    session.cli().commit(message, amend)?;
    if changed {
        session.save()?;
    }

    let head = session
        .git
        .head_oid()?
        .context("HEAD is missing after commit")?;
    output::print(head.short(7), session.verbosity);

    let undecided = report.classification.undecided.len();
    if undecided > 0 {
        output::warn(
            format!(
                "{undecided} undecided file(s) not committed; use 'vgl track' or 'vgl untrack'"
            ),
            session.verbosity,
        );
    }
    Ok(())
}
