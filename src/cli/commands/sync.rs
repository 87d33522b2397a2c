//! push, pull and sync commands - Exchange commits with the remote

use anyhow::{bail, Result};

use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::Session;

fn push_in(session: &Session, dry_run: bool) -> Result<()> {
    let remote = session.require_remote()?;
    if session.git.head_oid()?.is_none() {
        bail!(UserError::new("nothing to push: no commits yet"));
    }

    let local = &session.context.local_branch;
    let target = session.context.effective_remote_branch();
    session.cli().push(&remote, local, target, dry_run)?;

    let verb = if dry_run { "Would push" } else { "Pushed" };
    output::print(
        format!("{verb} '{local}' to '{remote}/{target}'."),
        session.verbosity,
    );
    Ok(())
}

fn pull_in(session: &Session, dry_run: bool, force: bool) -> Result<()> {
    let remote = session.require_remote()?;
    if !force {
        let report = session.report(false)?;
        if report.has_pending_changes() {
            bail!(UserError::new(
                "uncommitted changes; commit them first or pull with --force"
            ));
        }
    }

    let source = session.context.effective_remote_branch();
    session.cli().pull(&remote, source, dry_run)?;

    let verb = if dry_run { "Would pull" } else { "Pulled" };
    output::print(
        format!(
            "{verb} '{remote}/{source}' into '{}'.",
            session.context.local_branch
        ),
        session.verbosity,
    );
    Ok(())
}

/// Send local commits to the remote branch.
pub fn push(ctx: &Context, dry_run: bool) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    push_in(&session, dry_run)
}

/// Bring remote commits into the local branch.
pub fn pull(ctx: &Context, dry_run: bool, force: bool) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    pull_in(&session, dry_run, force)
}

/// Pull, then push.
///
/// A branch that doesn't exist on the remote yet is only pushed.
pub fn sync(ctx: &Context, dry_run: bool) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    let remote = session.require_remote()?;
    crate::engine::sync_state::fetch_best_effort(&session.cli(), &remote);

    let upstream = session
        .context
        .effective_remote_branch()
        .remote_ref(&remote);
    if session.git.resolve_ref(&upstream)?.is_some() {
        pull_in(&session, dry_run, false)?;
    } else {
        tracing::debug!(upstream = %upstream, "remote branch missing; skipping pull");
    }
    push_in(&session, dry_run)
}
