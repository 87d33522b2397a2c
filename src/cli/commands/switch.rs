//! switch and jump commands - Move between contexts

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::core::context::RepoContext;
use crate::core::paths;
use crate::core::types::BranchName;
use crate::engine::{Context, UserError};
use crate::git::Vcs;
use crate::ui::output;

use super::session::Session;

/// What `switch` should change. Unset fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SwitchTarget {
    pub branch: Option<BranchName>,
    pub remote_url: Option<String>,
    pub remote_branch: Option<BranchName>,
    pub dir: Option<PathBuf>,
}

impl SwitchTarget {
    fn is_empty(&self) -> bool {
        self.branch.is_none()
            && self.remote_url.is_none()
            && self.remote_branch.is_none()
            && self.dir.is_none()
    }

    fn switches_local(&self) -> bool {
        self.branch.is_some() || self.dir.is_some()
    }
}

/// Check out `branch` in the session's repository.
///
/// An unborn HEAD is simply renamed. Branches that don't exist are refused.
fn check_out(session: &Session, branch: &BranchName) -> Result<()> {
    if session.git.current_branch()?.as_ref() == Some(branch) {
        return Ok(());
    }
    if session.git.head_oid()?.is_none() {
        session.cli().set_unborn_branch(branch)?;
        return Ok(());
    }
    if !session.git.branch_exists(branch) {
        let available = session.git.list_branches()?;
        bail!(UserError::new(format!(
            "branch '{branch}' does not exist in {} (available: {}); use 'vgl split {branch}' to create it",
            session.root().display(),
            available
                .iter()
                .map(BranchName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    session.cli().checkout(branch)?;
    Ok(())
}

fn warn_if_dirty(session: &Session) -> Result<()> {
    let status = session.git.status()?;
    if !status.is_clean() {
        output::warn(
            format!(
                "uncommitted changes in {}; commit or restore them to avoid confusion",
                session.root().display()
            ),
            session.verbosity,
        );
    }
    Ok(())
}

/// Open the session for `root`, reusing `current` when it is the same
/// repository.
fn session_for(ctx: &Context, current: Session, root: &std::path::Path) -> Result<Session> {
    if paths::lexical_normalize(root) == paths::lexical_normalize(current.root()) {
        return Ok(current);
    }
    if !paths::is_vcs_root(root) {
        bail!(UserError::new(format!(
            "no Git repository at {}; use 'vgl create {}' to make one",
            root.display(),
            root.display()
        )));
    }
    drop(current);
    Session::open_at(ctx, root)
}

fn describe(context: &RepoContext) -> String {
    format!(
        "{} on branch '{}'",
        context.local_root.display(),
        context.local_branch
    )
}

/// Point vgl at another branch, remote or repository.
///
/// Changing the local side remembers the previous context for `jump`.
pub fn switch(ctx: &Context, target: SwitchTarget) -> Result<()> {
    if target.is_empty() {
        bail!(UserError::new(
            "nothing to switch; give --branch, --dir, --remote-url or --remote-branch"
        ));
    }

    let current = Session::open_locked(ctx)?;
    let previous = current.context.clone();

    let mut session = match &target.dir {
        Some(dir) => {
            let root = paths::lexical_normalize(&current.cwd.join(dir));
            session_for(ctx, current, &root)?
        }
        None => current,
    };

    if target.switches_local() {
        let branch = target
            .branch
            .clone()
            .unwrap_or_else(|| session.context.local_branch.clone());
        let changing = session.root() != previous.local_root || branch != previous.local_branch;
        if changing {
            warn_if_dirty(&session)?;
            check_out(&session, &branch)?;
            if session.root() == previous.local_root && target.remote_branch.is_none() {
                // The remote branch follows the local one unless set.
                session.context.remote_branch = None;
            }
            session.context.remember_jump(&previous);
        }
        session.context.local_branch = branch;
    }

    if let Some(url) = &target.remote_url {
        session.context.remote_url = Some(url.clone()).filter(|u| !u.trim().is_empty());
    }
    if let Some(branch) = &target.remote_branch {
        session.context.remote_branch = Some(branch.clone());
    }
    if target.remote_url.is_some() {
        session.ensure_remote()?;
    }
    session.save()?;

    if target.switches_local() {
        output::print(
            format!("Switched to {}", describe(&session.context)),
            session.verbosity,
        );
    }
    match &session.context.remote_url {
        Some(url) if target.remote_url.is_some() || target.remote_branch.is_some() => {
            output::print(
                format!(
                    "Remote: {url} on branch '{}'",
                    session.context.effective_remote_branch()
                ),
                session.verbosity,
            );
        }
        None if target.remote_url.is_some() => {
            output::print("Remote cleared; working local only", session.verbosity);
        }
        _ => {}
    }
    Ok(())
}

/// Swap the current context with the remembered one.
pub fn jump(ctx: &Context) -> Result<()> {
    let current = Session::open_locked(ctx)?;
    let Some(alternate) = current.context.jump.as_deref().cloned() else {
        bail!(UserError::new(
            "no previous context; 'vgl switch' or 'vgl split' remembers one"
        ));
    };
    let previous = current.context.clone();

    let mut session = session_for(ctx, current, &alternate.local_root)?;
    warn_if_dirty(&session)?;
    check_out(&session, &alternate.local_branch)?;

    session.context.local_branch = alternate.local_branch.clone();
    session.context.remote_url = alternate.remote_url.clone();
    session.context.remote_branch = alternate.remote_branch.clone();
    session.context.remember_jump(&previous);
    session.save()?;

    output::print(
        format!("Jumped to {}", describe(&session.context)),
        session.verbosity,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_target() {
        assert!(SwitchTarget::default().is_empty());
        let target = SwitchTarget {
            remote_url: Some("u".into()),
            ..Default::default()
        };
        assert!(!target.is_empty());
        assert!(!target.switches_local());
    }

    #[test]
    fn nothing_to_switch_is_a_user_error() {
        let err = switch(&Context::default(), SwitchTarget::default()).unwrap_err();
        assert!(err.is::<UserError>());
    }
}
