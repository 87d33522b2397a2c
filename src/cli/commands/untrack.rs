//! untrack command - Stop tracking files, keeping them on disk

use anyhow::{Context as _, Result};

use crate::core::types::RepoPath;
use crate::engine::Context;
use crate::ui::output;

use super::session::Session;

/// Untrack tracked files matching `patterns`, or all of them with `all`.
///
/// The files stay in the working tree. Removing them from the index means
/// the next commit records them as deleted.
pub fn untrack(ctx: &Context, patterns: &[String], all: bool) -> Result<()> {
    let mut session = Session::open_locked(ctx)?;
    let report = session.report(false)?;
    let classification = &report.classification;

    let matcher = session.matcher(patterns)?;
    matcher.ensure_not_nested(classification)?;

    let selected: Vec<RepoPath> = if all {
        classification.tracked.iter().cloned().collect()
    } else {
        matcher.select(&classification.tracked)
    };

    let changed = classification.reconcile(&mut session.context);
    if selected.is_empty() {
        if changed {
            session.save()?;
        }
        output::print("No tracked files match.", session.verbosity);
        return Ok(());
    }

    for path in &selected {
        session.context.mark_untracked(path.clone());
    }
    session
        .git
        .unstage_paths(&selected)
        .context("Failed to remove files from the index")?;
    session.save()?;

    output::print_files(
        format!("Untracked {} file(s):", selected.len()),
        &selected,
        session.verbosity,
    );
    Ok(())
}
