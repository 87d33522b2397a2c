//! track command - Decide to track files

use anyhow::{Context as _, Result};

use crate::core::types::RepoPath;
use crate::engine::Context;
use crate::ui::output;

use super::session::Session;

/// Track undecided (or previously untracked) files matching `patterns`,
/// or every undecided file with `all`.
///
/// Paths inside a nested repository are refused.
pub fn track(ctx: &Context, patterns: &[String], all: bool) -> Result<()> {
    let mut session = Session::open_locked(ctx)?;
    let report = session.report(false)?;
    let classification = &report.classification;

    let matcher = session.matcher(patterns)?;
    matcher.ensure_not_nested(classification)?;

    let selected: Vec<RepoPath> = if all {
        classification.undecided.iter().cloned().collect()
    } else {
        matcher.select(classification.undecided.iter().chain(&classification.untracked))
    };

    let changed = classification.reconcile(&mut session.context);
    if selected.is_empty() {
        if changed {
            session.save()?;
        }
        output::print("No undecided files match.", session.verbosity);
        return Ok(());
    }

    for path in &selected {
        session.context.mark_tracked(path.clone());
    }
    session
        .git
        .stage_paths(&selected)
        .context("Failed to add files to the index")?;
    session.save()?;

    output::print_files(
        format!("Tracking {} file(s):", selected.len()),
        &selected,
        session.verbosity,
    );
    Ok(())
}
