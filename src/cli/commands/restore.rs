//! restore command - Throw away uncommitted changes to tracked files

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::core::types::RepoPath;
use crate::engine::{Context, UserError};
use crate::ui::output;

use super::session::{self, Session};

/// Restore tracked files from `from`, limited to `patterns` when given.
///
/// Lists what will be restored and asks first unless `force`. Targets
/// inside a nested repository are refused.
pub fn restore(ctx: &Context, patterns: &[String], from: &str, force: bool) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    let report = session.report(false)?;
    let classification = &report.classification;

    let matcher = session.matcher(patterns)?;
    matcher.ensure_not_nested(classification)?;
    if report.head.is_none() && from == "HEAD" {
        bail!(UserError::new("nothing to restore from: no commits yet"));
    }

    let candidates: BTreeSet<&RepoPath> = report
        .status
        .known()
        .filter(|p| classification.tracked.contains(*p))
        .collect();
    let selected: Vec<RepoPath> = if patterns.is_empty() {
        candidates.into_iter().cloned().collect()
    } else {
        matcher.select(candidates)
    };

    if selected.is_empty() {
        output::print("Nothing to restore.", session.verbosity);
        return Ok(());
    }

    if !force {
        output::print_files(
            format!("These files will be restored from {from}:"),
            &selected,
            session.verbosity,
        );
        let prompter = session::prompter(ctx);
        let question = format!(
            "Restore {} file(s)? Their uncommitted changes will be lost.",
            selected.len()
        );
        if !session::confirm_destructive(&prompter, &question)? {
            output::print("Restore cancelled.", session.verbosity);
            return Ok(());
        }
    }

    session.cli().restore(from, &selected)?;
    output::print(
        format!("Restored {} file(s).", selected.len()),
        session.verbosity,
    );
    Ok(())
}
