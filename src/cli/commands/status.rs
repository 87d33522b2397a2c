//! status command - Show repository, sync and file state

use anyhow::{Context as _, Result};

use crate::engine::sync_state;
use crate::engine::Context;
use crate::git::Vcs;
use crate::ui::summary::{DetailLevel, Sections, SummaryFormatter};

use super::session::Session;

/// Which parts of the summary to show, and how.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOptions {
    pub verbose: u8,
    pub no_fetch: bool,
    pub json: bool,
    pub context: bool,
    pub history: bool,
    pub changes: bool,
    pub files: bool,
}

/// Print the workspace summary.
///
/// Fetches from the remote first unless disabled; a failed fetch only
/// logs a warning and the last known remote state is used.
pub fn status(ctx: &Context, options: StatusOptions) -> Result<()> {
    let session = Session::open(ctx)?;

    if ctx.fetch && !options.no_fetch && session.context.has_remote() {
        let remote = session.remote_name();
        if session.git.remote_url(&remote)?.is_some() {
            sync_state::fetch_best_effort(&session.cli(), &remote);
        } else {
            tracing::debug!(remote = %remote, "remote not configured in git; skipping fetch");
        }
    }

    let detail = DetailLevel::from_verbose_count(options.verbose);
    let report = session.report(detail != DetailLevel::Default)?;
    let formatter = SummaryFormatter::new(
        detail,
        Sections::from_flags(
            options.context,
            options.history,
            options.changes,
            options.files,
        ),
    );

    if options.json {
        let json = formatter
            .render_json(&report)
            .context("Failed to serialize status")?;
        println!("{json}");
    } else {
        println!("{}", formatter.render(&report));
    }
    Ok(())
}
