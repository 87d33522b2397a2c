//! abort command - Give up on a merge stopped by conflicts

use anyhow::Result;

use crate::engine::Context;
use crate::ui::output;

use super::session::Session;

/// Abort the merge in progress, if there is one.
///
/// Succeeds either way; only a missing repository is an error.
pub fn abort(ctx: &Context) -> Result<()> {
    let session = Session::open_locked(ctx)?;
    if !session.git.merge_in_progress() {
        output::print("No merge in progress.", session.verbosity);
        return Ok(());
    }
    session.cli().merge_abort()?;
    output::print("Merge aborted.", session.verbosity);
    Ok(())
}
