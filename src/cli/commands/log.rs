//! log command - Show the commits behind HEAD

use std::fmt::Display;

use anyhow::Result;
use chrono::TimeZone;

use crate::engine::Context;
use crate::git::CommitInfo;
use crate::ui::output;

use super::session::Session;

/// Print commits reachable from HEAD, newest first, one per line.
pub fn log(ctx: &Context, limit: Option<usize>) -> Result<()> {
    let session = Session::open(ctx)?;
    let commits = session.git.history(limit)?;
    if commits.is_empty() {
        output::print("No commits yet.", session.verbosity);
        return Ok(());
    }
    for commit in &commits {
        output::print(log_line(commit, &chrono::Local), session.verbosity);
    }
    Ok(())
}

/// `short-id  date time  summary  (author)`, with the time in `tz`.
fn log_line<Tz>(commit: &CommitInfo, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let when = commit.author_time.with_timezone(tz);
    format!(
        "{}  {}  {}  ({})",
        commit.oid.short(7),
        when.format("%Y-%m-%d %H:%M"),
        commit.summary,
        commit.author_name
    )
}
