//! diff command - Show uncommitted changes

use anyhow::Result;

use crate::engine::Context;
use crate::git::Vcs;

use super::session::Session;

/// Object id of the empty tree, the diff base before the first commit.
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Show `git diff HEAD`, limited to `paths` when given.
pub fn diff(ctx: &Context, paths: &[String]) -> Result<()> {
    let session = Session::open(ctx)?;
    let paths = paths
        .iter()
        .map(|p| session.repo_path(p))
        .collect::<Result<Vec<_>>>()?;

    let base = if session.git.head_oid()?.is_some() {
        "HEAD"
    } else {
        EMPTY_TREE
    };
    session.cli().diff(base, &paths)?;
    Ok(())
}
