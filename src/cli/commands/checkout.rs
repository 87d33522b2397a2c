//! checkout command - Clone a remote repository and start using it

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};

use crate::core::context::ContextStore;
use crate::core::paths;
use crate::core::types::BranchName;
use crate::engine::resolver::fabricate;
use crate::engine::{Context, UserError};
use crate::git::{Git, GitCli};
use crate::ui::output;

use super::session;

/// Directory name a clone of `url` gets by default.
pub(super) fn repo_name(url: &str) -> Option<&str> {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed.rsplit(['/', ':', '\\']).next()?;
    let name = last.strip_suffix(".git").unwrap_or(last);
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// Refuse destinations that exist and hold anything.
pub(super) fn ensure_empty_destination(dest: &Path) -> Result<()> {
    match std::fs::read_dir(dest) {
        Ok(mut entries) => {
            if entries.next().is_some() {
                bail!(UserError::new(format!(
                    "destination {} exists and is not empty",
                    dest.display()
                )));
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) if dest.is_file() => Err(UserError::new(format!(
            "destination {} is a file: {e}",
            dest.display()
        ))
        .into()),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", dest.display())),
    }
}

/// Clone `url` into `dir` (default: the repository name) and write its
/// context with the remote recorded.
pub fn checkout(
    ctx: &Context,
    url: &str,
    dir: Option<&Path>,
    branch: Option<&BranchName>,
) -> Result<()> {
    let cwd = session::cwd(ctx)?;
    let verbosity = session::verbosity(ctx);

    let dest: PathBuf = match dir {
        Some(dir) => paths::lexical_normalize(&cwd.join(dir)),
        None => {
            let name = repo_name(url).ok_or_else(|| {
                UserError::new(format!(
                    "cannot derive a directory name from '{url}'; give one"
                ))
            })?;
            cwd.join(name)
        }
    };
    ensure_empty_destination(&dest)?;

    GitCli::new(&cwd).clone_into(url, &dest, branch)?;

    let git = Git::open(&dest)?;
    let mut context = fabricate(&git, &dest, &ctx.config);
    if context.remote_url.is_none() {
        context.remote_url = Some(url.to_string());
    }
    ContextStore::for_root(&dest).save(&context)?;
    if let Err(err) = paths::ensure_gitignore_entry(&dest) {
        output::warn(
            format!("could not add .vgl to .gitignore: {err}"),
            verbosity,
        );
    }

    output::print(
        format!(
            "Checked out {url} into {} on branch '{}'",
            dest.display(),
            context.local_branch
        ),
        verbosity,
    );
    Ok(())
}
