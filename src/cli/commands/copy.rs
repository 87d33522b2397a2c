//! copy command - Clone a local repository for separate work

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::core::context::{ContextStore, RepoContext};
use crate::core::paths;
use crate::core::types::BranchName;
use crate::engine::{Context, UserError};
use crate::git::{Git, GitCli, Vcs};
use crate::ui::output;

use super::checkout::ensure_empty_destination;
use super::session::{self, Session};

/// Branch to carry over from the source, if it has commits.
fn source_branch(git: &Git) -> Result<Option<BranchName>> {
    if git.head_oid()?.is_none() {
        return Ok(None);
    }
    Ok(git.current_branch()?)
}

/// `--into DIR` clones the current repository into DIR; `--from DIR`
/// clones DIR into the working directory. The copy starts local-only on
/// the source's branch.
pub fn copy(ctx: &Context, into: Option<&Path>, from: Option<&Path>, force: bool) -> Result<()> {
    let cwd = session::cwd(ctx)?;
    let verbosity = session::verbosity(ctx);

    let (source, dest, branch): (PathBuf, PathBuf, Option<BranchName>) = match (into, from) {
        (Some(into), _) => {
            let session = Session::open(ctx)?;
            let branch = source_branch(&session.git)?;
            (
                session.root().to_path_buf(),
                paths::lexical_normalize(&cwd.join(into)),
                branch,
            )
        }
        (None, Some(from)) => {
            let source = paths::lexical_normalize(&cwd.join(from));
            if !paths::is_vcs_root(&source) {
                bail!(UserError::new(format!(
                    "no Git repository at {}",
                    source.display()
                )));
            }
            let branch = source_branch(&Git::open(&source)?)?;
            (source, cwd.clone(), branch)
        }
        (None, None) => bail!(UserError::new("give --into DIR or --from DIR")),
    };

    if dest == source {
        bail!(UserError::new("source and destination are the same directory"));
    }
    ensure_empty_destination(&dest)?;

    let prompter = session::prompter(ctx);
    if !session::confirm_nested_destination(&dest, force, &prompter)? {
        output::print("Copy cancelled.", verbosity);
        return Ok(());
    }

    let parent = dest.parent().unwrap_or(&cwd);
    std::fs::create_dir_all(parent)?;
    GitCli::new(parent).clone_into(&source.to_string_lossy(), &dest, branch.as_ref())?;

    let git = Git::open(&dest)?;
    let local_branch = match git.current_branch()? {
        Some(branch) => branch,
        None => branch.unwrap_or_else(|| ctx.config.default_branch()),
    };
    let context = RepoContext::new(&dest, local_branch);
    ContextStore::for_root(&dest).save(&context)?;
    if let Err(err) = paths::ensure_gitignore_entry(&dest) {
        output::warn(
            format!("could not add .vgl to .gitignore: {err}"),
            verbosity,
        );
    }

    output::print(
        format!(
            "Copied {} into {} on branch '{}'",
            source.display(),
            dest.display(),
            context.local_branch
        ),
        verbosity,
    );
    Ok(())
}
