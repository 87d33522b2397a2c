//! create command - Start a repository and use it with vgl

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use crate::core::context::{ContextStore, RepoContext};
use crate::core::lock::ContextLock;
use crate::core::paths;
use crate::core::types::BranchName;
use crate::engine::resolver::fabricate;
use crate::engine::{Context, UserError};
use crate::git::{Git, GitCli, Vcs};
use crate::ui::output;

use super::session;

/// Create a repository in `dir` (default: the working directory).
///
/// An existing Git repository without a context is adopted instead of
/// re-initialized.
pub fn create(
    ctx: &Context,
    dir: Option<&Path>,
    branch: Option<BranchName>,
    remote: Option<&str>,
    remote_branch: Option<BranchName>,
    force: bool,
) -> Result<()> {
    let cwd = session::cwd(ctx)?;
    let verbosity = session::verbosity(ctx);
    let dest = paths::lexical_normalize(&cwd.join(dir.unwrap_or_else(|| Path::new("."))));

    if paths::is_vcs_root(&dest) && paths::has_context_file(&dest) {
        bail!(UserError::new(format!(
            "{} is already a vgl repository",
            dest.display()
        )));
    }

    let adopting = paths::is_vcs_root(&dest);
    if !adopting {
        let prompter = session::prompter(ctx);
        if !session::confirm_nested_destination(&dest, force, &prompter)? {
            output::print("Create cancelled.", verbosity);
            return Ok(());
        }
        std::fs::create_dir_all(&dest)
            .with_context(|| format!("Failed to create directory {}", dest.display()))?;
    }

    let git = if adopting {
        Git::open(&dest)?
    } else {
        let initial = branch.clone().unwrap_or_else(|| ctx.config.default_branch());
        Git::init(&dest, &initial)
            .with_context(|| format!("Failed to initialize a repository in {}", dest.display()))?
    };
    let _lock = ContextLock::acquire(git.git_dir())?;
    let cli = GitCli::new(&dest);

    let mut context = if adopting {
        fabricate(&git, &dest, &ctx.config)
    } else {
        RepoContext::new(&dest, ctx.config.default_branch())
    };

    if let Some(branch) = branch {
        if adopting && git.head_oid()?.is_some() && context.local_branch != branch {
            bail!(UserError::new(format!(
                "{} already has commits on '{}'; use 'vgl split {}' to start a new branch",
                dest.display(),
                context.local_branch,
                branch
            )));
        }
        if adopting {
            cli.set_unborn_branch(&branch)?;
        }
        context.local_branch = branch;
    }

    if let Some(url) = remote {
        let name = ctx.config.remote();
        match git.remote_url(name)? {
            Some(existing) if existing == url => {}
            Some(_) => cli.set_remote_url(name, url)?,
            None => cli.add_remote(name, url)?,
        }
        context = context.with_remote(url, remote_branch);
    }

    ContextStore::for_root(&dest).save(&context)?;
    if let Err(err) = paths::ensure_gitignore_entry(&dest) {
        output::warn(
            format!("could not add .vgl to .gitignore: {err}"),
            verbosity,
        );
    }

    let verb = if adopting { "Using" } else { "Created" };
    output::print(
        format!(
            "{verb} repository at {} on branch '{}'",
            dest.display(),
            context.local_branch
        ),
        verbosity,
    );
    if let Some(url) = &context.remote_url {
        output::print(
            format!("Remote: {url} on branch '{}'", context.effective_remote_branch()),
            verbosity,
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_ctx(cwd: &Path) -> Context {
        Context {
            cwd: Some(cwd.to_path_buf()),
            quiet: true,
            interactive: false,
            ..Context::default()
        }
    }

    #[test]
    fn creates_repository_context_and_gitignore() {
        let dir = TempDir::new().unwrap();
        let ctx = quiet_ctx(dir.path());
        let branch = BranchName::new("trunk").unwrap();

        create(&ctx, Some(Path::new("proj")), Some(branch.clone()), None, None, false).unwrap();

        let root = dir.path().join("proj");
        assert!(paths::is_vcs_root(&root));
        let outcome = ContextStore::for_root(&root).read().unwrap();
        assert_eq!(outcome.file.endpoint.local_branch, Some(branch));
        let ignore = std::fs::read_to_string(root.join(".gitignore")).unwrap();
        assert!(ignore.lines().any(|l| l == ".vgl"));
    }

    #[test]
    fn records_remote() {
        let dir = TempDir::new().unwrap();
        let ctx = quiet_ctx(dir.path());
        create(
            &ctx,
            Some(Path::new("r")),
            None,
            Some("/srv/git/r.git"),
            Some(BranchName::new("develop").unwrap()),
            false,
        )
        .unwrap();

        let root = dir.path().join("r");
        let git = Git::open(&root).unwrap();
        assert_eq!(
            git.remote_url("origin").unwrap().as_deref(),
            Some("/srv/git/r.git")
        );
        let outcome = ContextStore::for_root(&root).read().unwrap();
        assert_eq!(
            outcome.file.endpoint.remote_branch,
            Some(BranchName::new("develop").unwrap())
        );
    }

    #[test]
    fn second_create_is_a_user_error() {
        let dir = TempDir::new().unwrap();
        let ctx = quiet_ctx(dir.path());
        create(&ctx, None, None, None, None, false).unwrap();
        let err = create(&ctx, None, None, None, None, false).unwrap_err();
        assert!(err.is::<UserError>());
    }

    #[test]
    fn nested_create_needs_force_without_prompt() {
        let dir = TempDir::new().unwrap();
        let ctx = quiet_ctx(dir.path());
        create(&ctx, None, None, None, None, false).unwrap();

        let err = create(&ctx, Some(Path::new("inner")), None, None, None, false).unwrap_err();
        assert!(err.is::<UserError>());
        assert!(!dir.path().join("inner").exists());

        create(&ctx, Some(Path::new("inner")), None, None, None, true).unwrap();
        assert!(paths::is_vcs_root(&dir.path().join("inner")));
    }
}
