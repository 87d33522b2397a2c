//! Shared plumbing for verb handlers.
//!
//! A [`Session`] is one resolved repository: the context, one open
//! repository handle and, for mutating verbs, the repository lock. Handlers
//! change `session.context` in memory and call [`Session::save`] once.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::core::context::{ContextStore, RepoContext};
use crate::core::lock::ContextLock;
use crate::core::paths;
use crate::core::types::RepoPath;
use crate::engine::classify::{ClassifyError, FileClassification};
use crate::engine::resolver::{ContextResolver, ResolveRequest};
use crate::engine::sync_state;
use crate::engine::workspace::{self, WorkspaceOptions, WorkspaceReport};
use crate::engine::{Context, UserError};
use crate::git::{Git, GitCli, Vcs};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::{Prompter, StdinPrompter};

/// Directory the command runs in: `--cwd` or the process directory.
pub(super) fn cwd(ctx: &Context) -> Result<PathBuf> {
    let dir = match &ctx.cwd {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => std::env::current_dir()
            .context("Failed to read the current directory")?
            .join(dir),
        None => std::env::current_dir().context("Failed to read the current directory")?,
    };
    Ok(paths::lexical_normalize(&dir))
}

pub(super) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

pub(super) fn prompter(ctx: &Context) -> StdinPrompter {
    StdinPrompter::new(ctx.interactive)
}

/// Ask before putting a repository inside another one.
///
/// Returns `Ok(false)` when the user declined. Without a prompt the answer
/// is no; `--force` skips the question.
pub(super) fn confirm_nested_destination(
    dest: &Path,
    force: bool,
    prompter: &dyn Prompter,
) -> Result<bool> {
    let Some(parent) = dest.parent() else {
        return Ok(true);
    };
    let Some(outer) = crate::engine::resolver::locate(parent, None) else {
        return Ok(true);
    };
    if force || !paths::is_vcs_root(&outer) {
        return Ok(true);
    }

    let question = format!(
        "{} is inside the repository at {}. Continue?",
        dest.display(),
        outer.display()
    );
    match prompter.confirm(&question, false) {
        Ok(answer) => Ok(answer),
        Err(err) => {
            tracing::debug!(error = %err, "nested destination prompt unavailable");
            Err(UserError::new(format!(
                "{} is inside the repository at {}; use --force to continue",
                dest.display(),
                outer.display()
            ))
            .into())
        }
    }
}

/// Ask before throwing work away.
///
/// Without a prompt this fails, pointing at `--force`.
pub(super) fn confirm_destructive(prompter: &dyn Prompter, question: &str) -> Result<bool> {
    match prompter.confirm(question, false) {
        Ok(answer) => Ok(answer),
        Err(err) => {
            tracing::debug!(error = %err, "confirmation unavailable");
            bail!(UserError::new(format!(
                "{question} Use --force to skip the confirmation"
            )))
        }
    }
}

/// One resolved repository for the duration of a command.
pub(super) struct Session {
    pub cwd: PathBuf,
    pub context: RepoContext,
    pub git: Git,
    pub verbosity: Verbosity,
    default_remote: String,
    options: WorkspaceOptions,
    _lock: Option<ContextLock>,
}

impl Session {
    /// Resolve without locking, for verbs that only read.
    pub fn open(ctx: &Context) -> Result<Self> {
        Self::resolve(ctx, ctx.repo.clone(), false)
    }

    /// Resolve and take the repository lock.
    pub fn open_locked(ctx: &Context) -> Result<Self> {
        Self::resolve(ctx, ctx.repo.clone(), true)
    }

    /// Locked session for the repository rooted at `root`.
    pub fn open_at(ctx: &Context, root: &Path) -> Result<Self> {
        Self::resolve(ctx, Some(root.to_path_buf()), true)
    }

    fn resolve(ctx: &Context, explicit: Option<PathBuf>, lock: bool) -> Result<Self> {
        let cwd = cwd(ctx)?;
        let verbosity = verbosity(ctx);
        let prompter = prompter(ctx);

        let mut request = ResolveRequest::new(&cwd);
        request.explicit = explicit;
        request.ceiling = ctx.ceiling.clone();

        let resolution = ContextResolver::new(&ctx.config, &prompter).resolve(&request);
        tracing::debug!(kind = ?resolution.kind, root = ?resolution.root, "resolved context");
        for diagnostic in &resolution.diagnostics {
            output::warn(diagnostic, verbosity);
        }
        let (context, git) = resolution.require()?;

        let lock = if lock {
            Some(ContextLock::acquire(git.git_dir())?)
        } else {
            None
        };

        let default_remote = ctx.config.remote().to_string();
        let options = WorkspaceOptions {
            pairing: ctx.config.rename_pairing(),
            remote: default_remote.clone(),
            with_commits: false,
        };

        Ok(Self {
            cwd,
            context,
            git,
            verbosity,
            default_remote,
            options,
            _lock: lock,
        })
    }

    pub fn root(&self) -> &Path {
        &self.context.local_root
    }

    /// Runner for mutating and network git commands.
    pub fn cli(&self) -> GitCli {
        GitCli::new(self.git.work_dir())
    }

    /// Git remote name for the context's remote URL.
    pub fn remote_name(&self) -> String {
        sync_state::remote_name_for(&self.git, &self.context, &self.default_remote)
    }

    /// Make sure git knows the context's remote. Returns its name, or
    /// `None` for a local-only context.
    pub fn ensure_remote(&self) -> Result<Option<String>> {
        let Some(url) = self.context.remote_url.as_deref() else {
            return Ok(None);
        };
        if let Some(name) = self.git.remote_for_url(url)? {
            return Ok(Some(name));
        }

        let name = self.default_remote.clone();
        let cli = self.cli();
        if self.git.remote_url(&name)?.is_some() {
            tracing::info!(remote = %name, url, "pointing remote at context URL");
            cli.set_remote_url(&name, url)?;
        } else {
            tracing::info!(remote = %name, url, "adding remote");
            cli.add_remote(&name, url)?;
        }
        Ok(Some(name))
    }

    /// Remote name for a verb that needs one.
    pub fn require_remote(&self) -> Result<String> {
        match self.ensure_remote()? {
            Some(name) => Ok(name),
            None => bail!(UserError::new(
                "no remote configured; use 'vgl switch --remote-url URL' first"
            )),
        }
    }

    /// Full workspace report against the current context.
    pub fn report(&self, with_commits: bool) -> Result<WorkspaceReport> {
        let options = WorkspaceOptions {
            remote: self.remote_name(),
            with_commits,
            ..self.options.clone()
        };
        workspace::build(&self.git, &self.context, &options)
            .context("Failed to read the working tree")
    }

    /// Persist the context.
    pub fn save(&self) -> Result<()> {
        ContextStore::for_root(self.root()).save(&self.context)?;
        Ok(())
    }

    /// Map a command-line path onto the repository.
    pub fn repo_path(&self, input: &str) -> Result<RepoPath> {
        paths::to_repo_path(self.root(), &self.cwd, input).ok_or_else(|| {
            UserError::new(format!("'{input}' is not inside {}", self.root().display())).into()
        })
    }

    /// Matcher for `patterns` given relative to the working directory.
    pub fn matcher(&self, patterns: &[String]) -> Result<PathMatcher> {
        PathMatcher::new(self.root(), &self.cwd, patterns)
    }
}

const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

fn is_glob(pattern: &str) -> bool {
    pattern.contains(GLOB_CHARS)
}

/// Directory part of a glob before its first wildcard: `sub/lib` for
/// `sub/lib/*.rs`, nothing for `*.rs` or `sub*`.
fn glob_base(anchored: &str) -> Option<RepoPath> {
    let fixed = anchored.find(GLOB_CHARS).map_or(anchored, |at| &anchored[..at]);
    let dir = &fixed[..fixed.rfind('/')?];
    RepoPath::new(dir).ok()
}

/// Command-line path patterns resolved against the repository.
///
/// A plain path matches itself and everything below it. A glob is anchored
/// at the working directory and `*` crosses directory separators.
#[derive(Debug)]
pub(super) struct PathMatcher {
    globs: GlobSet,
    literals: Vec<RepoPath>,
    glob_bases: Vec<RepoPath>,
}

impl PathMatcher {
    pub fn new(root: &Path, cwd: &Path, patterns: &[String]) -> Result<Self> {
        let prefix = paths::lexical_normalize(cwd)
            .strip_prefix(paths::lexical_normalize(root))
            .map(|rel| rel.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();

        let mut builder = GlobSetBuilder::new();
        let mut literals = Vec::new();
        let mut glob_bases = Vec::new();
        for pattern in patterns {
            if is_glob(pattern) {
                let anchored = if prefix.is_empty() {
                    pattern.trim_start_matches("./").to_string()
                } else {
                    format!("{prefix}/{}", pattern.trim_start_matches("./"))
                };
                let glob = Glob::new(&anchored)
                    .map_err(|e| UserError::new(format!("invalid pattern '{pattern}': {e}")))?;
                builder.add(glob);
                glob_bases.extend(glob_base(&anchored));
            } else {
                let path = paths::to_repo_path(root, cwd, pattern).ok_or_else(|| {
                    UserError::new(format!("'{pattern}' is not inside {}", root.display()))
                })?;
                literals.push(path);
            }
        }

        Ok(Self {
            globs: builder.build()?,
            literals,
            glob_bases,
        })
    }

    /// Refuse patterns aimed at or into a nested repository: plain paths
    /// there, and globs whose fixed directory part lies there.
    ///
    /// # Errors
    ///
    /// [`ClassifyError::NestedRepository`] for the first such pattern.
    pub fn ensure_not_nested(
        &self,
        classification: &FileClassification,
    ) -> Result<(), ClassifyError> {
        self.literals
            .iter()
            .chain(&self.glob_bases)
            .try_for_each(|target| classification.ensure_not_nested(target))
    }

    pub fn is_match(&self, path: &RepoPath) -> bool {
        self.literals
            .iter()
            .any(|lit| path == lit || path.is_within(lit))
            || self.globs.is_match(path.as_str())
    }

    pub fn select<'a>(&self, paths: impl IntoIterator<Item = &'a RepoPath>) -> Vec<RepoPath> {
        paths
            .into_iter()
            .filter(|p| self.is_match(p))
            .cloned()
            .collect()
    }
}
