//! engine::resolver
//!
//! ContextResolver: decides which repository, branch and remote one
//! invocation acts on.
//!
//! # Precedence
//!
//! 1. An explicit `--repo` directory, taken as the root with no search.
//! 2. Otherwise an upward walk from the start directory that stops at the
//!    first directory holding `.git` or `.vgl`, at the ceiling (inclusive),
//!    or at the filesystem root.
//! 3. Defaults for anything the record leaves unset (branch from config,
//!    `main` unless configured otherwise).
//!
//! # Repair
//!
//! | `.git` | `.vgl` | Outcome                                          |
//! |--------|--------|--------------------------------------------------|
//! | yes    | yes    | `Loaded`                                         |
//! | yes    | no     | `Fabricated` from live state, persisted unless   |
//! |        |        | the user declines                                |
//! | no     | yes    | `OrphanRemoved` or, if the user declines,        |
//! |        |        | `OrphanKept`                                     |
//! | no     | no     | `NotFound`                                       |
//!
//! A prompt that cannot be shown takes the non-interactive answer, which
//! is always the default. Nothing in here fails the command: IO problems
//! become diagnostics on the [`Resolution`].

use std::path::{Path, PathBuf};

use crate::core::config::Config;
use crate::core::context::{ContextStore, RepoContext};
use crate::core::paths::{self, lexical_normalize};
use crate::git::{Git, Vcs};
use crate::ui::prompts::Prompter;

use super::EngineError;

/// Inputs for one resolution.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Directory the search starts from (absolute).
    pub start: PathBuf,
    /// Explicit repository root, bypassing the search.
    pub explicit: Option<PathBuf>,
    /// Highest directory the search may inspect.
    pub ceiling: Option<PathBuf>,
}

impl ResolveRequest {
    pub fn new(start: impl Into<PathBuf>) -> Self {
        Self {
            start: start.into(),
            explicit: None,
            ceiling: None,
        }
    }
}

/// How the context was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Loaded,
    Fabricated,
    OrphanRemoved,
    OrphanKept,
    NotFound,
}

/// Outcome of [`ContextResolver::resolve`].
#[derive(Debug)]
pub struct Resolution {
    pub kind: ResolutionKind,
    /// Directory the outcome refers to, when one was found.
    pub root: Option<PathBuf>,
    pub context: Option<RepoContext>,
    /// Repository handle for the rest of the command.
    pub vcs: Option<Git>,
    /// True when a fabricated context was written to disk.
    pub persisted: bool,
    /// Messages worth showing the user.
    pub diagnostics: Vec<String>,
}

impl Resolution {
    fn without_context(kind: ResolutionKind, root: Option<PathBuf>, diagnostics: Vec<String>) -> Self {
        Self {
            kind,
            root,
            context: None,
            vcs: None,
            persisted: false,
            diagnostics,
        }
    }

    /// The context and repository handle, or "no repository found".
    pub fn require(self) -> Result<(RepoContext, Git), EngineError> {
        match (self.context, self.vcs) {
            (Some(ctx), Some(git)) => Ok((ctx, git)),
            _ => Err(EngineError::NoRepository { root: self.root }),
        }
    }
}

/// Resolves the effective [`RepoContext`] for an invocation.
pub struct ContextResolver<'a> {
    config: &'a Config,
    prompter: &'a dyn Prompter,
}

impl<'a> ContextResolver<'a> {
    pub fn new(config: &'a Config, prompter: &'a dyn Prompter) -> Self {
        Self { config, prompter }
    }

    /// Run the full precedence and repair logic.
    pub fn resolve(&self, request: &ResolveRequest) -> Resolution {
        let dir = match &request.explicit {
            Some(explicit) => {
                let explicit = if explicit.is_absolute() {
                    explicit.clone()
                } else {
                    request.start.join(explicit)
                };
                Some(lexical_normalize(&explicit))
            }
            None => locate(&request.start, request.ceiling.as_deref()),
        };

        let Some(dir) = dir else {
            tracing::debug!(start = %request.start.display(), "no repository above start directory");
            return Resolution::without_context(ResolutionKind::NotFound, None, Vec::new());
        };

        match (paths::is_vcs_root(&dir), paths::has_context_file(&dir)) {
            (true, true) => self.load(dir),
            (true, false) => self.fabricate_missing(dir),
            (false, true) => self.remove_orphan(dir),
            (false, false) => {
                Resolution::without_context(ResolutionKind::NotFound, Some(dir), Vec::new())
            }
        }
    }

    fn open(dir: &Path, diagnostics: &mut Vec<String>) -> Option<Git> {
        match Git::open(dir) {
            Ok(git) => Some(git),
            Err(err) => {
                diagnostics.push(format!("Cannot open Git repository at {}: {err}", dir.display()));
                None
            }
        }
    }

    fn load(&self, dir: PathBuf) -> Resolution {
        let mut diagnostics = Vec::new();
        let store = ContextStore::for_root(&dir);
        let Some(outcome) = store.read() else {
            // Removed between the existence check and the read.
            return self.fabricate_missing(dir);
        };

        let (context, notes) =
            RepoContext::from_file(outcome.file, &dir, &self.config.default_branch());
        diagnostics.extend(notes);
        tracing::debug!(root = %dir.display(), branch = %context.local_branch, "loaded context");

        let vcs = Self::open(&dir, &mut diagnostics);
        Resolution {
            kind: ResolutionKind::Loaded,
            root: Some(dir),
            context: Some(context),
            vcs,
            persisted: false,
            diagnostics,
        }
    }

    fn fabricate_missing(&self, dir: PathBuf) -> Resolution {
        let mut diagnostics = Vec::new();
        let vcs = Self::open(&dir, &mut diagnostics);
        let context = match &vcs {
            Some(git) => fabricate(git, &dir, self.config),
            None => RepoContext::new(&dir, self.config.default_branch()),
        };

        let question = format!("Git repository found at {}. Use it with vgl?", dir.display());
        let accepted = match self.prompter.confirm(&question, true) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::debug!(error = %err, "missing-context prompt unavailable; using default");
                true
            }
        };

        let mut persisted = false;
        if accepted {
            match persist(&dir, &context) {
                Ok(()) => {
                    persisted = true;
                    diagnostics.push(format!(
                        "Created .vgl for the Git repository at {}",
                        dir.display()
                    ));
                }
                Err(message) => diagnostics.push(message),
            }
        }

        Resolution {
            kind: ResolutionKind::Fabricated,
            root: Some(dir),
            context: Some(context),
            vcs,
            persisted,
            diagnostics,
        }
    }

    fn remove_orphan(&self, dir: PathBuf) -> Resolution {
        let mut diagnostics = Vec::new();
        let question = format!("Delete orphaned .vgl at {}?", dir.display());
        let delete = match self.prompter.confirm(&question, true) {
            Ok(answer) => answer,
            Err(err) => {
                tracing::debug!(error = %err, "orphan prompt unavailable; deleting");
                true
            }
        };

        if !delete {
            diagnostics.push(format!(
                "Kept orphaned .vgl at {}; it has no effect without a Git repository",
                dir.display()
            ));
            return Resolution::without_context(ResolutionKind::OrphanKept, Some(dir), diagnostics);
        }

        match ContextStore::for_root(&dir).delete() {
            Ok(()) => {
                diagnostics.push(format!(
                    "Found .vgl but no Git repository at {}; deleted the orphaned .vgl",
                    dir.display()
                ));
                Resolution::without_context(ResolutionKind::OrphanRemoved, Some(dir), diagnostics)
            }
            Err(err) => {
                diagnostics.push(err.to_string());
                Resolution::without_context(ResolutionKind::OrphanKept, Some(dir), diagnostics)
            }
        }
    }
}

/// Walk upward from `start` to the first directory holding `.git` or
/// `.vgl`. The ceiling itself is still inspected.
pub fn locate(start: &Path, ceiling: Option<&Path>) -> Option<PathBuf> {
    let start = lexical_normalize(start);
    let ceiling = ceiling.map(lexical_normalize);

    let mut current = Some(start.as_path());
    while let Some(dir) = current {
        if paths::is_vcs_root(dir) || paths::has_context_file(dir) {
            return Some(dir.to_path_buf());
        }
        if ceiling.as_deref() == Some(dir) {
            break;
        }
        current = dir.parent();
    }
    None
}

/// Build a context from live repository state.
///
/// Branch is the one HEAD names (unborn included), else the configured
/// default. The remote comes from the branch's upstream configuration,
/// else the default remote.
pub fn fabricate(vcs: &dyn Vcs, root: &Path, config: &Config) -> RepoContext {
    let branch = match vcs.current_branch() {
        Ok(Some(branch)) => branch,
        Ok(None) => config.default_branch(),
        Err(err) => {
            tracing::debug!(error = %err, "cannot read current branch");
            config.default_branch()
        }
    };

    let upstream = vcs.branch_upstream(&branch).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "cannot read branch upstream");
        Default::default()
    });
    let remote_name = match upstream.remote {
        Some(name) => Some(name),
        None => vcs.default_remote().ok().flatten(),
    };
    let remote_url = remote_name
        .as_deref()
        .and_then(|name| vcs.remote_url(name).ok().flatten());

    let context = RepoContext::new(root, branch);
    match remote_url {
        Some(url) => context.with_remote(url, upstream.merge),
        None => context,
    }
}

/// Save `context` and keep `.vgl` out of version control.
fn persist(root: &Path, context: &RepoContext) -> Result<(), String> {
    ContextStore::for_root(root)
        .save(context)
        .map_err(|e| e.to_string())?;
    if let Err(e) = paths::ensure_gitignore_entry(root) {
        tracing::warn!(root = %root.display(), error = %e, "could not update .gitignore");
    }
    Ok(())
}
