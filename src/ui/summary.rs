//! ui::summary
//!
//! SummaryFormatter: renders a [`WorkspaceReport`] as the `status` output.
//!
//! # Tiers
//!
//! - [`DetailLevel::Default`]: headers and one-line counts
//! - [`DetailLevel::Elevated`] (`-v`): adds commit and change listings,
//!   and the files a pull would merge
//! - [`DetailLevel::Full`] (`-vv`): adds per-file classification lists and
//!   stops truncating paths
//!
//! # Invariants
//!
//! - Every count on a compact line equals the number of lines in the
//!   matching detailed section. Counts and listings read the same
//!   collections, never a recomputation.
//! - Section filters hide sections; they never change a count.
//! - `-- Files to Merge:` has no count. Incoming changes are not the
//!   user's changes and stay out of the FILES line.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::types::{ChangeEntry, ChangeKind, RepoPath};
use crate::engine::renames::RenameOutcome;
use crate::engine::sync_state::SyncReport;
use crate::engine::workspace::WorkspaceReport;
use crate::git::CommitInfo;

/// Maximum display width of a path outside the full tier.
pub const TRUNCATE_WIDTH: usize = 35;

const NONE: &str = "  (none)";

/// How much detail `status` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum DetailLevel {
    #[default]
    Default,
    Elevated,
    Full,
}

impl DetailLevel {
    /// From the number of `-v` flags.
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => DetailLevel::Default,
            1 => DetailLevel::Elevated,
            _ => DetailLevel::Full,
        }
    }
}

/// Which sections render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    /// LOCAL and REMOTE lines.
    pub context: bool,
    /// COMMITS line and commit listings.
    pub history: bool,
    /// Change counts and the change listing.
    pub changes: bool,
    /// Classification counts and file lists.
    pub files: bool,
}

impl Sections {
    pub fn all() -> Self {
        Self {
            context: true,
            history: true,
            changes: true,
            files: true,
        }
    }

    /// From the status filter flags; no flags means everything.
    pub fn from_flags(context: bool, history: bool, changes: bool, files: bool) -> Self {
        if !(context || history || changes || files) {
            return Self::all();
        }
        Self {
            context,
            history,
            changes,
            files,
        }
    }
}

impl Default for Sections {
    fn default() -> Self {
        Self::all()
    }
}

/// Shorten `text` to `max` characters by replacing its middle with "...".
pub fn truncate_middle(text: &str, max: usize) -> String {
    let len = text.chars().count();
    if len <= max || max <= 3 {
        return text.to_string();
    }
    let keep = max - 3;
    let head = keep.div_ceil(2);
    let tail = keep - head;
    let start: String = text.chars().take(head).collect();
    let end: String = text.chars().skip(len - tail).collect();
    format!("{start}...{end}")
}

/// The compact counts shown on the FILES lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SummaryCounts {
    pub added: usize,
    pub modified: usize,
    pub renamed: usize,
    pub deleted: usize,
    pub undecided: usize,
    pub tracked: usize,
    pub untracked: usize,
    pub ignored: usize,
}

impl SummaryCounts {
    pub fn of(report: &WorkspaceReport) -> Self {
        let changes = &report.changes;
        let classes = report.classification.counts();
        Self {
            added: changes.count(ChangeKind::Added),
            modified: changes.count(ChangeKind::Modified),
            renamed: changes.count(ChangeKind::Renamed),
            deleted: changes.count(ChangeKind::Deleted),
            undecided: classes.undecided,
            tracked: classes.tracked,
            untracked: classes.untracked,
            ignored: classes.ignored,
        }
    }
}

/// Renders status output at one tier with one set of filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryFormatter {
    pub detail: DetailLevel,
    pub sections: Sections,
}

impl SummaryFormatter {
    pub fn new(detail: DetailLevel, sections: Sections) -> Self {
        Self { detail, sections }
    }

    fn display_path(&self, text: &str) -> String {
        if self.detail == DetailLevel::Full {
            text.to_string()
        } else {
            truncate_middle(text, TRUNCATE_WIDTH)
        }
    }

    fn display_entry(&self, entry: &ChangeEntry) -> String {
        let path = self.display_path(entry.path.as_str());
        match &entry.source {
            Some(source) => format!(
                "  {} {} -> {}",
                entry.kind.letter(),
                self.display_path(source.as_str()),
                path
            ),
            None => format!("  {} {}", entry.kind.letter(), path),
        }
    }

    /// Plain-text rendering, one line per element, no trailing newline.
    pub fn render(&self, report: &WorkspaceReport) -> String {
        let mut lines = Vec::new();
        let elevated = self.detail >= DetailLevel::Elevated;
        let full = self.detail == DetailLevel::Full;
        let counts = SummaryCounts::of(report);

        if self.sections.context {
            let ctx = &report.context;
            lines.push(format!(
                "LOCAL:   {} :: {}",
                self.display_path(&ctx.local_root.display().to_string()),
                ctx.local_branch
            ));
            match &ctx.remote_url {
                Some(url) => lines.push(format!(
                    "REMOTE:  {} :: {}",
                    self.display_path(url),
                    ctx.effective_remote_branch()
                )),
                None => lines.push("REMOTE:  (none) :: (none)".to_string()),
            }
        }

        if self.sections.history {
            lines.push(format!("COMMITS: {}", report.sync.state));
            if elevated {
                lines.push("  -- Commits to Push:".to_string());
                push_commits(&mut lines, &report.sync.to_push);
                lines.push("  -- Commits to Pull:".to_string());
                push_commits(&mut lines, &report.sync.to_pull);
            }
        }

        let mut label = "FILES:   ";
        if self.sections.changes {
            lines.push(format!(
                "{label}{} Added, {} Modified, {} Renamed, {} Deleted",
                counts.added, counts.modified, counts.renamed, counts.deleted
            ));
            label = "         ";
        }
        if self.sections.files {
            lines.push(format!(
                "{label}{} Undecided, {} Tracked, {} Untracked, {} Ignored",
                counts.undecided, counts.tracked, counts.untracked, counts.ignored
            ));
        }

        if self.sections.changes && elevated {
            lines.push("  -- Changes:".to_string());
            let before = lines.len();
            lines.extend(report.changes.entries().map(|e| self.display_entry(e)));
            if lines.len() == before {
                lines.push(NONE.to_string());
            }

            lines.push("  -- Files to Merge:".to_string());
            let before = lines.len();
            lines.extend(report.changes.incoming.entries().map(|e| self.display_entry(e)));
            if lines.len() == before {
                lines.push(NONE.to_string());
            }
        }

        if self.sections.files && full {
            let classes = &report.classification;
            push_files(&mut lines, "  -- Tracked Files:", classes.tracked.iter().map(plain));
            push_files(&mut lines, "  -- Untracked Files:", classes.untracked.iter().map(plain));
            push_files(&mut lines, "  -- Undecided Files:", classes.undecided.iter().map(plain));

            let ignored: BTreeMap<&RepoPath, String> = classes
                .ignored
                .iter()
                .map(|p| (p, plain(p)))
                .chain(classes.nested.iter().map(|p| (p, format!("{p}/ (repo)"))))
                .collect();
            push_files(&mut lines, "  -- Ignored Files:", ignored.into_values());
        }

        lines.join("\n")
    }

    /// JSON rendering of the same model.
    pub fn render_json(&self, report: &WorkspaceReport) -> serde_json::Result<String> {
        let ctx = &report.context;
        let classes = &report.classification;
        let json = JsonSummary {
            local: self.sections.context.then(|| JsonLocal {
                dir: ctx.local_root.display().to_string(),
                branch: ctx.local_branch.as_str(),
            }),
            remote: self
                .sections
                .context
                .then(|| {
                    ctx.remote_url.as_deref().map(|url| JsonRemote {
                        url,
                        branch: ctx.effective_remote_branch().as_str(),
                    })
                })
                .flatten(),
            sync: self.sections.history.then_some(&report.sync),
            sync_text: self.sections.history.then(|| report.sync.state.to_string()),
            counts: SummaryCounts::of(report),
            changes: self.sections.changes.then(|| JsonChanges {
                committed: &report.changes.committed,
                working: &report.changes.working,
                incoming: &report.changes.incoming,
            }),
            files: self.sections.files.then(|| JsonFiles {
                tracked: classes.tracked.iter().collect(),
                untracked: classes.untracked.iter().collect(),
                undecided: classes.undecided.iter().collect(),
                ignored: classes.ignored.iter().collect(),
                nested: classes.nested.iter().collect(),
            }),
        };
        serde_json::to_string_pretty(&json)
    }
}

fn plain(path: &RepoPath) -> String {
    path.to_string()
}

fn push_commits(lines: &mut Vec<String>, commits: &[CommitInfo]) {
    if commits.is_empty() {
        lines.push(NONE.to_string());
        return;
    }
    for commit in commits {
        lines.push(format!("  {} {}", commit.oid.short(7), commit.summary));
    }
}

fn push_files(lines: &mut Vec<String>, header: &str, items: impl Iterator<Item = String>) {
    lines.push(header.to_string());
    let before = lines.len();
    lines.extend(items.map(|item| format!("  {item}")));
    if lines.len() == before {
        lines.push(NONE.to_string());
    }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    local: Option<JsonLocal<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<JsonRemote<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync: Option<&'a SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sync_text: Option<String>,
    counts: SummaryCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<JsonChanges<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    files: Option<JsonFiles<'a>>,
}

#[derive(Serialize)]
struct JsonLocal<'a> {
    dir: String,
    branch: &'a str,
}

#[derive(Serialize)]
struct JsonRemote<'a> {
    url: &'a str,
    branch: &'a str,
}

#[derive(Serialize)]
struct JsonChanges<'a> {
    committed: &'a RenameOutcome,
    working: &'a RenameOutcome,
    incoming: &'a RenameOutcome,
}

#[derive(Serialize)]
struct JsonFiles<'a> {
    tracked: Vec<&'a RepoPath>,
    untracked: Vec<&'a RepoPath>,
    undecided: Vec<&'a RepoPath>,
    ignored: Vec<&'a RepoPath>,
    nested: Vec<&'a RepoPath>,
}
