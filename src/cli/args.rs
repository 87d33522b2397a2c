//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--repo <path>`: Act on this repository root, skipping the search
//! - `--ceiling <path>`: Stop the repository search here (`VGL_CEILING`)
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

use crate::core::types::BranchName;

/// vgl - a friendlier front end for git
#[derive(Parser, Debug)]
#[command(name = "vgl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if vgl was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Repository root to act on, skipping the upward search
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Never search for a repository above this directory
    #[arg(long, global = true, env = "VGL_CEILING")]
    pub ceiling: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Determine if interactive mode is enabled.
    ///
    /// `--interactive` wins; `--no-interactive` and `--quiet` disable
    /// prompts; otherwise the config decides, and stdin must be a terminal.
    pub fn interactive(&self, config_allows: bool) -> bool {
        if self.interactive_flag {
            true
        } else if self.no_interactive || self.quiet {
            false
        } else {
            config_allows && std::io::stdin().is_terminal()
        }
    }
}

fn parse_branch(raw: &str) -> Result<BranchName, String> {
    BranchName::new(raw).map_err(|e| e.to_string())
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a repository and start using it with vgl
    #[command(
        long_about = "Create a repository and start using it with vgl.\n\n\
            Initializes a Git repository in DIR (default: the current directory), \
            writes the .vgl context file and adds it to .gitignore. Creating a \
            repository inside another one asks first, or needs --force.",
        after_help = "\
EXAMPLES:
    vgl create
    vgl create ../scratch -b trunk
    vgl create --remote git@example.com:me/app.git"
    )]
    Create {
        /// Directory for the new repository
        dir: Option<PathBuf>,

        /// Initial branch
        #[arg(short, long, value_parser = parse_branch)]
        branch: Option<BranchName>,

        /// Remote URL to record
        #[arg(long)]
        remote: Option<String>,

        /// Remote branch, defaults to the local branch
        #[arg(long, value_parser = parse_branch, requires = "remote")]
        remote_branch: Option<BranchName>,

        /// Create even inside another repository
        #[arg(short, long)]
        force: bool,
    },

    /// Start tracking undecided files
    #[command(group(ArgGroup::new("what").required(true).args(["patterns", "all"])))]
    Track {
        /// Paths or glob patterns
        patterns: Vec<String>,

        /// Track every undecided file
        #[arg(long)]
        all: bool,
    },

    /// Stop tracking files, keeping them on disk
    #[command(group(ArgGroup::new("what").required(true).args(["patterns", "all"])))]
    Untrack {
        /// Paths or glob patterns
        patterns: Vec<String>,

        /// Untrack every tracked file
        #[arg(long)]
        all: bool,
    },

    /// Commit all changes to tracked files
    Commit {
        /// Commit message
        message: String,

        /// Replace the previous commit
        #[arg(long)]
        amend: bool,
    },

    /// Show uncommitted changes
    Diff {
        /// Limit to these paths
        paths: Vec<String>,
    },

    /// List commits on the current branch, newest first
    Log {
        /// Show at most this many commits
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show repository, sync and file state
    #[command(
        long_about = "Show repository, sync and file state.\n\n\
            The default output is one line per section with counts. -v adds \
            commit and change listings, -vv adds every file by classification.",
        after_help = "\
EXAMPLES:
    vgl status
    vgl status -v --changes
    vgl status -vv --json"
    )]
    Status {
        /// More detail; repeat for full listings
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Skip fetching from the remote first
        #[arg(long)]
        no_fetch: bool,

        /// Machine-readable output
        #[arg(long)]
        json: bool,

        /// Only the change section
        #[arg(long)]
        changes: bool,

        /// Only the file sections
        #[arg(long)]
        files: bool,

        /// Only the commit section
        #[arg(long)]
        history: bool,

        /// Only the LOCAL and REMOTE lines
        #[arg(long)]
        context: bool,
    },

    /// Point vgl at another branch, remote or directory
    Switch {
        /// Local branch
        #[arg(long, value_parser = parse_branch)]
        branch: Option<BranchName>,

        /// Remote URL
        #[arg(long)]
        remote_url: Option<String>,

        /// Remote branch
        #[arg(long, value_parser = parse_branch)]
        remote_branch: Option<BranchName>,

        /// Repository directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Swap to the previous context
    Jump,

    /// Abandon a merge stopped by conflicts
    Abort,

    /// Merge another branch into the current one
    #[command(group(ArgGroup::new("source").required(true).args(["branch", "remote_branch"])))]
    Merge {
        /// Local branch to merge
        #[arg(long, value_parser = parse_branch)]
        branch: Option<BranchName>,

        /// Remote branch to merge
        #[arg(long, value_parser = parse_branch)]
        remote_branch: Option<BranchName>,
    },

    /// Start a new branch from the current one
    Split {
        /// New branch name
        #[arg(value_parser = parse_branch)]
        new_branch: BranchName,

        /// Branch to start from, defaults to the current one
        #[arg(long, value_parser = parse_branch)]
        from: Option<BranchName>,

        /// Also create it on the remote
        #[arg(long)]
        push: bool,
    },

    /// Send local commits to the remote
    Push {
        /// Show what would happen
        #[arg(long)]
        dry_run: bool,
    },

    /// Bring remote commits into the local branch
    Pull {
        /// Show what would happen
        #[arg(long)]
        dry_run: bool,

        /// Pull even with uncommitted changes
        #[arg(short, long)]
        force: bool,
    },

    /// Pull, then push
    Sync {
        /// Show what would happen
        #[arg(long)]
        dry_run: bool,
    },

    /// Throw away uncommitted changes
    Restore {
        /// Limit to these paths
        paths: Vec<String>,

        /// Revision to restore from
        #[arg(long, default_value = "HEAD")]
        from: String,

        /// Skip the confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// Delete a local or remote branch
    #[command(group(ArgGroup::new("target").required(true).args(["branch", "remote_branch"])))]
    Delete {
        /// Local branch
        #[arg(long, value_parser = parse_branch)]
        branch: Option<BranchName>,

        /// Remote branch
        #[arg(long, value_parser = parse_branch)]
        remote_branch: Option<BranchName>,

        /// Delete even if unmerged
        #[arg(short, long)]
        force: bool,
    },

    /// Clone a remote repository and start using it
    Checkout {
        /// Remote URL
        url: String,

        /// Destination directory, defaults to the repository name
        dir: Option<PathBuf>,

        /// Branch to check out
        #[arg(long, value_parser = parse_branch)]
        branch: Option<BranchName>,
    },

    /// Clone a local repository for separate work
    #[command(group(ArgGroup::new("direction").required(true).args(["into", "from"])))]
    Copy {
        /// Copy this repository into DIR
        #[arg(long)]
        into: Option<PathBuf>,

        /// Copy the repository at DIR into the current directory
        #[arg(long)]
        from: Option<PathBuf>,

        /// Copy even inside another repository
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("vgl").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn status_flags() {
        let cli = parse(&["status", "-vv", "--json", "--no-fetch"]).unwrap();
        match cli.command {
            Command::Status {
                verbose,
                json,
                no_fetch,
                ..
            } => {
                assert_eq!(verbose, 2);
                assert!(json);
                assert!(no_fetch);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_verb() {
        let cli = parse(&["status", "--repo", "/w/r", "-q"]).unwrap();
        assert_eq!(cli.repo, Some(PathBuf::from("/w/r")));
        assert!(cli.quiet);
        assert!(!cli.interactive(true));
    }

    #[test]
    fn log_limit() {
        let cli = parse(&["log", "-n", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Log { limit: Some(3) }));
        let cli = parse(&["log"]).unwrap();
        assert!(matches!(cli.command, Command::Log { limit: None }));
    }

    #[test]
    fn invalid_branch_rejected() {
        assert!(parse(&["split", "bad..name"]).is_err());
        assert!(parse(&["switch", "--branch", "ok/name"]).is_ok());
    }

    #[test]
    fn track_needs_a_target() {
        assert!(parse(&["track"]).is_err());
        assert!(parse(&["track", "--all"]).is_ok());
        assert!(parse(&["track", "*.rs", "docs/"]).is_ok());
    }

    #[test]
    fn merge_and_delete_need_one_source() {
        assert!(parse(&["merge"]).is_err());
        assert!(parse(&["merge", "--branch", "a", "--remote-branch", "b"]).is_err());
        assert!(parse(&["delete", "--remote-branch", "old"]).is_ok());
    }

    #[test]
    fn interactive_flag_wins() {
        let cli = parse(&["--interactive", "jump"]).unwrap();
        assert!(cli.interactive(false));
    }
}
