//! cli
//!
//! Command-line interface layer for vgl.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the user configuration and set up logging
//! - Dispatch to command handlers
//! - Map failures to exit codes
//!
//! # Exit Codes
//!
//! - `0` success
//! - `1` the request was wrong: no repository, bad arguments, a nested
//!   repository target
//! - `2` anything else

pub mod args;
pub mod commands;

pub use args::Cli;

use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::engine::{self, ClassifyError, EngineError, UserError};
use crate::ui::output;

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "VGL_LOG";

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            err.print()?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    init_tracing(cli.debug);

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            output::warn(
                format!("{err}; using default configuration"),
                output::Verbosity::from_flags(cli.quiet, cli.debug),
            );
            Config::default()
        }
    };
    if let Some(path) = config.loaded_from() {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        repo: cli.repo.clone(),
        ceiling: cli
            .ceiling
            .clone()
            .or_else(|| config.ceiling().map(|p| p.to_path_buf())),
        debug: cli.debug,
        quiet: cli.quiet,
        interactive: cli.interactive(config.interactive()),
        fetch: config.fetch(),
        config,
    };

    commands::dispatch(cli.command, &ctx)
}

/// Exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let user_error = err.chain().any(|cause| {
        cause.is::<UserError>()
            || cause.is::<ClassifyError>()
            || cause.is::<clap::Error>()
            || cause
                .downcast_ref::<EngineError>()
                .is_some_and(EngineError::is_user_error)
    });
    if user_error {
        1
    } else {
        2
    }
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}
