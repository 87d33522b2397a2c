//! ui::output
//!
//! Where verb handlers send their messages.
//!
//! Results go to stdout. Warnings and errors go to stderr so scripts can
//! read results without filtering. `--quiet` silences everything except
//! errors.

use std::fmt::Display;

/// How much a command prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    #[default]
    Normal,
    /// Normal output; tracing runs at debug level
    Debug,
}

impl Verbosity {
    /// `--quiet` wins over `--debug`.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Debug,
            (false, false) => Verbosity::Normal,
        }
    }

    fn shows_results(self) -> bool {
        self != Verbosity::Quiet
    }
}

/// A result line on stdout.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_results() {
        println!("{message}");
    }
}

/// A heading followed by one indented line per path.
pub fn print_files<T: Display>(heading: impl Display, paths: &[T], verbosity: Verbosity) {
    if verbosity.shows_results() {
        println!("{heading}");
        if !paths.is_empty() {
            println!("{}", indented(paths));
        }
    }
}

/// `warning: ...` on stderr.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity.shows_results() {
        eprintln!("warning: {message}");
    }
}

/// `error: ...` on stderr, whatever the verbosity.
pub fn error(message: impl Display) {
    eprintln!("error: {message}");
}

/// Items two spaces in, one per line.
pub fn indented<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("  {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
