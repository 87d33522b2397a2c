//! ui::prompts
//!
//! Yes/no confirmations.
//!
//! # Design
//!
//! Callers hold a `&dyn Prompter` and never read stdin themselves. A
//! non-interactive run gets a prompter that always answers
//! `Err(PromptError::NotInteractive)`, and the caller takes its
//! non-interactive path. Tests use [`ScriptedPrompter`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{BufRead, Write};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Asks the user a yes/no question.
pub trait Prompter {
    /// `Ok(answer)`, with `default` on an empty reply.
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError>;
}

/// Reads answers from stdin, writes questions to stderr.
#[derive(Debug, Clone, Copy)]
pub struct StdinPrompter {
    interactive: bool,
}

impl StdinPrompter {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

/// Interpret one reply line. `None` for anything unrecognized.
fn parse_answer(line: &str, default: bool) -> Option<bool> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

impl Prompter for StdinPrompter {
    fn confirm(&self, message: &str, default: bool) -> Result<bool, PromptError> {
        if !self.interactive {
            return Err(PromptError::NotInteractive);
        }
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        let stdin = std::io::stdin();
        let mut stderr = std::io::stderr();

        loop {
            write!(stderr, "{message} {hint} ").map_err(|e| PromptError::IoError(e.to_string()))?;
            stderr
                .flush()
                .map_err(|e| PromptError::IoError(e.to_string()))?;

            let mut line = String::new();
            let read = stdin
                .lock()
                .read_line(&mut line)
                .map_err(|e| PromptError::IoError(e.to_string()))?;
            if read == 0 {
                return Err(PromptError::Cancelled);
            }
            if let Some(answer) = parse_answer(&line, default) {
                return Ok(answer);
            }
        }
    }
}

/// Replays canned answers; `None` entries fail as non-interactive.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<Option<bool>>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    /// A prompter that is never interactive.
    pub fn non_interactive() -> Self {
        Self::default()
    }

    /// Every question asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, message: &str, _default: bool) -> Result<bool, PromptError> {
        self.asked.borrow_mut().push(message.to_string());
        match self.answers.borrow_mut().pop_front() {
            Some(Some(answer)) => Ok(answer),
            _ => Err(PromptError::NotInteractive),
        }
    }
}
