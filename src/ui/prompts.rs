//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! Everything that needs a value from the user asks a [`Prompter`]. The
//! engine never reads stdin itself, so the entry flow and the release
//! description work the same from a terminal, from flags, or from a test
//! script.
//!
//! In non-interactive mode every prompt returns
//! [`PromptError::NotInteractive`]; callers either fall back to a default
//! or fail with a clear error message.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

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

/// Source of user-supplied values.
pub trait Prompter {
    /// Prompt for text input.
    ///
    /// An empty answer yields `default` when one is given.
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, PromptError>;

    /// Prompt for confirmation (yes/no).
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError>;
}

/// Build the prompter matching the interactive flag.
pub fn prompter(interactive: bool) -> Box<dyn Prompter> {
    if interactive {
        Box::new(ConsolePrompter)
    } else {
        Box::new(NonInteractive)
    }
}

/// Prompts on stderr and reads answers from stdin.
#[derive(Debug, Default)]
pub struct ConsolePrompter;

impl ConsolePrompter {
    fn read_line(prompt: &str) -> Result<String, PromptError> {
        let mut stderr = io::stderr();
        write!(stderr, "{}", prompt).map_err(|e| PromptError::IoError(e.to_string()))?;
        stderr
            .flush()
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl Prompter for ConsolePrompter {
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let prompt = match default {
            Some(default) if !default.is_empty() => format!("{} [{}]: ", message, default),
            _ => format!("{}: ", message),
        };
        let answer = Self::read_line(&prompt)?;
        if answer.trim().is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            let answer = Self::read_line(&format!("{} [{}]: ", message, hint))?;
            match answer.trim().to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => eprintln!("Error: invalid input"),
            }
        }
    }
}

/// Refuses every prompt.
#[derive(Debug, Default)]
pub struct NonInteractive;

impl Prompter for NonInteractive {
    fn input(&mut self, _message: &str, _default: Option<&str>) -> Result<String, PromptError> {
        Err(PromptError::NotInteractive)
    }

    fn confirm(&mut self, _message: &str, _default: bool) -> Result<bool, PromptError> {
        Err(PromptError::NotInteractive)
    }
}

/// Answers prompts from a fixed script, in order.
///
/// An empty answer behaves like pressing enter at a console prompt. Running
/// out of answers cancels the prompt.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    /// Messages of the prompts that were asked.
    pub asked: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }

    fn next(&mut self, message: &str) -> Result<String, PromptError> {
        self.asked.push(message.to_string());
        self.answers.pop_front().ok_or(PromptError::Cancelled)
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, message: &str, default: Option<&str>) -> Result<String, PromptError> {
        let answer = self.next(message)?;
        if answer.is_empty() {
            Ok(default.unwrap_or_default().to_string())
        } else {
            Ok(answer)
        }
    }

    fn confirm(&mut self, message: &str, default: bool) -> Result<bool, PromptError> {
        let answer = self.next(message)?;
        Ok(match answer.to_lowercase().as_str() {
            "" => default,
            "y" | "yes" => true,
            _ => false,
        })
    }
}
