//! ui::output
//!
//! User-facing messages.
//!
//! # Design
//!
//! Progress lines go through here and respect the quiet flag. Diagnostics
//! go through `tracing` instead. Rendered documents and JSON are data, not
//! messages, and are printed by the commands directly.

use std::fmt::Display;
use std::path::{Path, PathBuf};

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Only errors and data
    Quiet,
    Normal,
    /// Also list every file touched
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags. Quiet wins over debug.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a success message, marked as such (respects quiet mode).
pub fn success(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", format_success(message));
    }
}

/// The line [`success`] prints.
pub fn format_success(message: impl Display) -> String {
    format!("✓ {}", message)
}

/// Print a fatal error (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print the files a run touched, in debug mode only.
pub fn files(heading: &str, paths: &[PathBuf], verbosity: Verbosity) {
    if verbosity == Verbosity::Debug && !paths.is_empty() {
        println!("{}\n{}", heading, format_paths(paths, "  - "));
    }
}

/// One path per line, each behind `prefix`.
pub fn format_paths<P: AsRef<Path>>(paths: &[P], prefix: &str) -> String {
    paths
        .iter()
        .map(|path| format!("{}{}", prefix, path.as_ref().display()))
        .collect::<Vec<_>>()
        .join("\n")
}
