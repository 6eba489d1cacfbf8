//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Loads the configuration through [`load_config`]
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers return `anyhow::Result` and attach context to engine errors;
//! they do not write changelog files themselves.

mod completion;
mod draft;
mod entry;
mod init;
mod release;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use draft::draft;
pub use entry::entry;
pub use init::init;
pub use release::{partial, release};

use anyhow::{Context as _, Result};
use chrono::NaiveDate;

use crate::cli::args::Command;
use crate::core::config::Config;
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            path,
            format,
            force,
        } => init::init(ctx, path.as_deref(), format, force),
        Command::Entry {
            kind,
            fields,
            no_git_add,
        } => entry::entry(ctx, kind, fields, no_git_add),
        Command::Draft { version, json } => draft::draft(ctx, &version, json),
        Command::Release {
            version,
            empty,
            check,
            description,
        } => release::release(ctx, &version, empty, check, description),
        Command::Partial { check } => release::partial(ctx, check),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load the configuration for the context's working directory.
pub(crate) fn load_config(ctx: &Context) -> Result<Config> {
    let cwd = ctx
        .working_dir()
        .context("Failed to determine the working directory")?;
    let loaded = Config::load(&cwd, ctx.config.as_deref())?;
    Ok(loaded.config)
}

pub(crate) fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}

pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
