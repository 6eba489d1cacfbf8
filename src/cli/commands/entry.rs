//! entry command - Record a new changelog entry

use anyhow::{Context as _, Result};

use super::{load_config, verbosity};
use crate::engine::record::{self, EntryRequest};
use crate::engine::Context;
use crate::ui::output;
use crate::ui::prompts;

/// Record a new entry in the configuration directory.
pub fn entry(
    ctx: &Context,
    kind: Option<String>,
    fields: Vec<(String, String)>,
    no_git_add: bool,
) -> Result<()> {
    let config = load_config(ctx)?;
    let cwd = ctx
        .working_dir()
        .context("Failed to determine the working directory")?;

    let request = EntryRequest {
        kind,
        fields,
        git_add: !no_git_add,
    };
    let mut prompter = prompts::prompter(ctx.interactive);
    let path = record::record(&config, &request, prompter.as_mut(), &cwd)
        .context("Failed to create entry")?;

    output::success(format!("Created entry {}", path.display()), verbosity(ctx));
    Ok(())
}
