//! draft command - Render pending entries without writing anything

use anyhow::{Context as _, Result};

use super::{load_config, today};
use crate::engine::{self, Context, ReleaseMode, ReleaseOptions};
use crate::ui::prompts;

/// Print the changelog as it would look with the pending entries released
/// as `version`.
pub fn draft(ctx: &Context, version: &str, json: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let options = ReleaseOptions::new(version, ReleaseMode::Draft);
    let mut prompter = prompts::prompter(ctx.interactive);

    let (releases, document) = engine::run_draft(&config, &options, prompter.as_mut(), today())
        .context("Failed to render draft")?;

    if json {
        let json = serde_json::to_string_pretty(&releases)
            .context("Failed to serialize releases")?;
        println!("{}", json);
    } else {
        print!("{}", document);
    }
    Ok(())
}
