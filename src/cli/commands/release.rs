//! release and partial commands - Regenerate the changelog document

use anyhow::{Context as _, Result};

use super::{load_config, today, verbosity};
use crate::core::config::Config;
use crate::engine::{self, Context, ReleaseMode, ReleaseOptions, ReleaseOutcome};
use crate::ui::output;
use crate::ui::prompts;

/// Persist pending entries as release `version`.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `version` - Version of the new release
/// * `empty` - Allow a release without entries
/// * `check` - Fail if the document on disk was out of date
/// * `description` - Release description; skips the prompt
pub fn release(
    ctx: &Context,
    version: &str,
    empty: bool,
    check: bool,
    description: Option<String>,
) -> Result<()> {
    let config = load_config(ctx)?;
    let mut options = ReleaseOptions::new(version, ReleaseMode::Final);
    options.allow_empty = empty;
    options.check = check;
    options.description = description;

    let outcome = commit(ctx, &config, &options)
        .with_context(|| format!("Failed to release '{}'", version))?;

    let verbosity = verbosity(ctx);
    if let Some(file) = &outcome.release_file {
        output::print(format!("Saved release {}", file.display()), verbosity);
    }
    output::files("Removed entries:", &outcome.removed, verbosity);
    output::success(
        format!(
            "Released {} ({} entries); wrote {}",
            version,
            outcome.removed.len(),
            outcome.output_path.display()
        ),
        verbosity,
    );
    Ok(())
}

/// Render pending entries as the partial release and rewrite the document.
pub fn partial(ctx: &Context, check: bool) -> Result<()> {
    let config = load_config(ctx)?;
    let mut options = ReleaseOptions::new(config.partial_release_name(), ReleaseMode::Partial);
    options.check = check;

    let outcome = commit(ctx, &config, &options).context("Failed to write partial release")?;

    output::success(
        format!("Wrote {}", outcome.output_path.display()),
        verbosity(ctx),
    );
    Ok(())
}

fn commit(ctx: &Context, config: &Config, options: &ReleaseOptions) -> Result<ReleaseOutcome> {
    let mut prompter = prompts::prompter(ctx.interactive);
    Ok(engine::run_release(
        config,
        options,
        prompter.as_mut(),
        today(),
    )?)
}
