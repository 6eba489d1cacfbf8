//! init command - Create a configuration directory

use std::path::Path;

use anyhow::{bail, Context as _, Result};

use super::verbosity;
use crate::core::config::scaffold::{scaffold, TemplateFormat};
use crate::core::paths::DEFAULT_CONFIG_DIR;
use crate::engine::Context;
use crate::ui::output;
use crate::ui::prompts::{self, PromptError};

/// Create a configuration directory.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `path` - Directory to create; defaults to `--config`, then `./changelog.d`
/// * `format` - Template format
/// * `force` - Overwrite an existing configuration without asking
pub fn init(ctx: &Context, path: Option<&Path>, format: TemplateFormat, force: bool) -> Result<()> {
    let cwd = ctx
        .working_dir()
        .context("Failed to determine the working directory")?;
    let requested = path.or(ctx.config.as_deref());
    let dir = match requested {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd.join(DEFAULT_CONFIG_DIR),
    };

    if dir.exists() && !force {
        let mut prompter = prompts::prompter(ctx.interactive);
        let question = format!(
            "The configuration directory '{}' already exists. Overwrite it?",
            dir.display()
        );
        match prompter.confirm(&question, false) {
            Ok(true) => {}
            Ok(false) => {
                output::print("Aborted.", verbosity(ctx));
                return Ok(());
            }
            Err(PromptError::NotInteractive) => bail!(
                "The configuration directory '{}' already exists; use --force to overwrite it",
                dir.display()
            ),
            Err(e) => return Err(e.into()),
        }
    }

    let report = scaffold(&dir, format)
        .with_context(|| format!("Failed to create '{}'", dir.display()))?;

    let verbosity = verbosity(ctx);
    output::success(
        format!("Created configuration in {}", dir.display()),
        verbosity,
    );
    tracing::debug!(
        config = %report.config_file.display(),
        templates = %report.templates_dir.display(),
        releases = %report.releases_dir.display(),
        "scaffold written"
    );

    if requested.is_some() && dir != cwd.join(DEFAULT_CONFIG_DIR) {
        let pointer = dir.strip_prefix(&cwd).unwrap_or(&dir);
        output::print(pointer_hint(pointer), verbosity);
    }

    Ok(())
}

/// Snippet telling the user how to point discovery at a custom directory.
fn pointer_hint(dir: &Path) -> String {
    let dir = dir.display();
    format!(
        "\nAdd this to Cargo.toml so changelogd finds it:\n\n\
         [package.metadata.changelogd]\n\
         config = \"{dir}\"\n\n\
         or to pyproject.toml:\n\n\
         [tool.changelogd]\n\
         config = \"{dir}\""
    )
}
