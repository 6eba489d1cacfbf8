//! core::config::scaffold
//!
//! Creation of a fresh configuration directory (`changelogd init`).
//!
//! Templates and the README are compiled into the binary so that `init`
//! works from any installation.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::{write_atomic, ConfigError};
use crate::core::paths::ChangelogPaths;

/// Output format of the generated templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TemplateFormat {
    /// Markdown
    #[default]
    Md,
    /// reStructuredText
    Rst,
}

impl TemplateFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TemplateFormat::Md => "md",
            TemplateFormat::Rst => "rst",
        }
    }

    /// `(file name, contents)` of the bundled templates.
    fn templates(self) -> [(&'static str, &'static str); 3] {
        match self {
            TemplateFormat::Md => [
                ("entry.md", include_str!("../../../templates/md/entry.md")),
                ("main.md", include_str!("../../../templates/md/main.md")),
                ("release.md", include_str!("../../../templates/md/release.md")),
            ],
            TemplateFormat::Rst => [
                ("entry.rst", include_str!("../../../templates/rst/entry.rst")),
                ("main.rst", include_str!("../../../templates/rst/main.rst")),
                ("release.rst", include_str!("../../../templates/rst/release.rst")),
            ],
        }
    }
}

impl fmt::Display for TemplateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

const README: &str = include_str!("../../../templates/README.md");

/// Default `config.yaml`, with `{ext}` standing for the output extension.
const DEFAULT_CONFIG: &str = r#"# All variables defined here will be passed into templates
context:
  issues_url: http://repo/issues
# The order defined below will be preserved in the output changelog file
message_types:
- name: feature
  title: Features
- name: bug
  title: Bug fixes
- name: doc
  title: Documentation changes
- name: deprecation
  title: Deprecations
- name: other
  title: Other changes
entry_fields:
- name: issue_id
  verbose_name: Issue ID
  type: str
  required: false
  multiple: true
- name: message
  verbose_name: Changelog message
  type: str
  required: true
output_file: ../changelog.{ext}
partial_release_name: unreleased
user_data:
- os_user
- git_user
- git_email
# Values computed when an entry is created, e.g.:
# computed_values:
# - type: branch_name
#   regex: '(?P<value>JIRA-\d+)'
"#;

/// Render the default `config.yaml` for a format.
pub fn default_config(format: TemplateFormat) -> String {
    DEFAULT_CONFIG.replace("{ext}", format.extension())
}

/// Files written by [`scaffold`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldReport {
    pub config_file: PathBuf,
    pub templates_dir: PathBuf,
    pub releases_dir: PathBuf,
}

/// Write a complete configuration directory at `dir`.
///
/// Existing `config.yaml`, `README.md` and templates are overwritten; the
/// release history is left alone. Callers decide whether overwriting is
/// allowed.
pub fn scaffold(dir: &Path, format: TemplateFormat) -> Result<ScaffoldReport, ConfigError> {
    let paths = ChangelogPaths::new(dir.to_path_buf());
    let mkdir = |path: &Path| {
        fs::create_dir_all(path).map_err(|source| ConfigError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    };

    mkdir(dir)?;

    let config_file = paths.config_file();
    write_atomic(&config_file, default_config(format).as_bytes())?;
    write_atomic(&paths.readme_file(), README.as_bytes())?;

    let templates_dir = paths.templates_dir();
    if templates_dir.is_dir() {
        fs::remove_dir_all(&templates_dir).map_err(|source| ConfigError::WriteError {
            path: templates_dir.clone(),
            source,
        })?;
    }
    mkdir(&templates_dir)?;
    for (name, contents) in format.templates() {
        write_atomic(&templates_dir.join(name), contents.as_bytes())?;
    }

    let releases_dir = paths.releases_dir();
    mkdir(&releases_dir)?;
    let keep = releases_dir.join(".gitkeep");
    if !keep.exists() {
        write_atomic(&keep, b"")?;
    }

    Ok(ScaffoldReport {
        config_file,
        templates_dir,
        releases_dir,
    })
}
