//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--config <dir>`: Configuration directory (env `CHANGELOGD_CONFIG`)
//! - `--debug`: Enable debug logging
//! - `--interactive` / `--no-interactive`: Control prompts
//! - `--quiet` / `-q`: Minimal output

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::core::config::scaffold::TemplateFormat;
use crate::core::config::CONFIG_ENV;

/// changelogd - Changelogs without merge conflicts
#[derive(Parser, Debug)]
#[command(name = "changelogd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if changelogd was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Configuration directory (default: discovered, then ./changelog.d)
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output; implies --no-interactive
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable interactive prompts
    #[arg(long = "interactive", global = true, conflicts_with = "no_interactive")]
    pub interactive_flag: bool,

    /// Disable interactive prompts
    #[arg(long, global = true)]
    pub no_interactive: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }

    /// Determine if interactive mode is enabled.
    ///
    /// Returns true if:
    /// - `--interactive` was explicitly set, OR
    /// - Neither `--no-interactive` nor `--quiet` was set AND stdin is a TTY
    pub fn interactive(&self) -> bool {
        if self.interactive_flag {
            true
        } else if self.no_interactive || self.quiet {
            false
        } else {
            std::io::stdin().is_terminal()
        }
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a configuration directory with default templates
    #[command(
        name = "init",
        long_about = "Create a configuration directory with a default config.yaml, \
            templates for the chosen format and an empty release history.\n\n\
            An existing directory is only overwritten after confirmation, or with \
            --force. Persisted releases are kept.",
        after_help = "\
EXAMPLES:
    # Default location ./changelog.d with Markdown templates
    changelogd init

    # reStructuredText templates in a custom directory
    changelogd init --path docs/changes --format rst"
    )]
    Init {
        /// Directory to create
        #[arg(long)]
        path: Option<PathBuf>,

        /// Template format
        #[arg(long, value_enum, default_value_t = TemplateFormat::Md)]
        format: TemplateFormat,

        /// Overwrite an existing configuration without asking
        #[arg(long)]
        force: bool,
    },

    /// Record a new changelog entry
    #[command(
        name = "entry",
        after_help = "\
EXAMPLES:
    # Prompt for everything
    changelogd entry

    # Fully scripted
    changelogd entry --type bug --field message='Fix crash on empty input' --field issue_id=12,14"
    )]
    Entry {
        /// Message type, by name or 1-based index
        #[arg(long = "type", value_name = "TYPE")]
        kind: Option<String>,

        /// Field value as NAME=VALUE; repeatable
        #[arg(long = "field", value_name = "NAME=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Do not stage the new entry file in git
        #[arg(long)]
        no_git_add: bool,
    },

    /// Print the changelog with pending entries, without writing anything
    #[command(name = "draft")]
    Draft {
        /// Version label for the pending entries
        #[arg(long, default_value = "draft")]
        version: String,

        /// Print release records as JSON instead of rendering
        #[arg(long)]
        json: bool,
    },

    /// Turn pending entries into a release and regenerate the changelog
    #[command(
        name = "release",
        long_about = "Persist pending entries as a new release, remove the entry files \
            and regenerate the changelog document.\n\n\
            With --check, the command fails if the changelog on disk was out of date. \
            The regenerated document is written either way.",
        after_help = "\
EXAMPLES:
    changelogd release 1.2.0
    changelogd release 1.2.1 --empty --description 'Packaging fix only'"
    )]
    Release {
        /// Version of the new release
        version: String,

        /// Allow a release without entries
        #[arg(long)]
        empty: bool,

        /// Fail if the changelog on disk was out of date
        #[arg(long)]
        check: bool,

        /// Release description; skips the prompt
        #[arg(long)]
        description: Option<String>,
    },

    /// Render pending entries as an unreleased section, keeping the entries
    #[command(name = "partial")]
    Partial {
        /// Fail if the changelog on disk was out of date
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    # Bash
    changelogd completion bash > ~/.local/share/bash-completion/completions/changelogd

    # Zsh
    changelogd completion zsh > ~/.zfunc/_changelogd"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}
