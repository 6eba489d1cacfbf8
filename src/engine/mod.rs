//! engine
//!
//! Orchestrates releases: Scan -> Gate -> Plan -> Execute -> Verify.
//!
//! # Architecture
//!
//! 1. **Scan**: Read pending entries, the release history and the output
//!    document's state ([`scan`], [`history`])
//! 2. **Gate**: Refuse releases without entries (unless allowed) and
//!    versions that already exist ([`aggregate`], [`run_release`])
//! 3. **Plan**: Render the whole document in memory and list every file
//!    write and removal ([`resolve`], [`plan`])
//! 4. **Execute**: Apply the plan through the single executor ([`exec`])
//! 5. **Verify**: Under `--check`, compare the output document before and
//!    after the write
//!
//! Entry creation ([`record`]) is a separate, much smaller flow.
//!
//! # Invariants
//!
//! - The engine never mutates files outside the executor
//! - Every fatal error before Execute leaves the filesystem untouched
//! - Drift is reported after the new document has been written
//!
//! # Example
//!
//! ```ignore
//! use changelogd::engine::{run_release, ReleaseMode, ReleaseOptions};
//!
//! let options = ReleaseOptions::new("1.2.0", ReleaseMode::Final);
//! let outcome = run_release(&config, &options, &mut prompter, today)?;
//! println!("wrote {}", outcome.output_path.display());
//! ```

pub mod aggregate;
pub mod exec;
pub mod history;
pub mod plan;
pub mod record;
pub mod resolve;
pub mod scan;

pub use aggregate::{aggregate, group_entries, AggregateError, Aggregation};
pub use exec::{ExecuteError, ExecuteResult, Executor};
pub use history::{HistoryError, HistoryStore};
pub use plan::{Plan, PlanError, PlanStep};
pub use record::{EntryRequest, RecordError};
pub use resolve::resolve;
pub use scan::{ScanError, Snapshot};

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::core::config::{Config, ConfigError};
use crate::core::release::Release;
use crate::core::types::ReleaseVersion;
use crate::git::GitError;
use crate::render::{RenderError, TemplateSet};
use crate::ui::prompts::{PromptError, Prompter};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Configuration directory override.
    pub config: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            config: None,
            debug: false,
            quiet: false,
            interactive: true,
        }
    }
}

impl Context {
    /// The directory commands run in.
    pub fn working_dir(&self) -> std::io::Result<PathBuf> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => std::env::current_dir(),
        }
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Scan failed.
    #[error("scan failed: {0}")]
    Scan(#[from] ScanError),

    /// Release history is inconsistent.
    #[error(transparent)]
    History(#[from] HistoryError),

    /// Aggregation refused the release.
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// Template loading or rendering failed.
    #[error("template error: {0}")]
    Render(#[from] RenderError),

    /// Planning failed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Execution failed.
    #[error("execution failed: {0}")]
    Execute(#[from] ExecuteError),

    /// Entry creation failed.
    #[error(transparent)]
    Record(#[from] RecordError),

    /// A prompt failed.
    #[error(transparent)]
    Prompt(#[from] PromptError),

    /// Git error.
    #[error("git error: {0}")]
    Git(#[from] GitError),

    /// The requested version is invalid.
    #[error(transparent)]
    Version(#[from] crate::core::types::TypeError),

    /// The version already exists in the history.
    #[error("release '{0}' already exists")]
    DuplicateVersion(String),

    /// The written document differs from the one on disk before the run.
    #[error("the changelog '{0}' was out of date and has been regenerated")]
    ContentDrift(PathBuf),
}

/// Which release flow is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Persist a new release and consume the pending entries.
    Final,
    /// Render pending entries as an unreleased section; persist nothing.
    Partial,
    /// Render to memory only.
    Draft,
}

/// Options threaded through aggregation and orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOptions {
    pub version: String,
    pub mode: ReleaseMode,
    /// Allow a final release without entries.
    pub allow_empty: bool,
    /// Report drift between the old and the new output document.
    pub check: bool,
    /// Description given up front; skips the prompt.
    pub description: Option<String>,
}

impl ReleaseOptions {
    pub fn new(version: impl Into<String>, mode: ReleaseMode) -> Self {
        Self {
            version: version.into(),
            mode,
            allow_empty: false,
            check: false,
            description: None,
        }
    }
}

/// Result of a release or partial run.
#[derive(Debug)]
pub struct ReleaseOutcome {
    /// The persisted release file, for final releases.
    pub release_file: Option<PathBuf>,
    /// Entry files removed.
    pub removed: Vec<PathBuf>,
    pub output_path: PathBuf,
}

/// Build the ordered release list (in-progress first) for rendering.
fn ordered_releases(in_progress: Option<Release>, history: Vec<Release>) -> Vec<Release> {
    in_progress.into_iter().chain(history).collect()
}

/// Draft: render pending entries plus history without touching disk.
///
/// Returns the ordered releases and the rendered document.
pub fn run_draft(
    config: &Config,
    options: &ReleaseOptions,
    prompter: &mut dyn Prompter,
    today: NaiveDate,
) -> Result<(Vec<Release>, String), EngineError> {
    let templates = TemplateSet::load(&config.paths.templates_dir(), config.context())?;
    let snapshot = scan::scan(config)?;
    let aggregation = aggregate(&snapshot, options, today, prompter)?;

    let releases = ordered_releases(aggregation.release, snapshot.history);
    let document = resolve(&releases, config.message_types(), &templates)?;
    Ok((releases, document))
}

/// Final or partial release: aggregate, render, then write.
///
/// # Errors
///
/// Every error except [`EngineError::ContentDrift`] is raised before the
/// first file is touched.
pub fn run_release(
    config: &Config,
    options: &ReleaseOptions,
    prompter: &mut dyn Prompter,
    today: NaiveDate,
) -> Result<ReleaseOutcome, EngineError> {
    // Scan
    let templates = TemplateSet::load(&config.paths.templates_dir(), config.context())?;
    let snapshot = scan::scan(config)?;

    // Gate
    if options.mode == ReleaseMode::Final {
        let version = ReleaseVersion::new(options.version.clone())?;
        if snapshot.has_version(version.as_str()) {
            return Err(EngineError::DuplicateVersion(version.to_string()));
        }
    }
    let aggregation = aggregate(&snapshot, options, today, prompter)?;

    // Plan
    let output_path = config.output_path();
    let previous = if options.check {
        scan::read_output(&output_path)?
    } else {
        None
    };
    let plan = plan::build(config, &templates, &snapshot, aggregation, options)?;

    // Execute
    let result = Executor::new().execute(&plan)?;

    // Verify
    if options.check {
        let current = std::fs::read(&output_path).map_err(|source| ExecuteError::Io {
            path: output_path.clone(),
            source,
        })?;
        if previous.as_deref() != Some(current.as_slice()) {
            return Err(EngineError::ContentDrift(output_path));
        }
    }

    Ok(ReleaseOutcome {
        release_file: result.release_file,
        removed: result.removed,
        output_path,
    })
}
