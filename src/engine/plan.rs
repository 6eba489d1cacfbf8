//! engine::plan
//!
//! Deterministic plan generation.
//!
//! # Architecture
//!
//! Plans are the sole intermediate representation between the scanned
//! state and filesystem mutation. The whole document is rendered while the
//! plan is built, so a template failure surfaces before any file is
//! touched.
//!
//! # Invariants
//!
//! - Planner does not write or delete files
//! - Steps are ordered: release file, entry removals, output document
//! - Plans are pure data structures
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use changelogd::engine::plan::{Plan, PlanStep};
//!
//! let plan = Plan::new("release")
//!     .with_step(PlanStep::RemoveEntry {
//!         path: PathBuf::from("changelog.d/bug.a1b2c3d4.entry.yaml"),
//!     })
//!     .with_step(PlanStep::WriteOutput {
//!         path: PathBuf::from("changelog.md"),
//!         contents: "# Changelog\n".to_string(),
//!     });
//!
//! assert!(!plan.is_empty());
//! assert_eq!(plan.steps.len(), 2);
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::aggregate::Aggregation;
use super::history::{HistoryError, HistoryStore};
use super::resolve::resolve;
use super::scan::Snapshot;
use super::{ReleaseMode, ReleaseOptions};
use crate::core::config::Config;
use crate::render::{RenderError, TemplateSet};

/// Errors from planning.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("template error: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    History(#[from] HistoryError),
}

/// A typed plan step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanStep {
    /// Persist a new release file. Must not already exist.
    WriteRelease { path: PathBuf, contents: String },

    /// Remove a consumed entry file.
    RemoveEntry { path: PathBuf },

    /// Overwrite the output document.
    WriteOutput { path: PathBuf, contents: String },
}

impl PlanStep {
    /// The file this step touches.
    pub fn path(&self) -> &Path {
        match self {
            PlanStep::WriteRelease { path, .. }
            | PlanStep::RemoveEntry { path }
            | PlanStep::WriteOutput { path, .. } => path,
        }
    }

    /// Human-readable description of the step.
    pub fn description(&self) -> String {
        match self {
            PlanStep::WriteRelease { path, .. } => format!("Write release {}", path.display()),
            PlanStep::RemoveEntry { path } => format!("Remove entry {}", path.display()),
            PlanStep::WriteOutput { path, .. } => format!("Write changelog {}", path.display()),
        }
    }
}

/// An ordered list of steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub command: String,
    pub steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            steps: vec![],
        }
    }

    pub fn with_step(mut self, step: PlanStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_steps(mut self, steps: impl IntoIterator<Item = PlanStep>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Content digest of the plan.
    pub fn digest(&self) -> String {
        let json = serde_json::to_string(&self.steps).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }

    /// Multi-line preview for `--debug` output.
    pub fn preview(&self) -> String {
        if self.is_empty() {
            return format!("{}: No changes needed", self.command);
        }
        let mut lines = vec![format!("{}:", self.command)];
        for (i, step) in self.steps.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, step.description()));
        }
        lines.join("\n")
    }
}

/// Build the plan for a final or partial release.
pub fn build(
    config: &Config,
    templates: &TemplateSet,
    snapshot: &Snapshot,
    aggregation: Aggregation,
    options: &ReleaseOptions,
) -> Result<Plan, PlanError> {
    let command = match options.mode {
        ReleaseMode::Final => "release",
        ReleaseMode::Partial => "partial",
        ReleaseMode::Draft => "draft",
    };
    let mut plan = Plan::new(command);

    if options.mode == ReleaseMode::Final {
        if let Some(release) = &aggregation.release {
            let store = HistoryStore::new(config.paths.releases_dir());
            let path = store.file_path(snapshot.next_id, &release.release_version);
            if path.exists() {
                return Err(HistoryError::AlreadyExists(path).into());
            }
            plan = plan.with_step(PlanStep::WriteRelease {
                path,
                contents: HistoryStore::serialize(release)?,
            });
        }
        plan = plan.with_steps(
            aggregation
                .consumed
                .iter()
                .map(|path| PlanStep::RemoveEntry { path: path.clone() }),
        );
    }

    let releases: Vec<_> = aggregation
        .release
        .into_iter()
        .chain(snapshot.history.iter().cloned())
        .collect();
    let document = resolve(&releases, config.message_types(), templates)?;

    plan = plan.with_step(PlanStep::WriteOutput {
        path: config.output_path(),
        contents: document,
    });

    tracing::debug!(digest = %plan.digest(), "{}", plan.preview());
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_step() -> PlanStep {
        PlanStep::WriteOutput {
            path: PathBuf::from("/c/changelog.md"),
            contents: "doc".into(),
        }
    }

    #[test]
    fn empty_plan_preview() {
        let plan = Plan::new("partial");
        assert!(plan.is_empty());
        assert_eq!(plan.preview(), "partial: No changes needed");
    }

    #[test]
    fn preview_numbers_steps() {
        let plan = Plan::new("release")
            .with_step(PlanStep::RemoveEntry {
                path: PathBuf::from("/c/bug.entry.yaml"),
            })
            .with_step(output_step());
        let preview = plan.preview();
        assert!(preview.starts_with("release:"));
        assert!(preview.contains("1. Remove entry /c/bug.entry.yaml"));
        assert!(preview.contains("2. Write changelog /c/changelog.md"));
    }

    #[test]
    fn digest_is_stable() {
        let a = Plan::new("release").with_step(output_step());
        let b = Plan::new("partial").with_step(output_step());
        assert_eq!(a.digest(), b.digest());
        assert!(a.digest().starts_with("sha256:"));

        let c = Plan::new("release").with_steps(vec![output_step(), output_step()]);
        assert_ne!(a.digest(), c.digest());
    }

    #[test]
    fn step_paths() {
        assert_eq!(output_step().path(), Path::new("/c/changelog.md"));
    }
}
