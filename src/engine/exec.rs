//! engine::exec
//!
//! The single executor.
//!
//! # Architecture
//!
//! The Executor is the ONLY component allowed to mutate the configuration
//! directory or the output document during a release. Every mutation flows
//! through a [`Plan`].
//!
//! # Executor Contract
//!
//! The executor MUST:
//! 1. Apply steps in plan order
//! 2. Refuse to overwrite an existing release file
//! 3. Write files atomically (temp file, sync, rename)
//! 4. Stop at the first failing step
//!
//! # Example
//!
//! ```ignore
//! use changelogd::engine::exec::Executor;
//!
//! let result = Executor::new().execute(&plan)?;
//! println!("wrote {} files", result.written.len());
//! ```

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use super::plan::{Plan, PlanStep};
use crate::core::config::{write_atomic, ConfigError};

/// Errors from execution.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Filesystem operation failed.
    #[error("failed to update '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A release file appeared between planning and execution.
    #[error("release file already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Atomic write failed.
    #[error(transparent)]
    Write(#[from] ConfigError),
}

/// Result of executing a plan.
#[derive(Debug, Default)]
pub struct ExecuteResult {
    /// The release file written, if any.
    pub release_file: Option<PathBuf>,
    /// Entry files removed.
    pub removed: Vec<PathBuf>,
    /// Every file written, in order.
    pub written: Vec<PathBuf>,
}

/// The executor.
#[derive(Debug, Default)]
pub struct Executor;

impl Executor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Execute a plan.
    pub fn execute(&self, plan: &Plan) -> Result<ExecuteResult, ExecuteError> {
        let mut result = ExecuteResult::default();

        for step in &plan.steps {
            tracing::debug!("{}", step.description());
            match step {
                PlanStep::WriteRelease { path, contents } => {
                    if path.exists() {
                        return Err(ExecuteError::AlreadyExists(path.clone()));
                    }
                    write_atomic(path, contents.as_bytes())?;
                    result.release_file = Some(path.clone());
                    result.written.push(path.clone());
                }
                PlanStep::RemoveEntry { path } => {
                    fs::remove_file(path).map_err(|source| ExecuteError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    result.removed.push(path.clone());
                }
                PlanStep::WriteOutput { path, contents } => {
                    write_atomic(path, contents.as_bytes())?;
                    result.written.push(path.clone());
                }
            }
        }

        Ok(result)
    }
}
