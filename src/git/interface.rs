//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to all Git operations in
//! changelogd. changelogd only needs a handful of them:
//!
//! - the checked out branch and its upstream (computed values)
//! - `user.name` / `user.email` from the git configuration (authorship)
//! - staging a freshly written entry file
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::BareRepo`]: Repository has no working directory
//! - [`GitError::OutsideWorkdir`]: Path to stage is not in the working tree
//! - [`GitError::Internal`]: Anything else reported by git2
//!
//! Callers treat every one of these as non-fatal: the dependent value
//! becomes null and a warning is logged.
//!
//! # Example
//!
//! ```ignore
//! use changelogd::git::Git;
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! if let Some(branch) = git.current_branch()? {
//!     println!("on {}", branch);
//! }
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::computed::RepoQuery;

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Path is not inside the working directory.
    #[error("path is outside the working tree: {path}")]
    OutsideWorkdir { path: PathBuf },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Author identity from the git configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// The Git interface.
///
/// Wraps a `git2::Repository`; no other module touches git2.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover` to find the repository root,
    /// so `path` can be any directory within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    // =========================================================================
    // Branches
    // =========================================================================

    /// Get the current branch name, if on a branch.
    ///
    /// Returns `None` if HEAD is detached or unborn.
    pub fn current_branch(&self) -> Result<Option<String>, GitError> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            return Ok(head.shorthand().map(String::from));
        }

        Ok(None) // Detached HEAD
    }

    /// Get the upstream of the current branch, e.g. `origin/feature`.
    ///
    /// Returns `None` if there is no current branch or it tracks nothing.
    pub fn upstream_branch(&self) -> Result<Option<String>, GitError> {
        let Some(name) = self.current_branch()? else {
            return Ok(None);
        };
        let branch = self.repo.find_branch(&name, git2::BranchType::Local)?;
        let upstream = match branch.upstream() {
            Ok(upstream) => upstream,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let upstream_name = upstream.name()?.map(String::from);
        Ok(upstream_name)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Read `user.name` and `user.email` from the effective git config.
    pub fn identity(&self) -> Result<Identity, GitError> {
        let config = self.repo.config()?;
        let read = |key: &str| config.get_string(key).ok().filter(|v| !v.is_empty());
        Ok(Identity {
            name: read("user.name"),
            email: read("user.email"),
        })
    }

    // =========================================================================
    // Index
    // =========================================================================

    /// Stage a file (`git add <path>`).
    ///
    /// `path` may be absolute or relative to the process working directory
    /// but must lie inside the working tree.
    pub fn stage(&self, path: &Path) -> Result<(), GitError> {
        let work_dir = self.repo.workdir().ok_or(GitError::BareRepo)?;
        let absolute = path.canonicalize().map_err(|e| GitError::Internal {
            message: format!("{}: {}", path.display(), e),
        })?;
        let work_dir = work_dir.canonicalize().map_err(|e| GitError::Internal {
            message: format!("{}: {}", work_dir.display(), e),
        })?;
        let relative = absolute
            .strip_prefix(&work_dir)
            .map_err(|_| GitError::OutsideWorkdir {
                path: path.to_path_buf(),
            })?;

        let mut index = self.repo.index()?;
        index.add_path(relative)?;
        index.write()?;
        Ok(())
    }
}

impl RepoQuery for Git {
    fn local_branch(&self) -> Option<String> {
        match self.current_branch() {
            Ok(branch) => branch,
            Err(e) => {
                tracing::warn!("Failed to get local branch name: {}", e);
                None
            }
        }
    }

    fn remote_branch(&self) -> Option<String> {
        match self.upstream_branch() {
            Ok(branch) => branch,
            Err(e) => {
                tracing::warn!("Failed to get remote branch name: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, git2::Repository) {
        let temp = TempDir::new().unwrap();
        let repo = git2::Repository::init(temp.path()).unwrap();
        {
            let mut config = repo.config().unwrap();
            config.set_str("user.name", "Some User").unwrap();
            config.set_str("user.email", "user@example.com").unwrap();
        }
        (temp, repo)
    }

    fn commit_file(repo: &git2::Repository, dir: &Path, name: &str) {
        fs::write(dir.join(name), "content").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = git2::Signature::now("Some User", "user@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }

    mod open {
        use super::*;

        #[test]
        fn not_a_repo() {
            let temp = TempDir::new().unwrap();
            // The temp root may itself live inside a repository.
            if let Err(err) = Git::open(temp.path()) {
                assert!(matches!(err, GitError::NotARepo { .. }));
            }
        }

        #[test]
        fn from_subdirectory() {
            let (temp, _repo) = init_repo();
            let sub = temp.path().join("changelog.d");
            fs::create_dir(&sub).unwrap();

            let entry = sub.join("bug.0a1b2c3d.entry.yaml");
            fs::write(&entry, "type: bug\n").unwrap();

            let git = Git::open(&sub).unwrap();
            git.stage(&entry).unwrap();

            let index = git.repo.index().unwrap();
            assert!(index
                .get_path(Path::new("changelog.d/bug.0a1b2c3d.entry.yaml"), 0)
                .is_some());
        }
    }

    mod branches {
        use super::*;

        #[test]
        fn unborn_head_has_no_branch() {
            let (temp, _repo) = init_repo();
            let git = Git::open(temp.path()).unwrap();
            assert_eq!(git.current_branch().unwrap(), None);
            assert_eq!(git.upstream_branch().unwrap(), None);
        }

        #[test]
        fn current_branch_after_commit() {
            let (temp, repo) = init_repo();
            commit_file(&repo, temp.path(), "README");
            let head = repo.head().unwrap().shorthand().unwrap().to_string();

            let git = Git::open(temp.path()).unwrap();
            assert_eq!(git.current_branch().unwrap(), Some(head.clone()));
            assert_eq!(git.local_branch(), Some(head));
            assert_eq!(git.remote_branch(), None);
        }
    }

    #[test]
    fn identity_from_config() {
        let (temp, _repo) = init_repo();
        let git = Git::open(temp.path()).unwrap();
        let identity = git.identity().unwrap();
        assert_eq!(identity.name.as_deref(), Some("Some User"));
        assert_eq!(identity.email.as_deref(), Some("user@example.com"));
    }

    #[test]
    fn stage_adds_to_index() {
        let (temp, repo) = init_repo();
        let dir = temp.path().join("changelog.d");
        fs::create_dir(&dir).unwrap();
        let file = dir.join("feature.12345678.entry.yaml");
        fs::write(&file, "type: feature\n").unwrap();

        let git = Git::open(temp.path()).unwrap();
        git.stage(&file).unwrap();

        let index = repo.index().unwrap();
        assert!(index
            .get_path(Path::new("changelog.d/feature.12345678.entry.yaml"), 0)
            .is_some());
    }

    #[test]
    fn stage_outside_workdir_fails() {
        let (temp, _repo) = init_repo();
        let other = TempDir::new().unwrap();
        let file = other.path().join("x.yaml");
        fs::write(&file, "").unwrap();

        let git = Git::open(temp.path()).unwrap();
        assert!(matches!(
            git.stage(&file),
            Err(GitError::OutsideWorkdir { .. })
        ));
    }
}
