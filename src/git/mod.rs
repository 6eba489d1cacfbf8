//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`, and nothing shells out to the git CLI.
//!
//! # Responsibilities
//!
//! - Repository discovery and opening
//! - Current branch and upstream lookup
//! - Author identity from git configuration
//! - Staging new entry files
//!
//! # Invariants
//!
//! - Git failures never abort an entry; callers degrade to null values

mod interface;

pub use interface::{Git, GitError, Identity};
