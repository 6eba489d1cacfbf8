//! changelogd - Changelogs without merge conflicts
//!
//! Every change is recorded as its own small entry file in a configuration
//! directory. Releasing bundles the pending entries into a persisted release
//! file and regenerates the changelog document from the whole release
//! history through user-editable templates. Because no two changes edit the
//! same file, parallel branches never conflict on the changelog.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Orchestrates Scan → Gate → Plan → Execute → Verify lifecycle
//! - [`core`] - Domain types, configuration and file formats
//! - [`render`] - Template loading and rendering
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - User interaction utilities
//!
//! # Correctness Invariants
//!
//! changelogd maintains the following invariants:
//!
//! 1. Release ids are never reused
//! 2. All release mutations flow through a single executor
//! 3. The whole document is rendered before any file is written
//! 4. A failed release leaves entries and history untouched

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod render;
pub mod ui;
