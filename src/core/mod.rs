//! core
//!
//! Core domain types and persistence formats for changelogd.
//!
//! # Modules
//!
//! - [`types`] - Strong types: ReleaseVersion, FieldValue, Fingerprint
//! - [`entry`] - Entry Record and its file format
//! - [`release`] - Release Record
//! - [`computed`] - Computed value providers
//! - [`config`] - Configuration schema, discovery and scaffolding
//! - [`paths`] - Centralized path routing for the configuration directory
//!
//! # Design Principles
//!
//! - Schemas are strict where they come from configuration and lenient
//!   where they come from hand-edited entry files
//! - Records are built from primitive types directly

pub mod computed;
pub mod config;
pub mod entry;
pub mod paths;
pub mod release;
pub mod types;
