//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - Interactive prompts and confirmations
//! - [`output`] - User-facing messages
//!
//! # Design
//!
//! All prompts go through a [`prompts::Prompter`] so that interactive and
//! non-interactive runs share one code path.

pub mod output;
pub mod prompts;
