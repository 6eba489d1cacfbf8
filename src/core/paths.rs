//! core::paths
//!
//! Centralized path routing for the configuration directory.
//!
//! # Architecture
//!
//! Every location changelogd reads or writes is derived from the
//! configuration directory through [`ChangelogPaths`]. No other module
//! joins `"releases"` or `"templates"` onto a path by hand.
//!
//! # Storage Layout
//!
//! ```text
//! changelog.d/
//! ├── config.yaml
//! ├── README.md
//! ├── feature.1a2b3c4d.entry.yaml   pending entries
//! ├── releases/
//! │   ├── 0.0.1.0.yaml              <id>.<version>.yaml
//! │   └── 1.0.2.0.yaml
//! └── templates/
//!     ├── entry.md
//!     ├── main.md
//!     └── release.md
//! ```
//!
//! # Example
//!
//! ```
//! use changelogd::core::paths::ChangelogPaths;
//! use std::path::PathBuf;
//!
//! let paths = ChangelogPaths::new(PathBuf::from("/repo/changelog.d"));
//! assert_eq!(paths.config_file(), PathBuf::from("/repo/changelog.d/config.yaml"));
//! assert_eq!(
//!     paths.output_file("../changelog.md"),
//!     PathBuf::from("/repo/changelog.d/../changelog.md")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Default configuration directory name, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "changelog.d";

/// Centralized path routing for changelogd storage.
///
/// # Invariants
///
/// - Entry files live directly in `config_dir`
/// - Release files live only in `releases_dir()`
/// - Relative output paths resolve against `config_dir`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogPaths {
    pub config_dir: PathBuf,
}

impl ChangelogPaths {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// `config.yaml` inside the configuration directory.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.yaml")
    }

    /// Directory holding the release history.
    pub fn releases_dir(&self) -> PathBuf {
        self.config_dir.join("releases")
    }

    /// Directory holding the entry, release and main templates.
    pub fn templates_dir(&self) -> PathBuf {
        self.config_dir.join("templates")
    }

    /// Directory scanned for pending entry files.
    pub fn entries_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn readme_file(&self) -> PathBuf {
        self.config_dir.join("README.md")
    }

    /// Resolve the configured output document path.
    ///
    /// Absolute paths are returned unchanged.
    pub fn output_file(&self, configured: &str) -> PathBuf {
        let configured = Path::new(configured);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            self.config_dir.join(configured)
        }
    }
}
