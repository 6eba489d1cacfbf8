//! core::config
//!
//! Configuration discovery and loading.
//!
//! # Overview
//!
//! All configuration lives in one directory (default `./changelog.d`)
//! holding `config.yaml`, the templates and the release history.
//!
//! # Discovery
//!
//! The configuration directory is resolved in this order (first wins):
//! 1. `--config <dir>` flag or `$CHANGELOGD_CONFIG`
//! 2. `Cargo.toml`: `[package.metadata.changelogd] config = "..."`
//!    (or `[workspace.metadata.changelogd]`)
//! 3. `pyproject.toml`: `[tool.changelogd] config = "..."`
//! 4. `./changelog.d`
//!
//! Pointer values are resolved relative to the file that holds them and may
//! name either the directory or its `config.yaml`.
//!
//! # Example
//!
//! ```no_run
//! use changelogd::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Path::new("/path/to/project"), None).unwrap();
//! let config = result.config;
//!
//! for message_type in config.message_types() {
//!     println!("{}: {}", message_type.name, message_type.title());
//! }
//! println!("Output: {}", config.output_path().display());
//! ```

pub mod scaffold;
pub mod schema;

pub use schema::{ChangelogConfig, EntryField, FieldKind, MessageType, UserDataField};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::computed::ComputedValue;
use super::entry::RESERVED_KEYS;
use super::types::validate_name;
use super::paths::{ChangelogPaths, DEFAULT_CONFIG_DIR};

/// Environment variable naming the configuration directory.
pub const CONFIG_ENV: &str = "CHANGELOGD_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error(
        "the configuration directory does not exist: {0}\nRun `changelogd init` to create it."
    )]
    MissingDirectory(PathBuf),

    #[error(
        "the main configuration file does not exist: {0}\nRun `changelogd init` to create it."
    )]
    MissingConfigFile(PathBuf),
}

/// Where the configuration directory was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` flag or environment variable.
    Explicit,
    /// Pointer inside a project file (`Cargo.toml`, `pyproject.toml`).
    Pointer(PathBuf),
    /// The default `./changelog.d`.
    Default,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// How the configuration directory was found.
    pub source: ConfigSource,
}

/// Loaded and validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Parsed `config.yaml`.
    pub settings: ChangelogConfig,
    /// Paths rooted at the configuration directory.
    pub paths: ChangelogPaths,
    computed: Vec<ComputedValue>,
}

impl Config {
    /// Discover and load the configuration for `cwd`.
    ///
    /// `explicit` is the `--config` value, if given.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or `config.yaml` is missing, or
    /// if the file cannot be parsed or fails validation.
    pub fn load(cwd: &Path, explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let (dir, source) = Self::discover(cwd, explicit)?;
        tracing::debug!(dir = %dir.display(), ?source, "configuration directory");
        let config = Self::from_dir(&dir)?;
        Ok(ConfigLoadResult { config, source })
    }

    /// Resolve the configuration directory without loading it.
    pub fn discover(
        cwd: &Path,
        explicit: Option<&Path>,
    ) -> Result<(PathBuf, ConfigSource), ConfigError> {
        if let Some(path) = explicit {
            return Ok((absolutize(cwd, path), ConfigSource::Explicit));
        }

        let cargo = cwd.join("Cargo.toml");
        if let Some(pointer) = read_pointer(&cargo, cargo_pointer)? {
            tracing::info!("Load configuration from file {}", cargo.display());
            return Ok((pointer, ConfigSource::Pointer(cargo)));
        }

        let pyproject = cwd.join("pyproject.toml");
        if let Some(pointer) = read_pointer(&pyproject, pyproject_pointer)? {
            tracing::info!("Load configuration from file {}", pyproject.display());
            return Ok((pointer, ConfigSource::Pointer(pyproject)));
        }

        Ok((cwd.join(DEFAULT_CONFIG_DIR), ConfigSource::Default))
    }

    /// Load the configuration from a known directory.
    pub fn from_dir(dir: &Path) -> Result<Self, ConfigError> {
        if !dir.is_dir() {
            return Err(ConfigError::MissingDirectory(dir.to_path_buf()));
        }
        let paths = ChangelogPaths::new(dir.to_path_buf());
        let config_file = paths.config_file();
        if !config_file.is_file() {
            return Err(ConfigError::MissingConfigFile(config_file));
        }

        let settings = Self::read_config(&config_file)?;
        settings.validate()?;
        let computed = settings
            .computed_values
            .iter()
            .map(ComputedValue::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        check_computed_names(&settings, &computed)?;

        Ok(Self {
            settings,
            paths,
            computed,
        })
    }

    /// Read and parse `config.yaml`.
    fn read_config(path: &Path) -> Result<ChangelogConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Ok(ChangelogConfig::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// The ordered type taxonomy.
    pub fn message_types(&self) -> &[MessageType] {
        &self.settings.message_types
    }

    /// Look up a message type by name.
    pub fn message_type(&self, name: &str) -> Option<&MessageType> {
        self.settings.message_types.iter().find(|t| t.name == name)
    }

    pub fn entry_fields(&self) -> &[EntryField] {
        &self.settings.entry_fields
    }

    pub fn computed_values(&self) -> &[ComputedValue] {
        &self.computed
    }

    /// Global template variables.
    pub fn context(&self) -> &serde_yaml::Mapping {
        &self.settings.context
    }

    /// Resolved output document path.
    ///
    /// Defaults to `../changelog.md` relative to the configuration directory.
    pub fn output_path(&self) -> PathBuf {
        self.paths.output_file(
            self.settings
                .output_file
                .as_deref()
                .unwrap_or(schema::DEFAULT_OUTPUT),
        )
    }

    /// Version label for partial releases.
    ///
    /// Defaults to `unreleased`.
    pub fn partial_release_name(&self) -> &str {
        self.settings
            .partial_release_name
            .as_deref()
            .unwrap_or(schema::DEFAULT_PARTIAL_NAME)
    }

    pub fn user_data(&self) -> Vec<UserDataField> {
        self.settings.user_data_fields()
    }
}

fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Read a `config = "..."` pointer out of a TOML project file.
fn read_pointer(
    file: &Path,
    extract: fn(&toml::Value) -> Option<&str>,
) -> Result<Option<PathBuf>, ConfigError> {
    if !file.is_file() {
        return Ok(None);
    }
    let contents = fs::read_to_string(file).map_err(|e| ConfigError::ReadError {
        path: file.to_path_buf(),
        source: e,
    })?;
    let value: toml::Value = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: file.to_path_buf(),
        message: e.to_string(),
    })?;

    let Some(pointer) = extract(&value) else {
        return Ok(None);
    };
    let base = file.parent().unwrap_or_else(|| Path::new("."));
    let mut path = absolutize(base, Path::new(pointer));
    if path.file_name().map(|n| n == "config.yaml").unwrap_or(false) {
        path.pop();
    }
    Ok(Some(path))
}

fn cargo_pointer(value: &toml::Value) -> Option<&str> {
    ["package", "workspace"].iter().find_map(|table| {
        value
            .get(table)?
            .get("metadata")?
            .get("changelogd")?
            .get("config")?
            .as_str()
    })
}

fn pyproject_pointer(value: &toml::Value) -> Option<&str> {
    value.get("tool")?.get("changelogd")?.get("config")?.as_str()
}

/// Write a file atomically.
///
/// Creates parent directories if needed, writes to a temp file in the same
/// directory, syncs it, then renames it over `path`.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    let write_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ConfigError::WriteError { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error(path))?;
    }

    let mut temp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut file = fs::File::create(&temp_path).map_err(write_error(&temp_path))?;
    file.write_all(contents).map_err(write_error(&temp_path))?;
    file.sync_all().map_err(write_error(&temp_path))?;

    fs::rename(&temp_path, path).map_err(write_error(path))?;

    Ok(())
}

/// Computed values share the entry's key space with entry fields and the
/// reserved keys; a clash would write an entry file that cannot be read back.
fn check_computed_names(
    settings: &ChangelogConfig,
    computed: &[ComputedValue],
) -> Result<(), ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for value in computed {
        let name = value.name.as_str();
        validate_name("computed value", name)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        if RESERVED_KEYS.contains(&name) {
            return Err(ConfigError::InvalidValue(format!(
                "computed value name '{}' is reserved",
                name
            )));
        }
        if settings.entry_fields.iter().any(|f| f.name == name) {
            return Err(ConfigError::InvalidValue(format!(
                "computed value name '{}' clashes with an entry field",
                name
            )));
        }
        if !seen.insert(name) {
            return Err(ConfigError::InvalidValue(format!(
                "duplicate computed value name '{}'",
                name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = "message_types:\n- name: feature\n  title: Features\n";

    fn config_dir(root: &Path, name: &str, yaml: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), yaml).unwrap();
        dir
    }

    #[test]
    fn default_location() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "changelog.d", MINIMAL);

        let result = Config::load(temp.path(), None).unwrap();
        assert_eq!(result.source, ConfigSource::Default);
        assert_eq!(result.config.message_types().len(), 1);
        assert_eq!(result.config.partial_release_name(), "unreleased");
        assert_eq!(
            result.config.output_path(),
            temp.path().join("changelog.d/../changelog.md")
        );
    }

    #[test]
    fn explicit_path_wins() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "changelog.d", MINIMAL);
        let custom = config_dir(
            temp.path(),
            "docs/changes",
            "message_types:\n- name: other\n",
        );

        let result = Config::load(temp.path(), Some(Path::new("docs/changes"))).unwrap();
        assert_eq!(result.source, ConfigSource::Explicit);
        assert_eq!(result.config.paths.config_dir, custom);
        assert!(result.config.message_type("other").is_some());
    }

    #[test]
    fn cargo_metadata_pointer() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "meta/changes", MINIMAL);
        fs::write(
            temp.path().join("Cargo.toml"),
            "[package]\nname = \"x\"\n\n[package.metadata.changelogd]\nconfig = \"meta/changes\"\n",
        )
        .unwrap();

        let (dir, source) = Config::discover(temp.path(), None).unwrap();
        assert_eq!(dir, temp.path().join("meta/changes"));
        assert_eq!(source, ConfigSource::Pointer(temp.path().join("Cargo.toml")));
    }

    #[test]
    fn pyproject_pointer_to_config_file() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "changes", MINIMAL);
        fs::write(
            temp.path().join("pyproject.toml"),
            "[tool.changelogd]\nconfig = \"changes/config.yaml\"\n",
        )
        .unwrap();

        let (dir, _) = Config::discover(temp.path(), None).unwrap();
        assert_eq!(dir, temp.path().join("changes"));
    }

    #[test]
    fn cargo_without_pointer_falls_through() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Cargo.toml"), "[package]\nname = \"x\"\n").unwrap();

        let (dir, source) = Config::discover(temp.path(), None).unwrap();
        assert_eq!(source, ConfigSource::Default);
        assert_eq!(dir, temp.path().join("changelog.d"));
    }

    #[test]
    fn ini_pointers_are_ignored() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "changes", MINIMAL);
        for file in ["setup.cfg", "tox.ini"] {
            fs::write(
                temp.path().join(file),
                "[tool:changelogd]\nconfig = changes\n",
            )
            .unwrap();
        }

        let (dir, source) = Config::discover(temp.path(), None).unwrap();
        assert_eq!(source, ConfigSource::Default);
        assert_eq!(dir, temp.path().join("changelog.d"));
    }

    #[test]
    fn missing_directory_points_to_init() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingDirectory(_)));
        assert!(err.to_string().contains("changelogd init"));
    }

    #[test]
    fn missing_config_file() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("changelog.d")).unwrap();
        let err = Config::load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingConfigFile(_)));
    }

    #[test]
    fn invalid_computed_value_is_fatal() {
        let temp = TempDir::new().unwrap();
        config_dir(
            temp.path(),
            "changelog.d",
            &format!("{}computed_values:\n- type: invalid\n", MINIMAL),
        );
        let err = Config::load(temp.path(), None).unwrap_err();
        assert!(err.to_string().contains("Unavailable type: 'invalid'"));
    }

    #[test]
    fn computed_value_names_are_checked() {
        let cases = [
            ("- type: local_branch_name\n  name: timestamp\n  default: main\n", "reserved"),
            ("- type: branch_name\n  name: git_user\n", "reserved"),
            ("- type: local_branch_name\n  name: message\n", "clashes"),
            ("- type: local_branch_name\n- type: local_branch_name\n", "duplicate"),
            ("- type: branch_name\n  name: my ticket\n", "whitespace"),
        ];
        for (computed, expected) in cases {
            let temp = TempDir::new().unwrap();
            config_dir(
                temp.path(),
                "changelog.d",
                &format!(
                    "{}entry_fields:\n- name: message\ncomputed_values:\n{}",
                    MINIMAL, computed
                ),
            );
            let err = Config::load(temp.path(), None).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue(_)), "{}", computed);
            assert!(err.to_string().contains(expected), "{}: {}", computed, err);
        }
    }

    #[test]
    fn distinct_computed_value_names_load() {
        let temp = TempDir::new().unwrap();
        config_dir(
            temp.path(),
            "changelog.d",
            &format!(
                "{}entry_fields:\n- name: message\ncomputed_values:\n- type: local_branch_name\n  name: ticket\n- type: remote_branch_name\n",
                MINIMAL
            ),
        );
        let config = Config::load(temp.path(), None).unwrap().config;
        let names: Vec<_> = config.computed_values().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ticket", "remote_branch_name"]);
    }

    #[test]
    fn malformed_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        config_dir(temp.path(), "changelog.d", "message_types: [\n");
        let err = Config::load(temp.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/out.md");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!temp.path().join("nested/out.md.tmp").exists());
    }
}
