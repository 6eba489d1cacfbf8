//! core::config::schema
//!
//! Configuration schema types for `config.yaml`.
//!
//! # Example
//!
//! ```yaml
//! context:
//!   issues_url: http://repo/issues
//! message_types:
//! - name: feature
//!   title: Features
//! - name: bug
//!   title: Bug fixes
//! entry_fields:
//! - name: message
//!   verbose_name: Changelog message
//!   required: true
//! output_file: ../changelog.md
//! partial_release_name: unreleased
//! user_data: [os_user, git_user, git_email]
//! computed_values:
//! - type: branch_name
//!   regex: '(?P<value>JIRA-\d+)'
//! ```
//!
//! # Validation
//!
//! Values are validated after parsing: names must be non-empty and free of
//! whitespace, type and field names must be unique, and entry field names
//! cannot shadow the reserved entry keys.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::entry::RESERVED_KEYS;
use crate::core::types::validate_name;

/// Default output path, relative to the configuration directory.
pub const DEFAULT_OUTPUT: &str = "../changelog.md";

/// Default label for partial releases.
pub const DEFAULT_PARTIAL_NAME: &str = "unreleased";

/// Contents of `config.yaml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogConfig {
    /// Variables passed to every template.
    pub context: serde_yaml::Mapping,

    /// Ordered taxonomy of entry types.
    pub message_types: Vec<MessageType>,

    /// User-defined entry fields.
    pub entry_fields: Vec<EntryField>,

    /// Output document path (relative to the config directory).
    pub output_file: Option<String>,

    /// Version label used by partial releases.
    pub partial_release_name: Option<String>,

    /// Authorship fields recorded on each entry.
    ///
    /// Absent means all of them; `null` means none.
    #[serde(deserialize_with = "explicit_null")]
    pub user_data: Option<Option<Vec<String>>>,

    /// Values computed from the environment when an entry is created.
    pub computed_values: Vec<ComputedValueConfig>,
}

/// Distinguishes a missing key (`None`) from an explicit `null`
/// (`Some(None)`).
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<Vec<String>>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Vec<String>>::deserialize(deserializer).map(Some)
}

impl ChangelogConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.message_types.is_empty() {
            return Err(ConfigError::InvalidValue(
                "'message_types' must define at least one type".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for message_type in &self.message_types {
            validate_name("message type", &message_type.name)
                .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
            if !seen.insert(message_type.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate message type '{}'",
                    message_type.name
                )));
            }
        }

        let mut seen = HashSet::new();
        for field in &self.entry_fields {
            field.validate()?;
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "duplicate entry field '{}'",
                    field.name
                )));
            }
        }

        if let Some(Some(user_data)) = &self.user_data {
            for item in user_data {
                if !UserDataField::ALL.iter().any(|f| f.key() == item) {
                    return Err(ConfigError::InvalidValue(format!(
                        "invalid user_data item '{}', must be one of: {}",
                        item,
                        UserDataField::ALL
                            .iter()
                            .map(|f| f.key())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )));
                }
            }
        }

        if let Some(output) = &self.output_file {
            if output.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "'output_file' cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Authorship fields to record, in a fixed order.
    pub fn user_data_fields(&self) -> Vec<UserDataField> {
        match &self.user_data {
            None => UserDataField::ALL.to_vec(),
            Some(None) => Vec::new(),
            Some(Some(items)) => UserDataField::ALL
                .iter()
                .copied()
                .filter(|f| items.iter().any(|i| i == f.key()))
                .collect(),
        }
    }
}

/// One entry in the type taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MessageType {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl MessageType {
    /// Display title, falling back to the raw name.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// Declared type of an entry field.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Str,
    Int,
}

/// Schema of one user-defined entry field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct EntryField {
    pub name: String,

    /// Prompt label; defaults to the name.
    #[serde(default)]
    pub verbose_name: Option<String>,

    #[serde(default, rename = "type")]
    pub kind: FieldKind,

    #[serde(default = "default_true")]
    pub required: bool,

    /// Accept a comma-separated list of values.
    #[serde(default)]
    pub multiple: bool,

    #[serde(default)]
    pub default: Option<String>,
}

fn default_true() -> bool {
    true
}

impl EntryField {
    /// Prompt label for this field.
    pub fn label(&self) -> &str {
        self.verbose_name.as_deref().unwrap_or(&self.name)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("entry field", &self.name)
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
        if RESERVED_KEYS.contains(&self.name.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "entry field '{}' uses a reserved name",
                self.name
            )));
        }
        if let (FieldKind::Int, Some(default)) = (self.kind, &self.default) {
            if default.trim().parse::<i64>().is_err() {
                return Err(ConfigError::InvalidValue(format!(
                    "default '{}' of entry field '{}' is not an integer",
                    default, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Raw computed value declaration; validated into
/// [`crate::core::computed::ComputedValue`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComputedValueConfig {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub regex: Option<String>,

    #[serde(default)]
    pub default: Option<String>,
}

/// Authorship fields that can be recorded on an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDataField {
    OsUser,
    GitUser,
    GitEmail,
}

impl UserDataField {
    pub const ALL: [UserDataField; 3] = [
        UserDataField::OsUser,
        UserDataField::GitUser,
        UserDataField::GitEmail,
    ];

    /// Key used in config and entry files.
    pub fn key(self) -> &'static str {
        match self {
            UserDataField::OsUser => "os_user",
            UserDataField::GitUser => "git_user",
            UserDataField::GitEmail => "git_email",
        }
    }
}
