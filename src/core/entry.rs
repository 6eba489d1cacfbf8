//! core::entry
//!
//! The Entry Record: one pending change, persisted as one YAML file.
//!
//! # File Format
//!
//! Entry files live directly in the configuration directory and are named
//! `<type>.<fingerprint>.entry.yaml`. The content is a flat mapping:
//!
//! ```yaml
//! type: feature
//! timestamp: 1580608922
//! os_user: alice
//! git_user: Alice
//! git_email: alice@example.com
//! issue_id:
//! - '100'
//! message: Support partial releases
//! ```
//!
//! Every key other than the reserved ones is a user-defined or computed
//! field and is kept in [`Entry::fields`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{FieldValue, Fingerprint};

/// Suffix shared by all entry files.
pub const ENTRY_SUFFIX: &str = ".entry.yaml";

/// Keys with a fixed meaning in an entry file.
pub const RESERVED_KEYS: &[&str] = &["type", "timestamp", "os_user", "git_user", "git_email"];

/// Errors from entry file operations.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("failed to read entry '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse entry '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("entry file '{0}' is empty")]
    Empty(PathBuf),

    #[error("failed to write entry '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("entry file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to serialize entry: {0}")]
    Serialize(String),
}

/// A single recorded change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Message type, a key into the configured taxonomy.
    #[serde(rename = "type")]
    pub kind: String,

    /// Creation time in epoch seconds.
    #[serde(default)]
    pub timestamp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_email: Option<String>,

    /// User-defined and computed fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Entry {
    /// Create an entry with no authorship and no fields.
    pub fn new(kind: impl Into<String>, timestamp: i64) -> Self {
        Self {
            kind: kind.into(),
            timestamp,
            os_user: None,
            git_user: None,
            git_email: None,
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Fingerprint over every value of the entry.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut values = vec![self.kind.clone()];
        values.extend(self.fields.values().map(|v| v.to_string()));
        values.push(self.timestamp.to_string());
        for user in [&self.os_user, &self.git_user, &self.git_email] {
            values.push(user.clone().unwrap_or_default());
        }
        Fingerprint::compute(values)
    }

    /// File name this entry is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.{}{}", self.kind, self.fingerprint().short(), ENTRY_SUFFIX)
    }

    /// Variables exposed to the entry template.
    pub fn template_vars(&self) -> BTreeMap<String, minijinja::Value> {
        let mut vars: BTreeMap<String, minijinja::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_template_value()))
            .collect();
        vars.insert("type".into(), minijinja::Value::from(self.kind.as_str()));
        vars.insert("timestamp".into(), minijinja::Value::from(self.timestamp));
        let users = [
            ("os_user", &self.os_user),
            ("git_user", &self.git_user),
            ("git_email", &self.git_email),
        ];
        for (key, value) in users {
            let value = value
                .as_deref()
                .map(minijinja::Value::from)
                .unwrap_or_else(|| minijinja::Value::from(()));
            vars.insert(key.into(), value);
        }
        vars
    }

    /// Read and parse an entry file.
    pub fn read(path: &Path) -> Result<Self, EntryError> {
        let contents = fs::read_to_string(path).map_err(|source| EntryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Err(EntryError::Empty(path.to_path_buf()));
        }
        serde_yaml::from_str(&contents).map_err(|e| EntryError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the entry into `dir`, returning the new file path.
    ///
    /// Refuses to overwrite an existing entry file.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, EntryError> {
        let path = dir.join(self.file_name());
        if path.exists() {
            return Err(EntryError::AlreadyExists(path));
        }
        let contents =
            serde_yaml::to_string(self).map_err(|e| EntryError::Serialize(e.to_string()))?;
        fs::write(&path, contents).map_err(|source| EntryError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Returns true if `path` names an entry file.
pub fn is_entry_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(ENTRY_SUFFIX) || name.ends_with(".entry.yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Entry {
        let mut entry = Entry::new("feature", 1580608922)
            .with_field("message", FieldValue::Text("Add partial releases".into()))
            .with_field("issue_id", FieldValue::List(vec!["100".into()]));
        entry.git_user = Some("Some User".into());
        entry
    }

    #[test]
    fn file_name_format() {
        let name = sample().file_name();
        assert!(name.starts_with("feature."));
        assert!(name.ends_with(".entry.yaml"));
        // type + '.' + 8 hex chars + suffix
        assert_eq!(name.len(), "feature.".len() + 8 + ENTRY_SUFFIX.len());
    }

    #[test]
    fn write_and_read_back() {
        let temp = TempDir::new().unwrap();
        let entry = sample();

        let path = entry.write_to(temp.path()).unwrap();
        assert!(is_entry_file(&path));

        let loaded = Entry::read(&path).unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn write_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let entry = sample();
        entry.write_to(temp.path()).unwrap();

        let err = entry.write_to(temp.path()).unwrap_err();
        assert!(matches!(err, EntryError::AlreadyExists(_)));
    }

    #[test]
    fn read_hand_written_entry() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bug.abcdef01.entry.yaml");
        fs::write(
            &path,
            "type: bug\ntimestamp: 12\nissue_id: [7, 8]\nmessage: Fixed\nbranch_name: null\n",
        )
        .unwrap();

        let entry = Entry::read(&path).unwrap();
        assert_eq!(entry.kind, "bug");
        assert_eq!(entry.timestamp, 12);
        assert_eq!(
            entry.fields.get("issue_id"),
            Some(&FieldValue::List(vec!["7".into(), "8".into()]))
        );
        assert_eq!(entry.fields.get("branch_name"), Some(&FieldValue::Null));
        assert!(entry.os_user.is_none());
    }

    #[test]
    fn empty_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bug.00000000.entry.yaml");
        fs::write(&path, "  \n").unwrap();
        assert!(matches!(Entry::read(&path), Err(EntryError::Empty(_))));
    }

    #[test]
    fn template_vars_include_reserved_keys() {
        let vars = sample().template_vars();
        assert_eq!(vars["type"].to_string(), "feature");
        assert_eq!(vars["git_user"].to_string(), "Some User");
        assert!(vars["os_user"].is_none());
        assert_eq!(vars["message"].to_string(), "Add partial releases");
    }

    #[test]
    fn is_entry_file_matches_suffix() {
        assert!(is_entry_file(Path::new("feature.12345678.entry.yaml")));
        assert!(is_entry_file(Path::new("feature.12345678.entry.yml")));
        assert!(!is_entry_file(Path::new("config.yaml")));
        assert!(!is_entry_file(Path::new("README.md")));
    }
}
