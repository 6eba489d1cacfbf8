//! core::release
//!
//! The Release Record: a named, dated bundle of entries grouped by type.
//!
//! # Persisted vs Injected Fields
//!
//! Release files store `release_version`, `release_date`,
//! `release_description` and `entries`. The `id` and `previous_release`
//! fields are never trusted from disk; the history store injects them from
//! the file name and load order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::entry::Entry;
use super::types::FieldValue;

/// A release, either persisted or in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Release {
    #[serde(deserialize_with = "lenient_string")]
    pub release_version: String,

    /// ISO `YYYY-MM-DD` on disk.
    pub release_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_description: Option<String>,

    /// Type name to entries, newest first within each list.
    #[serde(default)]
    pub entries: BTreeMap<String, Vec<Entry>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_release: Option<String>,
}

impl Release {
    /// Create a release without entries.
    pub fn new(version: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            release_version: version.into(),
            release_date: date,
            release_description: None,
            entries: BTreeMap::new(),
            id: None,
            previous_release: None,
        }
    }

    /// Total number of entries across all groups.
    pub fn entry_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// The record as written to a release file (injected fields stripped).
    pub fn to_persisted(&self) -> Release {
        Release {
            id: None,
            previous_release: None,
            ..self.clone()
        }
    }

    /// Variables exposed to the release template, excluding `entry_groups`.
    pub fn template_vars(&self) -> BTreeMap<String, minijinja::Value> {
        let mut vars = BTreeMap::new();
        vars.insert(
            "release_version".to_string(),
            minijinja::Value::from(self.release_version.as_str()),
        );
        vars.insert(
            "release_date".to_string(),
            minijinja::Value::from(self.release_date.format("%Y-%m-%d").to_string()),
        );
        vars.insert(
            "release_description".to_string(),
            optional(self.release_description.as_deref()),
        );
        vars.insert(
            "id".to_string(),
            self.id
                .map(minijinja::Value::from)
                .unwrap_or_else(|| minijinja::Value::from(())),
        );
        vars.insert(
            "previous_release".to_string(),
            optional(self.previous_release.as_deref()),
        );
        vars
    }
}

/// Accepts scalar versions such as `0.1` that YAML would read as numbers.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match FieldValue::deserialize(deserializer)? {
        FieldValue::Text(text) => Ok(text),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar version, found {:?}",
            other
        ))),
    }
}

fn optional(value: Option<&str>) -> minijinja::Value {
    value
        .map(minijinja::Value::from)
        .unwrap_or_else(|| minijinja::Value::from(()))
}
