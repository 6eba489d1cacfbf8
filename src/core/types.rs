//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ReleaseVersion`] - Validated release label (used in file names)
//! - [`FieldValue`] - Value of a user-defined entry field
//! - [`Fingerprint`] - Content hash used to name entry files
//!
//! # Validation
//!
//! Names coming from configuration (message types, entry fields) are
//! validated once with [`validate_name`]. Release versions are validated at
//! construction because they end up in file names.
//!
//! # Examples
//!
//! ```
//! use changelogd::core::types::{validate_name, ReleaseVersion};
//!
//! assert!(validate_name("entry field", "issue_id").is_ok());
//! assert!(validate_name("entry field", "issue id").is_err());
//!
//! let version = ReleaseVersion::new("1.2.0").unwrap();
//! assert_eq!(version.as_str(), "1.2.0");
//! assert!(ReleaseVersion::new("../escape").is_err());
//! ```

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid {what} name '{name}': {reason}")]
    InvalidName {
        what: String,
        name: String,
        reason: String,
    },

    #[error("invalid release version '{0}': {1}")]
    InvalidVersion(String, String),
}

/// Validate a configured name (message type or entry field).
///
/// Names must be non-empty and must not contain whitespace.
pub fn validate_name(what: &str, name: &str) -> Result<(), TypeError> {
    let fail = |reason: &str| TypeError::InvalidName {
        what: what.to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(fail("name cannot be empty"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(fail("name cannot contain whitespace"));
    }
    if name.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(fail("name cannot contain path separators or control characters"));
    }
    Ok(())
}

/// A validated release version label.
///
/// The label becomes part of the release file name (`<id>.<version>.yaml`),
/// so it cannot be empty, cannot contain path separators or control
/// characters, and cannot start with `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Create a new validated release version.
    pub fn new(version: impl Into<String>) -> Result<Self, TypeError> {
        let version = version.into();
        let fail = |reason: &str| TypeError::InvalidVersion(version.clone(), reason.to_string());

        if version.trim().is_empty() {
            return Err(fail("version cannot be empty"));
        }
        if version.starts_with('.') {
            return Err(fail("version cannot start with '.'"));
        }
        if version
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control())
        {
            return Err(fail("version cannot contain path separators"));
        }
        Ok(Self(version))
    }

    /// Get the version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReleaseVersion> for String {
    fn from(value: ReleaseVersion) -> Self {
        value.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of a user-defined entry field.
///
/// Entry files are hand-editable, so deserialization is lenient: any scalar
/// becomes [`FieldValue::Text`] and any sequence of scalars becomes
/// [`FieldValue::List`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Null,
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns true for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert to a template value.
    pub fn to_template_value(&self) -> minijinja::Value {
        match self {
            FieldValue::Null => minijinja::Value::from(()),
            FieldValue::Text(text) => minijinja::Value::from(text.as_str()),
            FieldValue::List(items) => minijinja::Value::from(items.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_none(),
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::List(items) => items.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(FieldValueVisitor)
    }
}

struct FieldValueVisitor;

impl<'de> Visitor<'de> for FieldValueVisitor {
    type Value = FieldValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, a list of strings, or null")
    }

    fn visit_unit<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<FieldValue, E> {
        Ok(FieldValue::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<FieldValue, D::Error> {
        deserializer.deserialize_any(self)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<FieldValue, E> {
        Ok(FieldValue::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<FieldValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<FieldValue>()? {
            match item {
                FieldValue::Text(text) => items.push(text),
                FieldValue::Null => {}
                FieldValue::List(_) => {
                    return Err(de::Error::custom("nested lists are not supported"));
                }
            }
        }
        Ok(FieldValue::List(items))
    }
}

/// Content fingerprint of an entry.
///
/// Only used to derive a collision-resistant file name; two entries with
/// the same fingerprint are not considered equal.
///
/// # Example
///
/// ```
/// use changelogd::core::types::Fingerprint;
///
/// let fp = Fingerprint::compute(["feature", "Add a thing", "1580608922"]);
/// assert_eq!(fp, Fingerprint::compute(["feature", "Add a thing", "1580608922"]));
/// assert_eq!(fp.short().len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute a fingerprint over the concatenation of the given values.
    pub fn compute<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Sha256::new();
        for value in values {
            hasher.update(value.as_ref().as_bytes());
        }
        Self(hex::encode(hasher.finalize()))
    }

    /// Get the full fingerprint as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex characters, used in entry file names.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
