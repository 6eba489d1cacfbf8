//! core::computed
//!
//! Computed values: entry fields filled from the environment instead of
//! from the user.
//!
//! # Registry
//!
//! The set of providers is closed and enumerated by [`ComputedValueKind`].
//! Each variant produces an optional string from a [`RepoQuery`]; nothing
//! is looked up by reflection.
//!
//! | type                 | value                                   |
//! |----------------------|-----------------------------------------|
//! | `local_branch_name`  | checked out branch                      |
//! | `remote_branch_name` | upstream of the checked out branch      |
//! | `branch_name`        | both of the above joined with a space   |
//!
//! A configured `regex` must contain a named group `value`; when it
//! matches, the group replaces the produced value, and when it does not the
//! value becomes null. A configured `default` replaces a null result.

use regex::Regex;

use super::config::schema::ComputedValueConfig;
use super::config::ConfigError;
use super::types::FieldValue;

/// Read-only view of the repository needed by the providers.
///
/// Implemented by [`crate::git::Git`]; failures surface as `None`.
pub trait RepoQuery {
    fn local_branch(&self) -> Option<String>;
    fn remote_branch(&self) -> Option<String>;
}

/// A `RepoQuery` for directories outside any repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRepo;

impl RepoQuery for NoRepo {
    fn local_branch(&self) -> Option<String> {
        None
    }

    fn remote_branch(&self) -> Option<String> {
        None
    }
}

/// The closed set of computed value providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedValueKind {
    LocalBranchName,
    RemoteBranchName,
    BranchName,
}

impl ComputedValueKind {
    pub const ALL: [ComputedValueKind; 3] = [
        ComputedValueKind::LocalBranchName,
        ComputedValueKind::RemoteBranchName,
        ComputedValueKind::BranchName,
    ];

    /// Configuration key of this provider.
    pub fn key(self) -> &'static str {
        match self {
            ComputedValueKind::LocalBranchName => "local_branch_name",
            ComputedValueKind::RemoteBranchName => "remote_branch_name",
            ComputedValueKind::BranchName => "branch_name",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Run the provider.
    pub fn produce(self, repo: &dyn RepoQuery) -> Option<String> {
        match self {
            ComputedValueKind::LocalBranchName => repo.local_branch(),
            ComputedValueKind::RemoteBranchName => repo.remote_branch(),
            ComputedValueKind::BranchName => {
                let parts: Vec<String> = [repo.local_branch(), repo.remote_branch()]
                    .into_iter()
                    .flatten()
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join(" "))
                }
            }
        }
    }
}

/// A validated computed value declaration.
#[derive(Debug, Clone)]
pub struct ComputedValue {
    pub kind: ComputedValueKind,
    /// Entry field the value is stored under; defaults to the type key.
    pub name: String,
    pub regex: Option<Regex>,
    pub default: Option<String>,
}

impl ComputedValue {
    /// Validate a raw declaration from `config.yaml`.
    pub fn from_config(raw: &ComputedValueConfig) -> Result<Self, ConfigError> {
        let Some(key) = raw.kind.as_deref().filter(|k| !k.is_empty()) else {
            return Err(ConfigError::InvalidValue(format!(
                "Missing `type` for computed value: {}",
                describe(raw)
            )));
        };
        let kind = ComputedValueKind::from_key(key).ok_or_else(|| {
            ConfigError::InvalidValue(format!(
                "Unavailable type: '{}'. Available types: {}",
                key,
                ComputedValueKind::ALL
                    .iter()
                    .map(|k| k.key())
                    .collect::<Vec<_>>()
                    .join(" ")
            ))
        })?;

        let regex = match raw.regex.as_deref() {
            Some(pattern) => {
                let regex = Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidValue(format!(
                        "invalid regex '{}' for computed value '{}': {}",
                        pattern, key, e
                    ))
                })?;
                if !regex.capture_names().flatten().any(|name| name == "value") {
                    return Err(ConfigError::InvalidValue(format!(
                        "regex '{}' for computed value '{}' needs a named group 'value'",
                        pattern, key
                    )));
                }
                Some(regex)
            }
            None => None,
        };

        Ok(Self {
            kind,
            name: raw
                .name
                .clone()
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| key.to_string()),
            regex,
            default: raw.default.clone(),
        })
    }

    /// Produce the field value for a new entry.
    pub fn evaluate(&self, repo: &dyn RepoQuery) -> FieldValue {
        let produced = self.kind.produce(repo);
        let value = match (&self.regex, produced) {
            (Some(regex), Some(value)) => match regex.captures(&value) {
                Some(caps) => caps.name("value").map(|m| m.as_str().to_string()),
                None => {
                    tracing::warn!("The regex '{}' didn't match '{}'.", regex.as_str(), value);
                    None
                }
            },
            (_, produced) => produced,
        };
        match value.or_else(|| self.default.clone()) {
            Some(value) => FieldValue::Text(value),
            None => FieldValue::Null,
        }
    }
}

fn describe(raw: &ComputedValueConfig) -> String {
    let fields: Vec<String> = [
        ("name", &raw.name),
        ("regex", &raw.regex),
        ("default", &raw.default),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.as_ref().map(|v| format!("{}={}", key, v)))
    .collect();
    format!("{{{}}}", fields.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Branches(Option<&'static str>, Option<&'static str>);

    impl RepoQuery for Branches {
        fn local_branch(&self) -> Option<String> {
            self.0.map(String::from)
        }

        fn remote_branch(&self) -> Option<String> {
            self.1.map(String::from)
        }
    }

    fn raw(kind: Option<&str>) -> ComputedValueConfig {
        ComputedValueConfig {
            kind: kind.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn missing_type_is_config_error() {
        let mut config = raw(None);
        config.name = Some("test".into());
        let err = ComputedValue::from_config(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid config value: Missing `type` for computed value: {name=test}"
        );
    }

    #[test]
    fn unknown_type_lists_available() {
        let err = ComputedValue::from_config(&raw(Some("invalid"))).unwrap_err();
        assert!(err.to_string().contains(
            "Unavailable type: 'invalid'. Available types: \
             local_branch_name remote_branch_name branch_name"
        ));
    }

    #[test]
    fn name_defaults_to_type() {
        let value = ComputedValue::from_config(&raw(Some("branch_name"))).unwrap();
        assert_eq!(value.name, "branch_name");
        assert_eq!(value.kind, ComputedValueKind::BranchName);
    }

    #[test]
    fn branch_name_joins_local_and_remote() {
        let value = ComputedValue::from_config(&raw(Some("branch_name"))).unwrap();
        let repo = Branches(Some("local"), Some("origin/remote"));
        assert_eq!(
            value.evaluate(&repo),
            FieldValue::Text("local origin/remote".into())
        );
        assert_eq!(
            value.evaluate(&Branches(Some("local"), None)),
            FieldValue::Text("local".into())
        );
    }

    #[test]
    fn regex_extracts_value_group() {
        let mut config = raw(Some("branch_name"));
        config.regex = Some(r"(?P<value>JIRA-\d+)".into());
        let value = ComputedValue::from_config(&config).unwrap();

        let repo = Branches(Some("local_branch_name"), Some("fixing task JIRA-1234"));
        assert_eq!(value.evaluate(&repo), FieldValue::Text("JIRA-1234".into()));
    }

    #[test]
    fn regex_miss_yields_null() {
        let mut config = raw(Some("local_branch_name"));
        config.regex = Some(r"(?P<value>JIRA-\d+)".into());
        let value = ComputedValue::from_config(&config).unwrap();
        assert_eq!(value.evaluate(&Branches(Some("main"), None)), FieldValue::Null);
    }

    #[test]
    fn regex_without_value_group_rejected() {
        let mut config = raw(Some("local_branch_name"));
        config.regex = Some(r"JIRA-\d+".into());
        assert!(ComputedValue::from_config(&config).is_err());
    }

    #[test]
    fn default_replaces_null() {
        let mut config = raw(Some("branch_name"));
        config.default = Some("default_name".into());
        let value = ComputedValue::from_config(&config).unwrap();
        assert_eq!(
            value.evaluate(&NoRepo),
            FieldValue::Text("default_name".into())
        );
    }

    #[test]
    fn failure_without_default_is_null() {
        let value = ComputedValue::from_config(&raw(Some("remote_branch_name"))).unwrap();
        assert_eq!(value.evaluate(&NoRepo), FieldValue::Null);
    }
}
