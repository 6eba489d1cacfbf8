//! engine::record
//!
//! Entry creation: collect a type and field values, stamp authorship and
//! computed values, write the entry file, stage it.
//!
//! # Value Sources
//!
//! Each configured field takes its value from the first source that has
//! one: a `--field NAME=VALUE` flag, the prompter, then the configured
//! default. Required fields that end up empty are asked again when
//! interactive and fail otherwise.
//!
//! # Invariants
//!
//! - Git failures never fail entry creation; the affected values are null
//! - `--field` names are checked against the schema before any prompt

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::computed::{NoRepo, RepoQuery};
use crate::core::config::{Config, EntryField, FieldKind, UserDataField};
use crate::core::entry::{Entry, EntryError};
use crate::core::types::FieldValue;
use crate::git::Git;
use crate::ui::prompts::{PromptError, Prompter};

/// Environment variables consulted for the OS user, in order.
const OS_USER_VARS: [&str; 4] = ["LOGNAME", "USER", "LNAME", "USERNAME"];

/// Errors from entry creation.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("unknown message type '{given}'; available types: {available}")]
    UnknownType { given: String, available: String },

    #[error("no message type given; pass --type in non-interactive mode")]
    MissingType,

    #[error("unknown entry field '{0}'")]
    UnknownField(String),

    #[error("missing value for required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expects an integer, got '{value}'")]
    InvalidInt { field: String, value: String },

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Entry(#[from] EntryError),
}

/// What the caller already knows about the new entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryRequest {
    /// Type name or 1-based index into the taxonomy.
    pub kind: Option<String>,
    /// `--field NAME=VALUE` pairs; the last value for a name wins.
    pub fields: Vec<(String, String)>,
    /// Stage the new file in git.
    pub git_add: bool,
}

/// Authorship values recorded on an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorship {
    pub os_user: Option<String>,
    pub git_user: Option<String>,
    pub git_email: Option<String>,
}

impl Authorship {
    /// Read authorship from the environment and, if present, git config.
    pub fn detect(git: Option<&Git>) -> Self {
        let os_user = OS_USER_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()));
        let identity = match git.map(Git::identity) {
            Some(Ok(identity)) => identity,
            Some(Err(e)) => {
                tracing::warn!("Failed to read git identity: {}", e);
                Default::default()
            }
            None => Default::default(),
        };
        Self {
            os_user,
            git_user: identity.name,
            git_email: identity.email,
        }
    }

    /// Keep only the fields enabled in `user_data`.
    pub fn restrict(self, enabled: &[UserDataField]) -> Self {
        let keep = |field, value: Option<String>| value.filter(|_| enabled.contains(&field));
        Self {
            os_user: keep(UserDataField::OsUser, self.os_user),
            git_user: keep(UserDataField::GitUser, self.git_user),
            git_email: keep(UserDataField::GitEmail, self.git_email),
        }
    }
}

/// Create, write and stage a new entry. Returns the new file's path.
pub fn record(
    config: &Config,
    request: &EntryRequest,
    prompter: &mut dyn Prompter,
    cwd: &Path,
) -> Result<PathBuf, RecordError> {
    let git = match Git::open(cwd) {
        Ok(git) => Some(git),
        Err(e) => {
            tracing::info!("No git repository available ({}); git values will be empty", e);
            None
        }
    };
    let repo: &dyn RepoQuery = match &git {
        Some(git) => git,
        None => &NoRepo,
    };

    let authorship = Authorship::detect(git.as_ref());
    let timestamp = chrono::Utc::now().timestamp();
    let entry = build_entry(config, request, prompter, repo, authorship, timestamp)?;
    let path = entry.write_to(config.paths.entries_dir())?;
    tracing::debug!(path = %path.display(), "entry written");

    if request.git_add {
        match &git {
            Some(git) => {
                if let Err(e) = git.stage(&path) {
                    tracing::warn!("Failed to stage '{}': {}", path.display(), e);
                }
            }
            None => tracing::warn!("Not staging '{}': no git repository", path.display()),
        }
    }

    Ok(path)
}

/// Assemble an entry without touching the filesystem.
pub fn build_entry(
    config: &Config,
    request: &EntryRequest,
    prompter: &mut dyn Prompter,
    repo: &dyn RepoQuery,
    authorship: Authorship,
    timestamp: i64,
) -> Result<Entry, RecordError> {
    for (name, _) in &request.fields {
        if !config.entry_fields().iter().any(|f| &f.name == name) {
            return Err(RecordError::UnknownField(name.clone()));
        }
    }

    let kind = select_type(config, request.kind.as_deref(), prompter)?;
    let mut entry = Entry::new(kind, timestamp);

    for field in config.entry_fields() {
        let given = request
            .fields
            .iter()
            .rev()
            .find(|(name, _)| name == &field.name)
            .map(|(_, value)| value.as_str());
        let value = field_value(field, given, prompter)?;
        entry.fields.insert(field.name.clone(), value);
    }

    for computed in config.computed_values() {
        entry
            .fields
            .insert(computed.name.clone(), computed.evaluate(repo));
    }

    let authorship = authorship.restrict(&config.user_data());
    entry.os_user = authorship.os_user;
    entry.git_user = authorship.git_user;
    entry.git_email = authorship.git_email;

    Ok(entry)
}

/// Resolve a type name or 1-based index, prompting when none is given.
pub fn select_type(
    config: &Config,
    given: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<String, RecordError> {
    let answer = match given {
        Some(given) => given.to_string(),
        None => {
            let mut message = String::from("Select message type:\n");
            for (i, message_type) in config.message_types().iter().enumerate() {
                message.push_str(&format!("  {}) {}\n", i + 1, message_type.title()));
            }
            message.push_str("Message type");
            match prompter.input(&message, Some("1")) {
                Ok(answer) => answer,
                Err(PromptError::NotInteractive) => return Err(RecordError::MissingType),
                Err(e) => return Err(e.into()),
            }
        }
    };

    let answer = answer.trim();
    if let Some(message_type) = config.message_type(answer) {
        return Ok(message_type.name.clone());
    }
    answer
        .parse::<usize>()
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|index| config.message_types().get(index))
        .map(|message_type| message_type.name.clone())
        .ok_or_else(|| RecordError::UnknownType {
            given: answer.to_string(),
            available: config
                .message_types()
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn field_value(
    field: &EntryField,
    given: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<FieldValue, RecordError> {
    if let Some(given) = given.map(str::trim).filter(|v| !v.is_empty()) {
        return parse_value(field, given);
    }

    loop {
        let (answer, interactive) = match prompter.input(field.label(), field.default.as_deref()) {
            Ok(answer) => (Some(answer), true),
            Err(PromptError::NotInteractive) => (None, false),
            Err(e) => return Err(e.into()),
        };
        let value = answer
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .or_else(|| field.default.clone());

        match value {
            Some(value) => return parse_value(field, &value),
            None if !field.required => return Ok(FieldValue::Null),
            None if interactive => {
                tracing::warn!("'{}' is required", field.label());
            }
            None => return Err(RecordError::MissingField(field.name.clone())),
        }
    }
}

fn parse_value(field: &EntryField, raw: &str) -> Result<FieldValue, RecordError> {
    let check = |value: &str| -> Result<String, RecordError> {
        match field.kind {
            FieldKind::Str => Ok(value.to_string()),
            FieldKind::Int => value
                .parse::<i64>()
                .map(|n| n.to_string())
                .map_err(|_| RecordError::InvalidInt {
                    field: field.name.clone(),
                    value: value.to_string(),
                }),
        }
    };

    if field.multiple {
        let items = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(check)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FieldValue::List(items))
    } else {
        Ok(FieldValue::Text(check(raw)?))
    }
}
