//! render
//!
//! The template renderer, backed by minijinja.
//!
//! # Templates
//!
//! A template directory holds three templates, each selected by file name
//! prefix (the first match in sorted order wins):
//!
//! | kind      | prefix    | receives                                     |
//! |-----------|-----------|----------------------------------------------|
//! | entry     | `entry`   | entry fields and reserved entry keys         |
//! | release   | `release` | release fields and `entry_groups`            |
//! | main      | `main`    | `releases`, the rendered release fragments   |
//!
//! Every template also receives the global `context` from `config.yaml`;
//! record variables take precedence over context variables of the same
//! name.
//!
//! # Invariants
//!
//! - All three templates are parsed when the set is loaded, so a missing
//!   template or a syntax error is reported before anything is rendered
//! - Output is not HTML-escaped

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, Value};
use thiserror::Error;

/// Errors from template loading and rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template file for '{kind}' not found in '{dir}'")]
    NotFound { kind: TemplateKind, dir: PathBuf },

    #[error("syntax error in template '{template}' at line {line}: {message}")]
    Syntax {
        template: String,
        line: usize,
        message: String,
    },

    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },

    #[error("failed to read template '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The three templates of a changelog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Entry,
    Release,
    Main,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [TemplateKind::Entry, TemplateKind::Release, TemplateKind::Main];

    /// File name prefix that selects the template.
    pub fn prefix(self) -> &'static str {
        match self {
            TemplateKind::Entry => "entry",
            TemplateKind::Release => "release",
            TemplateKind::Main => "main",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A loaded, parsed set of templates plus the global context.
pub struct TemplateSet {
    env: Environment<'static>,
    names: BTreeMap<&'static str, String>,
    context: BTreeMap<String, Value>,
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("names", &self.names)
            .finish()
    }
}

impl TemplateSet {
    /// Load the templates from `dir`.
    pub fn load(dir: &Path, context: &serde_yaml::Mapping) -> Result<Self, RenderError> {
        let mut files: Vec<String> = match fs::read_dir(dir) {
            Ok(read_dir) => read_dir
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| entry.file_name().to_str().map(String::from))
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(RenderError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
        };
        files.sort();

        let mut sources = Vec::with_capacity(3);
        for kind in TemplateKind::ALL {
            let name = files
                .iter()
                .find(|file| file.starts_with(kind.prefix()))
                .ok_or_else(|| RenderError::NotFound {
                    kind,
                    dir: dir.to_path_buf(),
                })?;
            let path = dir.join(name);
            let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            sources.push((kind, name.clone(), source));
        }

        Self::from_sources(sources, context)
    }

    /// Build a set from in-memory sources.
    pub fn from_sources(
        sources: impl IntoIterator<Item = (TemplateKind, String, String)>,
        context: &serde_yaml::Mapping,
    ) -> Result<Self, RenderError> {
        let mut env = Environment::new();
        // Block tags on their own line leave no trace in the output.
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        let mut names = BTreeMap::new();
        for (kind, name, source) in sources {
            env.add_template_owned(name.clone(), source)
                .map_err(|e| syntax_error(&name, e))?;
            names.insert(kind.prefix(), name);
        }
        for kind in TemplateKind::ALL {
            if !names.contains_key(kind.prefix()) {
                return Err(RenderError::NotFound {
                    kind,
                    dir: PathBuf::new(),
                });
            }
        }

        let context = context
            .iter()
            .filter_map(|(key, value)| {
                key.as_str()
                    .map(|key| (key.to_string(), Value::from_serialize(value)))
            })
            .collect();

        Ok(Self {
            env,
            names,
            context,
        })
    }

    /// Name of the file backing a template kind.
    pub fn name(&self, kind: TemplateKind) -> &str {
        self.names
            .get(kind.prefix())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Render one template with the given variables layered over the
    /// global context.
    pub fn render(
        &self,
        kind: TemplateKind,
        vars: BTreeMap<String, Value>,
    ) -> Result<String, RenderError> {
        let name = self.name(kind);
        let template = self.env.get_template(name).map_err(|e| RenderError::Render {
            template: name.to_string(),
            message: e.to_string(),
        })?;

        let mut merged = self.context.clone();
        merged.extend(vars);

        template.render(merged).map_err(|e| RenderError::Render {
            template: name.to_string(),
            message: describe(&e),
        })
    }
}

fn syntax_error(name: &str, err: minijinja::Error) -> RenderError {
    RenderError::Syntax {
        template: name.to_string(),
        line: err.line().unwrap_or(0),
        message: describe(&err),
    }
}

fn describe(err: &minijinja::Error) -> String {
    err.detail()
        .map(|detail| format!("{}: {}", err.kind(), detail))
        .unwrap_or_else(|| err.kind().to_string())
}
