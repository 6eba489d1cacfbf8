//! engine::history
//!
//! The release history store.
//!
//! # Layout
//!
//! Each persisted release is one YAML file in the `releases/` directory,
//! named `<id>.<version>.yaml`. The leading digit run is the release id;
//! files that do not match the pattern (such as `.gitkeep`) are ignored.
//!
//! # Invariants
//!
//! - Two files with the same id are a fatal integrity error
//! - `id` and `previous_release` are injected on load, never read from disk
//! - A corrupt or empty release file is skipped with a warning; it still
//!   occupies its id
//! - [`HistoryStore::load_all`] returns releases newest first

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::config::{write_atomic, ConfigError};
use crate::core::release::Release;

/// Errors from the release history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("duplicate release id {id}: '{first}' and '{second}'")]
    DuplicateId {
        id: u64,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to read release directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("release file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("failed to serialize release: {0}")]
    Serialize(String),

    #[error(transparent)]
    Write(#[from] ConfigError),
}

/// Split `<id>.<version>.yaml` (or `.yml`) into its id digits and version.
fn parse_file_name(name: &str) -> Option<(&str, &str)> {
    let stem = name
        .strip_suffix(".yaml")
        .or_else(|| name.strip_suffix(".yml"))?;
    let digits = stem.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 {
        return None;
    }
    let (id, rest) = stem.split_at(digits);
    let version = rest.strip_prefix('.')?;
    if version.is_empty() {
        return None;
    }
    Some((id, version))
}

/// A release file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFile {
    pub id: u64,
    /// Version as encoded in the file name.
    pub version: String,
    pub path: PathBuf,
}

/// Everything read from the store in one pass.
#[derive(Debug, Clone, Default)]
pub struct History {
    /// Parsed releases, newest first.
    pub releases: Vec<Release>,
    /// All release files, including the ones that failed to parse, by id.
    pub files: Vec<ReleaseFile>,
    /// Id for the next persisted release.
    pub next_id: u64,
}

/// Reads and writes the `releases/` directory.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List release files in ascending id order.
    ///
    /// A missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<ReleaseFile>, HistoryError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(HistoryError::ReadDir {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut by_id: BTreeMap<u64, ReleaseFile> = BTreeMap::new();
        let mut names: Vec<(String, PathBuf)> = read_dir
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let path = entry.path();
                entry.file_name().to_str().map(|name| (name.to_string(), path))
            })
            .collect();
        names.sort();

        for (name, path) in names {
            let Some((digits, version)) = parse_file_name(&name) else {
                continue;
            };
            let Ok(id) = digits.parse::<u64>() else {
                tracing::warn!("Release id out of range in '{}', skipping", path.display());
                continue;
            };
            let file = ReleaseFile {
                id,
                version: version.to_string(),
                path,
            };
            if let Some(existing) = by_id.get(&id) {
                return Err(HistoryError::DuplicateId {
                    id,
                    first: existing.path.clone(),
                    second: file.path,
                });
            }
            by_id.insert(id, file);
        }

        Ok(by_id.into_values().collect())
    }

    /// Load the whole store.
    pub fn load(&self) -> Result<History, HistoryError> {
        let files = self.list()?;
        let next_id = files.last().map(|f| f.id + 1).unwrap_or(0);

        let mut releases = Vec::with_capacity(files.len());
        let mut previous: Option<String> = None;
        for file in &files {
            let Some(mut release) = read_release(&file.path) else {
                continue;
            };
            release.id = Some(file.id);
            release.previous_release = previous.take();
            previous = Some(release.release_version.clone());
            releases.push(release);
        }
        releases.reverse();

        Ok(History {
            releases,
            files,
            next_id,
        })
    }

    /// Persisted releases, newest first.
    pub fn load_all(&self) -> Result<Vec<Release>, HistoryError> {
        Ok(self.load()?.releases)
    }

    /// One past the highest existing id, or 0 for an empty store.
    pub fn next_id(&self) -> Result<u64, HistoryError> {
        Ok(self.load()?.next_id)
    }

    /// Path a release with this id and version is stored under.
    pub fn file_path(&self, id: u64, version: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.yaml", id, version))
    }

    /// Serialize a release to its on-disk form.
    pub fn serialize(release: &Release) -> Result<String, HistoryError> {
        serde_yaml::to_string(&release.to_persisted())
            .map_err(|e| HistoryError::Serialize(e.to_string()))
    }

    /// Write a new release file.
    ///
    /// Refuses to overwrite an existing file.
    pub fn save(&self, id: u64, release: &Release) -> Result<PathBuf, HistoryError> {
        let path = self.file_path(id, &release.release_version);
        if path.exists() {
            return Err(HistoryError::AlreadyExists(path));
        }
        let contents = Self::serialize(release)?;
        write_atomic(&path, contents.as_bytes())?;
        Ok(path)
    }
}

/// Parse one release file; `None` (with a warning) if it is unusable.
fn read_release(path: &Path) -> Option<Release> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Cannot read release file '{}': {}", path.display(), e);
            return None;
        }
    };
    if contents.trim().is_empty() {
        tracing::warn!("Release file '{}' is empty, skipping", path.display());
        return None;
    }
    match serde_yaml::from_str::<Release>(&contents) {
        Ok(release) => Some(release),
        Err(e) => {
            tracing::warn!("Cannot parse release file '{}': {}", path.display(), e);
            None
        }
    }
}
