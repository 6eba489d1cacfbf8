//! engine::scan
//!
//! Reads everything a release needs from disk.
//!
//! # Architecture
//!
//! The scan produces a [`Snapshot`]: pending entries (sorted by file name
//! so repeated runs see the same input order), the release history, and the
//! modification time of the output document. Nothing after the scan reads
//! the configuration directory again until the executor writes.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

use super::history::{HistoryError, HistoryStore};
use crate::core::config::Config;
use crate::core::entry::{is_entry_file, Entry, EntryError};
use crate::core::release::Release;

/// Errors from scanning.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read directory '{path}': {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error("failed to read output document '{path}': {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A pending entry file.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub path: PathBuf,
    pub entry: Entry,
    pub modified: Option<SystemTime>,
}

/// State read by the scan phase.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Pending entries in file name order.
    pub pending: Vec<PendingEntry>,
    /// Persisted releases, newest first.
    pub history: Vec<Release>,
    /// Versions of every release file, parsed or not.
    pub versions: Vec<String>,
    /// Id for the next persisted release.
    pub next_id: u64,
    /// Modification time of the output document, if it exists.
    pub output_modified: Option<SystemTime>,
}

impl Snapshot {
    /// Returns true if a release with this version is already persisted.
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
            || self.history.iter().any(|r| r.release_version == version)
    }

    /// Version of the newest persisted release.
    pub fn latest_version(&self) -> Option<&str> {
        self.history.first().map(|r| r.release_version.as_str())
    }
}

/// Scan pending entries, history and output state.
pub fn scan(config: &Config) -> Result<Snapshot, ScanError> {
    let pending = scan_entries(config.paths.entries_dir())?;
    let history = HistoryStore::new(config.paths.releases_dir()).load()?;
    let output_modified = modified(&config.output_path());

    tracing::debug!(
        pending = pending.len(),
        releases = history.releases.len(),
        next_id = history.next_id,
        "scan complete"
    );

    Ok(Snapshot {
        pending,
        versions: history.files.into_iter().map(|f| f.version).collect(),
        history: history.releases,
        next_id: history.next_id,
        output_modified,
    })
}

/// Read all entry files directly inside `dir`, sorted by path.
pub fn scan_entries(dir: &Path) -> Result<Vec<PendingEntry>, ScanError> {
    let read_dir = fs::read_dir(dir).map_err(|source| ScanError::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_entry_file(path))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| -> Result<PendingEntry, ScanError> {
            let entry = Entry::read(&path)?;
            Ok(PendingEntry {
                modified: modified(&path),
                entry,
                path,
            })
        })
        .collect()
}

/// Read the output document, if it exists.
pub fn read_output(path: &Path) -> Result<Option<Vec<u8>>, ScanError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ScanError::Output {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
