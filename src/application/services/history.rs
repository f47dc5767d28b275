//! Launch history
//!
//! Keeps the newest [`MAX_HISTORY`] launches in `launch_history.json` inside the
//! base directory. A missing or unreadable file counts as an empty history.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::HistoryEntry;
use crate::infrastructure::traits::FileSystem;

/// History file name inside the base directory.
pub const HISTORY_FILE: &str = "launch_history.json";

/// Number of records kept.
pub const MAX_HISTORY: usize = 50;

/// Service reading and writing the launch history.
pub struct HistoryService {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl HistoryService {
    /// History stored in `base_dir/launch_history.json`.
    pub fn new(fs: Arc<dyn FileSystem>, base_dir: &Path) -> Self {
        Self {
            fs,
            path: base_dir.join(HISTORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the newest [`MAX_HISTORY`] records, oldest first.
    pub fn load(&self) -> Vec<HistoryEntry> {
        if !self.fs.exists(&self.path) {
            return Vec::new();
        }
        let entries: Vec<HistoryEntry> = match self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()))
        {
            Ok(entries) => entries,
            Err(e) => {
                debug!("ignoring unreadable history {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };
        keep_newest(entries)
    }

    /// Append a record stamped with the current local time.
    pub fn record(&self, name: &str, path: &str, kind: &str) -> ApplicationResult<HistoryEntry> {
        let entry = HistoryEntry {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            name: name.to_string(),
            path: path.to_string(),
            kind: kind.to_string(),
        };
        let mut entries = self.load();
        entries.push(entry.clone());
        self.save(&keep_newest(entries))?;
        Ok(entry)
    }

    /// Remove all records.
    pub fn clear(&self) -> ApplicationResult<()> {
        self.save(&[])
    }

    fn save(&self, entries: &[HistoryEntry]) -> ApplicationResult<()> {
        let content =
            serde_json::to_string_pretty(entries).map_err(|e| ApplicationError::OperationFailed {
                context: format!("serialize history {}", self.path.display()),
                source: Box::new(e),
            })?;
        self.fs
            .write(&self.path, &content)
            .with_path_context("write history", &self.path)
    }
}

fn keep_newest(mut entries: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    if entries.len() > MAX_HISTORY {
        let excess = entries.len() - MAX_HISTORY;
        entries.drain(..excess);
    }
    entries
}
