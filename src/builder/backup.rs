//! Best-effort local copy of the last edited document
//!
//! Never authoritative: failures are logged and otherwise ignored.

use log::{debug, warn};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

const BACKUP_FILE: &str = "last-edited.json";

#[derive(Debug, Clone)]
pub struct DocumentBackup {
    path: PathBuf,
}

impl DocumentBackup {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backup file in the user cache directory
    pub fn default_location() -> Option<Self> {
        let dir = dirs::cache_dir()?.join("survey-modules");
        Some(Self::new(dir.join(BACKUP_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, document: &Value) {
        if let Err(e) = self.try_store(document) {
            warn!("Could not back up document to {:?}: {}", self.path, e);
        }
    }

    fn try_store(&self, document: &Value) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(document)?)?;
        debug!("Backed up document to {:?}", self.path);
        Ok(())
    }

    pub fn restore(&self) -> Option<Value> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }
}
