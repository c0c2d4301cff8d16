//! A JSON file standing in for the designer surface
//!
//! The file is polled for edits, and every save shortcut re-reads it before
//! being passed on, so a manual save always persists what is on disk.

use super::designer::Designer;
use super::shortcuts::ShortcutCommand;
use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum DocumentFileError {
    #[error("could not read document file: {0}")]
    Read(#[from] std::io::Error),
    #[error("document file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct DocumentFile {
    path: PathBuf,
}

impl DocumentFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the file into the designer. Returns whether the document changed.
    pub async fn sync(&self, designer: &Designer) -> Result<bool, DocumentFileError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(designer.set_text(&content)?)
    }

    /// Poll the file every `poll` and relay `incoming` shortcuts to
    /// `outgoing`, syncing the file right before each save. Runs until
    /// either shortcut channel closes. Read or parse failures go to
    /// `on_invalid`; the designer keeps its last good document.
    pub async fn drive<F>(
        self,
        designer: Designer,
        mut incoming: mpsc::UnboundedReceiver<ShortcutCommand>,
        outgoing: mpsc::UnboundedSender<ShortcutCommand>,
        poll: Duration,
        on_invalid: F,
    ) where
        F: Fn(&DocumentFileError),
    {
        let mut interval = tokio::time::interval(poll);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut last_seen: Option<String> = None;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let content = match tokio::fs::read_to_string(&self.path).await {
                        Ok(content) => content,
                        Err(e) => {
                            debug!("Could not read {:?}: {}", self.path, e);
                            continue;
                        }
                    };
                    if last_seen.as_deref() == Some(content.as_str()) {
                        continue;
                    }

                    match designer.set_text(&content) {
                        Ok(changed) => debug!("Document reloaded from {:?} (changed: {})", self.path, changed),
                        Err(e) => {
                            warn!("Ignoring invalid JSON in {:?}: {}", self.path, e);
                            on_invalid(&DocumentFileError::Parse(e));
                        }
                    }
                    last_seen = Some(content);
                }
                command = incoming.recv() => {
                    let Some(command) = command else { break };
                    if command == ShortcutCommand::Save {
                        if let Err(e) = self.sync(&designer).await {
                            warn!("Saving last good document, {:?} could not be loaded: {}", self.path, e);
                            on_invalid(&e);
                        }
                    }
                    if outgoing.send(command).is_err() {
                        break;
                    }
                }
            }
        }
        debug!("Stopped watching {:?}", self.path);
    }
}
