//! JSON persistence for usage state
//!
//! The whole state is rewritten after every tracked request. Writes go to a
//! sibling temp file and are renamed into place so a crash never leaves a
//! half-written document. A missing or unreadable file means "start empty".

use super::budget::Budget;
use super::metrics::{CommandStats, UsageMetrics};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Serialized tracker state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageSnapshot {
    /// When the snapshot was taken
    pub saved_at: Option<DateTime<Utc>>,
    /// Per-provider metrics
    pub metrics: Vec<UsageMetrics>,
    /// Command statistics
    pub commands: HashMap<String, CommandStats>,
    /// Per-provider budgets
    pub budgets: HashMap<String, Budget>,
}

/// File-backed snapshot store
#[derive(Debug)]
pub struct UsageStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl UsageStore {
    /// Store backed by `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last snapshot; `None` if missing or corrupt
    pub async fn load(&self) -> Option<UsageSnapshot> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No usage state yet");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read usage state, starting empty");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt usage state, starting empty");
                None
            }
        }
    }

    /// Write a snapshot atomically
    pub async fn save(&self, snapshot: &UsageSnapshot) -> Result<()> {
        self.save_with(|| snapshot.clone()).await
    }

    /// Take a snapshot under the write lock and write it.
    ///
    /// Concurrent writers are serialized, so the file always ends up with
    /// the newest state.
    pub async fn save_with<F>(&self, take: F) -> Result<()>
    where
        F: FnOnce() -> UsageSnapshot,
    {
        let _guard = self.write_lock.lock().await;

        let json = serde_json::to_vec_pretty(&take())
            .map_err(|e| Error::Persistence(format!("serialize usage state: {e}")))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Persistence(format!("create {}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| Error::Persistence(format!("write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| Error::Persistence(format!("rename {}: {e}", self.path.display())))?;

        Ok(())
    }
}
