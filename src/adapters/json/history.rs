//! JSON lines history storage
//!
//! Each appended entry version becomes one line. The file is only ever
//! opened in append mode.

use crate::adapters::store::{HistoryStorage, StoreResult};
use crate::core::history::entry::HistoryEntry;
use crate::domain::StoreError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Append-only history backed by a `.jsonl` file or kept in memory
///
/// A file-backed log is re-read on every load so appends made by other
/// processes sharing the file are seen.
pub struct JsonHistoryStorage {
    path: Option<PathBuf>,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl JsonHistoryStorage {
    /// Open or create a history file
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidData`] if an existing line does not parse.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        read_entries(&path).await?;
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }
}

async fn read_entries(path: &Path) -> StoreResult<Vec<HistoryEntry>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::ConnectionFailed(format!(
                "failed to read history {}: {e}",
                path.display()
            )))
        }
    };

    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).map_err(|e| {
                StoreError::InvalidData(format!("{} line {}: {e}", path.display(), n + 1))
            })
        })
        .collect()
}

#[async_trait]
impl HistoryStorage for JsonHistoryStorage {
    async fn append(&self, entry: &HistoryEntry) -> StoreResult<()> {
        let mut entries = self.entries.lock().await;

        let Some(path) = &self.path else {
            entries.push(entry.clone());
            return Ok(());
        };

        let mut line = serde_json::to_string(entry)
            .map_err(|e| StoreError::WriteFailed(format!("failed to encode entry: {e}")))?;
        line.push('\n');

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| {
                StoreError::WriteFailed(format!("failed to open {}: {e}", path.display()))
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }

    async fn load_all(&self) -> StoreResult<Vec<HistoryEntry>> {
        match &self.path {
            Some(path) => {
                let _appending = self.entries.lock().await;
                read_entries(path).await
            }
            None => Ok(self.entries.lock().await.clone()),
        }
    }
}
