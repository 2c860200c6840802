//! Snapshot persistence
//!
//! Snapshots are pretty JSON files named `<backupId>.json` in the backup
//! directory. A file is written once through a temporary sibling and a
//! rename, and never rewritten.

use crate::config::schema::BackupConfig;
use crate::core::backup::snapshot::{
    major_version, BackupKind, BackupMetadata, BackupPayload, BackupSnapshot,
};
use crate::domain::records::MigrationType;
use crate::domain::{BackupError, MigrateError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Creates, loads and lists snapshots
#[derive(Debug, Clone)]
pub struct BackupManager {
    directory: PathBuf,
    version: String,
}

/// Only the header is parsed when listing
#[derive(Deserialize)]
struct MetadataOnly {
    metadata: BackupMetadata,
}

impl BackupManager {
    pub fn new(config: &BackupConfig) -> Self {
        Self::with_directory(&config.directory, &config.version)
    }

    pub fn with_directory(directory: impl AsRef<Path>, version: impl Into<String>) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            version: version.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Format version written into new snapshots
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns true if a snapshot of `version` can be restored by this build
    pub fn is_compatible(&self, version: &str) -> bool {
        major_version(version) == major_version(&self.version)
    }

    pub fn path_for(&self, backup_id: &str) -> PathBuf {
        self.directory.join(format!("{backup_id}.json"))
    }

    /// Take and persist a snapshot of `data`
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::WriteFailed`] if the file cannot be written.
    /// Nothing has been mutated when this fails.
    pub async fn snapshot(
        &self,
        migration_type: MigrationType,
        kind: BackupKind,
        data: BackupPayload,
    ) -> Result<BackupSnapshot> {
        let mut timestamp = Utc::now();
        // ids carry millisecond precision; never reuse an existing file
        while tokio::fs::try_exists(self.path_for(&id_at(migration_type, kind, timestamp)?))
            .await
            .unwrap_or(false)
        {
            timestamp += Duration::milliseconds(1);
        }

        let snapshot = BackupSnapshot::new(migration_type, kind, &self.version, timestamp, data)?;
        self.save(&snapshot).await?;

        tracing::info!(
            backup_id = %snapshot.id(),
            migration_type = %migration_type,
            kind = %kind,
            record_count = snapshot.metadata.record_count,
            "Snapshot created"
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &BackupSnapshot) -> Result<()> {
        let backup_id = snapshot.id().to_string();
        let write_failed = |reason: String| {
            MigrateError::Backup(BackupError::WriteFailed {
                backup_id: backup_id.clone(),
                reason,
            })
        };

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| write_failed(format!("cannot create {}: {e}", self.directory.display())))?;

        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| write_failed(format!("cannot encode snapshot: {e}")))?;

        let path = self.path_for(&backup_id);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| write_failed(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| write_failed(format!("cannot rename to {}: {e}", path.display())))?;
        Ok(())
    }

    /// Load and verify a snapshot
    ///
    /// # Errors
    ///
    /// - [`MigrateError::BackupNotFound`] if no such snapshot exists
    /// - [`BackupError::Corrupted`] if the file does not parse or its
    ///   checksum does not match
    /// - [`BackupError::CountMismatch`] if the record count is wrong
    pub async fn load(&self, backup_id: &str) -> Result<BackupSnapshot> {
        if backup_id.trim().is_empty()
            || backup_id.contains(['/', '\\'])
            || backup_id.contains("..")
        {
            return Err(MigrateError::BackupNotFound(backup_id.to_string()));
        }

        let path = self.path_for(backup_id);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MigrateError::BackupNotFound(backup_id.to_string()))
            }
            Err(e) => {
                return Err(BackupError::ReadFailed(format!("{}: {e}", path.display())).into())
            }
        };

        let snapshot: BackupSnapshot =
            serde_json::from_str(&raw).map_err(|e| BackupError::Corrupted {
                backup_id: backup_id.to_string(),
                reason: format!("invalid snapshot file: {e}"),
            })?;
        snapshot.verify()?;
        Ok(snapshot)
    }

    /// Metadata of every snapshot, newest first
    ///
    /// Unreadable files are skipped with a warning.
    pub async fn list(&self) -> Result<Vec<BackupMetadata>> {
        let mut dir = match tokio::fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| e.to_string())
                .and_then(|raw| {
                    serde_json::from_str::<MetadataOnly>(&raw).map_err(|e| e.to_string())
                });
            match parsed {
                Ok(file) => found.push(file.metadata),
                Err(reason) => tracing::warn!(
                    path = %path.display(),
                    reason = %reason,
                    "Skipping unreadable snapshot file"
                ),
            }
        }

        found.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(found)
    }
}

fn id_at(migration_type: MigrationType, kind: BackupKind, at: DateTime<Utc>) -> Result<String> {
    crate::core::backup::snapshot::generate_id(migration_type, kind, at).map(|id| id.into_inner())
}
