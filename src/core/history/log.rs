//! History log over an append-only storage backend

use crate::adapters::store::HistoryStorage;
use crate::core::history::entry::{AbortReason, HistoryEntry, OperationKind, RunStatus};
use crate::domain::ids::BackupId;
use crate::domain::records::MigrationType;
use crate::domain::{MigrateError, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Reads and appends run history
///
/// Entries are never updated in place: every state change appends a new
/// version and readers keep the newest version per run id.
pub struct HistoryLog {
    storage: Arc<dyn HistoryStorage + Send + Sync>,
}

impl HistoryLog {
    pub fn new(storage: Arc<dyn HistoryStorage + Send + Sync>) -> Self {
        Self { storage }
    }

    /// Move a pending entry to running and append it
    pub async fn begin(&self, entry: &mut HistoryEntry) -> Result<()> {
        entry.mark_running()?;
        self.append(entry).await
    }

    /// Append the terminal version of an entry
    pub async fn finalize(&self, entry: &mut HistoryEntry, status: RunStatus) -> Result<()> {
        entry.finalize(status)?;
        self.append(entry).await
    }

    /// Append a failed terminal version with a reason
    pub async fn abort(
        &self,
        entry: &mut HistoryEntry,
        reason: AbortReason,
        message: impl Into<String>,
    ) -> Result<()> {
        entry.abort(reason, message)?;
        self.append(entry).await
    }

    /// Append the current version of a running entry
    pub async fn checkpoint(&self, entry: &HistoryEntry) -> Result<()> {
        self.append(entry).await
    }

    async fn append(&self, entry: &HistoryEntry) -> Result<()> {
        self.storage.append(entry).await.map_err(|e| {
            MigrateError::History(format!("failed to append entry {}: {e}", entry.id))
        })?;
        tracing::debug!(
            run_id = %entry.id,
            operation = %entry.operation,
            status = %entry.status,
            "History entry appended"
        );
        Ok(())
    }

    /// Current state of every run, newest start first
    pub async fn entries(&self) -> Result<Vec<HistoryEntry>> {
        let versions = self
            .storage
            .load_all()
            .await
            .map_err(|e| MigrateError::History(format!("failed to read history: {e}")))?;

        let mut latest: HashMap<String, HistoryEntry> = HashMap::new();
        for entry in versions {
            // append order wins over clock skew between versions
            latest.insert(entry.id.as_str().to_string(), entry);
        }

        let mut entries: Vec<HistoryEntry> = latest.into_values().collect();
        entries.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(entries)
    }

    /// Runs started within the last `days` days
    pub async fn within_period(&self, days: u32, now: DateTime<Utc>) -> Result<Vec<HistoryEntry>> {
        let since = now - Duration::days(i64::from(days));
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.started_at >= since)
            .collect())
    }

    /// Newest entry of a type, optionally filtered by operation
    pub async fn latest(
        &self,
        migration_type: MigrationType,
        operation: Option<OperationKind>,
    ) -> Result<Option<HistoryEntry>> {
        Ok(self.entries().await?.into_iter().find(|e| {
            e.migration_type == migration_type && operation.map_or(true, |op| e.operation == op)
        }))
    }

    /// Backup of the newest completed or partial migrate run of a type
    pub async fn last_successful_backup(
        &self,
        migration_type: MigrationType,
    ) -> Result<Option<BackupId>> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| {
                e.migration_type == migration_type
                    && e.operation == OperationKind::Migrate
                    && e.status.is_successful()
            })
            .find_map(|e| e.backup_id))
    }

    /// Refuse to start `operation` while a run of this type is still marked
    /// running
    ///
    /// Migrate, rollback and cleanup entries all count. A rollback passes
    /// over stale entries because it closes them once it completes.
    ///
    /// # Errors
    ///
    /// [`MigrateError::AlreadyRunning`] when a running entry is younger than
    /// `timeout`, [`MigrateError::StaleRun`] when only stale entries remain
    /// and `operation` is not a rollback.
    pub async fn ensure_no_running(
        &self,
        operation: OperationKind,
        migration_type: MigrationType,
        timeout: Duration,
    ) -> Result<()> {
        let now = Utc::now();
        let running: Vec<HistoryEntry> = self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.migration_type == migration_type && e.status == RunStatus::Running)
            .collect();

        if let Some(active) = running.iter().find(|e| !e.is_stale(now, timeout)) {
            tracing::warn!(
                run_id = %active.id,
                operation = %active.operation,
                migration_type = %migration_type,
                "Another run of this type is in progress"
            );
            return Err(MigrateError::AlreadyRunning(migration_type));
        }

        if operation == OperationKind::Rollback {
            return Ok(());
        }
        let Some(entry) = running.into_iter().next() else {
            return Ok(());
        };

        let last_backup = self.last_successful_backup(migration_type).await?;
        tracing::warn!(
            run_id = %entry.id,
            operation = %entry.operation,
            migration_type = %migration_type,
            started_at = %entry.started_at,
            "Stale running entry detected"
        );
        Err(MigrateError::StaleRun {
            migration_type,
            run_id: entry.id.to_string(),
            started_at: entry.started_at.to_rfc3339(),
            last_backup: last_backup.or(entry.backup_id).map(|b| b.into_inner()),
        })
    }

    /// Finalize leftover running entries of a type as failed
    ///
    /// Returns the number of entries closed.
    pub async fn supersede_running(&self, migration_type: MigrationType) -> Result<usize> {
        let mut closed = 0;
        for mut entry in self.entries().await? {
            if entry.migration_type == migration_type && entry.status == RunStatus::Running {
                self.abort(
                    &mut entry,
                    AbortReason::SupersededByRollback,
                    "superseded by rollback",
                )
                .await?;
                closed += 1;
            }
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json::JsonHistoryStorage;

    fn log() -> HistoryLog {
        HistoryLog::new(Arc::new(JsonHistoryStorage::in_memory()))
    }

    #[tokio::test]
    async fn test_versions_collapse_to_latest() {
        let log = log();
        let mut entry = HistoryEntry::new(OperationKind::Migrate, MigrationType::Matches);
        log.begin(&mut entry).await.unwrap();
        log.finalize(&mut entry, RunStatus::Completed).await.unwrap();

        let entries = log.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_running_entry_blocks() {
        let log = log();
        let mut entry = HistoryEntry::new(OperationKind::Migrate, MigrationType::Matches);
        log.begin(&mut entry).await.unwrap();

        let err = log
            .ensure_no_running(OperationKind::Migrate, MigrationType::Matches, Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::AlreadyRunning(MigrationType::Matches)));

        // other type is unaffected
        log.ensure_no_running(OperationKind::Migrate, MigrationType::Standings, Duration::hours(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stale_entry_names_last_backup() {
        let log = log();

        let mut ok = HistoryEntry::new(OperationKind::Migrate, MigrationType::Matches)
            .with_backup(BackupId::new("matches-migration-1").unwrap());
        ok.started_at = Utc::now() - Duration::hours(5);
        log.begin(&mut ok).await.unwrap();
        log.finalize(&mut ok, RunStatus::Completed).await.unwrap();

        let mut crashed = HistoryEntry::new(OperationKind::Migrate, MigrationType::Matches);
        crashed.started_at = Utc::now() - Duration::hours(2);
        log.begin(&mut crashed).await.unwrap();

        let err = log
            .ensure_no_running(OperationKind::Migrate, MigrationType::Matches, Duration::hours(1))
            .await
            .unwrap_err();
        match err {
            MigrateError::StaleRun { last_backup, .. } => {
                assert_eq!(last_backup.as_deref(), Some("matches-migration-1"));
            }
            other => panic!("expected StaleRun, got {other:?}"),
        }

        assert_eq!(log.supersede_running(MigrationType::Matches).await.unwrap(), 1);
        log.ensure_no_running(OperationKind::Migrate, MigrationType::Matches, Duration::hours(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_running_cleanup_blocks_migrate_and_rollback() {
        let log = log();
        let mut cleanup = HistoryEntry::new(OperationKind::Cleanup, MigrationType::Standings);
        log.begin(&mut cleanup).await.unwrap();

        for operation in [OperationKind::Migrate, OperationKind::Rollback] {
            let err = log
                .ensure_no_running(operation, MigrationType::Standings, Duration::hours(1))
                .await
                .unwrap_err();
            assert!(matches!(err, MigrateError::AlreadyRunning(MigrationType::Standings)));
        }
    }

    #[tokio::test]
    async fn test_rollback_passes_over_stale_entries() {
        let log = log();
        let mut crashed = HistoryEntry::new(OperationKind::Rollback, MigrationType::Matches);
        crashed.started_at = Utc::now() - Duration::hours(3);
        log.begin(&mut crashed).await.unwrap();

        log.ensure_no_running(OperationKind::Rollback, MigrationType::Matches, Duration::hours(1))
            .await
            .unwrap();
        let err = log
            .ensure_no_running(OperationKind::Cleanup, MigrationType::Matches, Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrateError::StaleRun { .. }));

        assert_eq!(log.supersede_running(MigrationType::Matches).await.unwrap(), 1);
    }
}
