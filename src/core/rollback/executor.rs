//! Rollback executor
//!
//! Loads a snapshot, checks its format version, takes the type lock and
//! delegates the record writes to [`BackupManager::restore`]. Every rollback
//! that gets past loading the snapshot leaves a finalized `rollback` history
//! entry, including rejected version mismatches.
//!
//! [`BackupManager::restore`]: crate::core::backup::BackupManager::restore

use crate::core::backup::{BackupSnapshot, RestoreOptions, RestoreOutcome, RestoreReport};
use crate::core::context::RunContext;
use crate::core::history::{AbortReason, HistoryEntry, OperationKind, RunCounts, RunStatus};
use crate::domain::ids::{BackupId, RunId};
use crate::domain::records::MigrationType;
use crate::domain::{MigrateError, Result};
use crate::{log_error_with_context, log_run_complete, log_run_start};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Options for a rollback
#[derive(Debug, Clone, Copy, Default)]
pub struct RollbackOptions {
    /// Overwrite records changed after the snapshot and accept a snapshot
    /// written by a different format version
    pub force: bool,
}

/// Outcome of a rollback
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackResult {
    pub run_id: RunId,
    pub backup_id: BackupId,
    pub pre_rollback_backup_id: Option<BackupId>,
    pub migration_type: MigrationType,
    pub status: RunStatus,
    pub restored: usize,
    pub skipped: usize,
    pub errors: usize,
    pub outcomes: Vec<RestoreOutcome>,
    /// Records a human has to look at
    pub manual_reconciliation: Vec<String>,
}

impl RollbackResult {
    fn from_report(
        run_id: RunId,
        snapshot: &BackupSnapshot,
        status: RunStatus,
        report: RestoreReport,
    ) -> Self {
        Self {
            run_id,
            backup_id: snapshot.id().clone(),
            migration_type: snapshot.migration_type(),
            status,
            restored: report.restored(),
            skipped: report.skipped(),
            errors: report.errors(),
            manual_reconciliation: report.manual_reconciliation(),
            pre_rollback_backup_id: report.pre_rollback_backup_id,
            outcomes: report.outcomes,
        }
    }

    /// Format the result as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str(&format!(
            "⏪ Rollback of {} from {}: {}\n",
            self.migration_type, self.backup_id, self.status
        ));
        summary.push_str(&format!("  Run ID: {}\n", self.run_id));
        if let Some(pre) = &self.pre_rollback_backup_id {
            summary.push_str(&format!("  Pre-rollback backup: {pre}\n"));
        }
        summary.push_str(&format!("  ✅ Restored: {}\n", self.restored));
        summary.push_str(&format!("  ⏭️  Skipped: {}\n", self.skipped));
        summary.push_str(&format!("  ❌ Errors: {}\n", self.errors));

        if !self.manual_reconciliation.is_empty() {
            summary.push_str("\n⚠️  Needs manual reconciliation:\n");
            for outcome in self
                .outcomes
                .iter()
                .filter(|o| o.status.needs_reconciliation())
            {
                summary.push_str(&format!("  - {} ({})\n", outcome.record_id, outcome.status));
            }
        }
        summary
    }
}

/// Derive the rollback status from restore outcomes
///
/// An empty snapshot restores trivially.
fn rollback_status(report: &RestoreReport) -> RunStatus {
    let not_restored = report.skipped() + report.errors();
    if not_restored == 0 {
        RunStatus::Completed
    } else if report.restored() == 0 {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    }
}

/// Restores snapshots under the type lock
pub struct RollbackExecutor {
    ctx: RunContext,
}

impl RollbackExecutor {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Restore the records of snapshot `backup_id`
    ///
    /// # Errors
    ///
    /// - [`MigrateError::BackupNotFound`] if no such snapshot exists
    /// - [`MigrateError::VersionIncompatible`] if the snapshot was written by
    ///   another major format version and `force` is not set
    /// - [`MigrateError::AlreadyRunning`] if the type lock is held or a
    ///   recent run of the type is still marked running
    pub async fn rollback(
        &self,
        backup_id: &str,
        options: RollbackOptions,
    ) -> Result<RollbackResult> {
        let started = Instant::now();
        let snapshot = self.ctx.backups.load(backup_id).await?;
        let migration_type = snapshot.migration_type();

        let _lock = self.ctx.locks.acquire(migration_type)?;

        self.ctx
            .history
            .ensure_no_running(
                OperationKind::Rollback,
                migration_type,
                self.ctx.stale_run_timeout(),
            )
            .await?;
        let mut entry = HistoryEntry::new(OperationKind::Rollback, migration_type)
            .with_backup(snapshot.id().clone());
        self.ctx.history.begin(&mut entry).await?;
        log_run_start!(OperationKind::Rollback, migration_type, entry.id, false);

        match self.execute(&snapshot, options, &mut entry).await {
            Ok(result) => {
                log_run_complete!(
                    OperationKind::Rollback,
                    migration_type,
                    result.status,
                    result.restored,
                    started.elapsed()
                );
                Ok(result)
            }
            Err(e) => {
                log_error_with_context!(&e, "Rollback aborted");
                if entry.status == RunStatus::Running {
                    if let Err(history_err) = self
                        .ctx
                        .history
                        .abort(&mut entry, AbortReason::for_error(&e), e.to_string())
                        .await
                    {
                        log_error_with_context!(&history_err, "Failed to record aborted rollback");
                    }
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        snapshot: &BackupSnapshot,
        options: RollbackOptions,
        entry: &mut HistoryEntry,
    ) -> Result<RollbackResult> {
        let found = &snapshot.metadata.version;
        if !self.ctx.backups.is_compatible(found) {
            if !options.force {
                return Err(MigrateError::VersionIncompatible {
                    found: found.clone(),
                    expected: self.ctx.backups.version().to_string(),
                });
            }
            tracing::warn!(
                backup_id = %snapshot.id(),
                found = %found,
                expected = %self.ctx.backups.version(),
                "Restoring snapshot from an incompatible version because of --force"
            );
        }

        let report = self
            .ctx
            .backups
            .restore(
                self.ctx.store.as_ref(),
                snapshot,
                RestoreOptions {
                    force: options.force,
                },
                &self.ctx.retry,
            )
            .await?;

        let status = rollback_status(&report);
        let migration_type = snapshot.migration_type();

        entry.counts = RunCounts {
            processed: report.outcomes.len(),
            succeeded: report.restored(),
            failed: report.errors(),
            skipped: report.skipped(),
        };
        entry.error_count = report.errors();
        entry.warning_count = report.skipped();

        if status == RunStatus::Failed {
            self.ctx
                .history
                .abort(
                    entry,
                    AbortReason::NoRecordSucceeded,
                    format!("none of {} record(s) restored", report.outcomes.len()),
                )
                .await?;
        } else {
            self.ctx.history.finalize(entry, status).await?;
            let superseded = self.ctx.history.supersede_running(migration_type).await?;
            if superseded > 0 {
                tracing::info!(
                    migration_type = %migration_type,
                    superseded,
                    "Closed running entries after rollback"
                );
            }
        }

        Ok(RollbackResult::from_report(
            entry.id.clone(),
            snapshot,
            status,
            report,
        ))
    }
}
