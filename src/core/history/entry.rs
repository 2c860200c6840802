//! History entry model
//!
//! A run is persisted as a sequence of entry versions sharing one id. The
//! first version is appended when the run starts, the last one carries the
//! terminal status. Readers collapse versions to the newest per id.

use crate::domain::ids::{BackupId, RunId};
use crate::domain::records::MigrationType;
use crate::domain::{BackupError, MigrateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of run recorded in the history log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Migrate,
    Rollback,
    Cleanup,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Migrate => "migrate",
            Self::Rollback => "rollback",
            Self::Cleanup => "cleanup",
        };
        write!(f, "{s}")
    }
}

/// Run state machine: `pending -> running -> completed | failed | partial`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Partial,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Partial)
    }

    /// Completed and partial runs leave usable data behind
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial)
    }

    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Failed),
            Self::Running => next.is_terminal(),
            _ => false,
        }
    }

    /// Derive a terminal status from per-record outcomes
    ///
    /// `succeeded` includes records that needed no change. A run with nothing
    /// to do completes.
    pub fn from_outcomes(succeeded: usize, unsuccessful: usize, post_errors: usize) -> Self {
        if unsuccessful == 0 && post_errors == 0 {
            Self::Completed
        } else if succeeded == 0 && unsuccessful > 0 {
            Self::Failed
        } else {
            Self::Partial
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Partial => "partial",
        };
        write!(f, "{s}")
    }
}

/// Why a run ended failed before or without doing its work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AbortReason {
    PreValidationFailed,
    BackupFailed,
    NoRecordSucceeded,
    SupersededByRollback,
    VersionIncompatible,
    StoreUnavailable,
}

impl AbortReason {
    /// The reason recorded when a run ends with `error`
    pub fn for_error(error: &MigrateError) -> Self {
        match error {
            MigrateError::PreValidationFailed { .. } => Self::PreValidationFailed,
            MigrateError::Backup(BackupError::ReadFailed(_)) => Self::StoreUnavailable,
            MigrateError::Backup(_) | MigrateError::BackupNotFound(_) => Self::BackupFailed,
            MigrateError::VersionIncompatible { .. } => Self::VersionIncompatible,
            _ => Self::StoreUnavailable,
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PreValidationFailed => "pre-validation-failed",
            Self::BackupFailed => "backup-failed",
            Self::NoRecordSucceeded => "no-record-succeeded",
            Self::SupersededByRollback => "superseded-by-rollback",
            Self::VersionIncompatible => "version-incompatible",
            Self::StoreUnavailable => "store-unavailable",
        };
        write!(f, "{s}")
    }
}

/// Record counts carried by a finalized entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// One version of a run's history record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: RunId,
    pub operation: OperationKind,
    pub migration_type: MigrationType,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub backup_id: Option<BackupId>,
    #[serde(default)]
    pub error_count: usize,
    #[serde(default)]
    pub warning_count: usize,
    #[serde(default)]
    pub counts: RunCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<AbortReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When this version was written
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create a pending entry for a new run
    pub fn new(operation: OperationKind, migration_type: MigrationType) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::generate(),
            operation,
            migration_type,
            status: RunStatus::Pending,
            started_at: now,
            completed_at: None,
            backup_id: None,
            error_count: 0,
            warning_count: 0,
            counts: RunCounts::default(),
            abort_reason: None,
            message: None,
            recorded_at: now,
        }
    }

    /// Move to `running`
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::History`] if the entry is not pending.
    pub fn mark_running(&mut self) -> Result<()> {
        self.transition(RunStatus::Running)
    }

    /// Move to a terminal status
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::History`] if the entry is already terminal or
    /// `status` is not terminal.
    pub fn finalize(&mut self, status: RunStatus) -> Result<()> {
        if !status.is_terminal() {
            return Err(MigrateError::History(format!(
                "cannot finalize run {} with non-terminal status {status}",
                self.id
            )));
        }
        self.transition(status)?;
        self.completed_at = Some(self.recorded_at);
        Ok(())
    }

    /// Finalize as failed with a reason
    pub fn abort(&mut self, reason: AbortReason, message: impl Into<String>) -> Result<()> {
        self.abort_reason = Some(reason);
        self.message = Some(message.into());
        self.finalize(RunStatus::Failed)
    }

    pub fn with_backup(mut self, backup_id: BackupId) -> Self {
        self.backup_id = Some(backup_id);
        self
    }

    /// Returns true if the entry is running and older than `timeout`
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.status == RunStatus::Running && now - self.started_at > timeout
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|c| c - self.started_at)
    }

    fn transition(&mut self, next: RunStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(MigrateError::History(format!(
                "invalid status transition for run {}: {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.recorded_at = Utc::now();
        Ok(())
    }
}
