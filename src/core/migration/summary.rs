//! Migration run results

use crate::core::history::RunStatus;
use crate::core::migration::transform::RecordDiff;
use crate::core::validation::ValidationReport;
use crate::domain::ids::{BackupId, RunId};
use crate::domain::records::MigrationType;
use crate::domain::{IssueType, MappingError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Category of a record-level failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Team could not be resolved to a usable club
    Mapping,
    /// The write failed after retries
    Persistence,
}

/// A record left unmigrated and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFailure {
    pub record_id: String,
    pub kind: FailureKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    pub message: String,
}

impl RecordFailure {
    pub fn mapping(record_id: impl Into<String>, error: &MappingError) -> Self {
        Self {
            record_id: record_id.into(),
            kind: FailureKind::Mapping,
            issue_type: Some(error.issue_type()),
            message: error.to_string(),
        }
    }

    pub fn persistence(record_id: impl Into<String>, error: &impl fmt::Display) -> Self {
        Self {
            record_id: record_id.into(),
            kind: FailureKind::Persistence,
            issue_type: None,
            message: error.to_string(),
        }
    }

    /// Unmappable teams are skipped rather than failed
    pub fn is_skip(&self) -> bool {
        self.issue_type == Some(IssueType::UnmappableTeam)
    }
}

/// Outcome of one migration run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: RunId,
    pub migration_type: MigrationType,
    pub status: RunStatus,
    pub dry_run: bool,
    pub backup_id: Option<BackupId>,
    /// Records of the type inspected
    pub processed: usize,
    /// Records written (or that would be written in a dry run)
    pub migrated: usize,
    /// Records already club-keyed
    pub unchanged: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pre_validation: Option<ValidationReport>,
    pub post_validation: Option<ValidationReport>,
    pub failures: Vec<RecordFailure>,
    /// Planned changes, filled in dry runs
    pub diffs: Vec<RecordDiff>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl RunResult {
    pub fn completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Migrated plus unchanged
    pub fn succeeded(&self) -> usize {
        self.migrated + self.unchanged
    }

    pub fn post_validation_errors(&self) -> usize {
        self.post_validation.as_ref().map_or(0, |r| r.errors)
    }

    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            migration_type = %self.migration_type,
            status = %self.status,
            dry_run = self.dry_run,
            processed = self.processed,
            migrated = self.migrated,
            unchanged = self.unchanged,
            failed = self.failed,
            skipped = self.skipped,
            duration_ms = self.duration.as_millis() as u64,
            "Migration run summary"
        );

        for failure in &self.failures {
            tracing::warn!(
                record_id = %failure.record_id,
                kind = ?failure.kind,
                message = %failure.message,
                "Record not migrated"
            );
        }
    }

    /// Format the result as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        let mode = if self.dry_run { " (dry run)" } else { "" };
        summary.push_str(&format!(
            "📦 Migration of {}{mode}: {}\n",
            self.migration_type, self.status
        ));
        summary.push_str(&format!("  Run ID: {}\n", self.run_id));
        if let Some(backup_id) = &self.backup_id {
            summary.push_str(&format!("  Backup: {backup_id}\n"));
        }
        summary.push_str(&format!("  Processed: {}\n", self.processed));
        summary.push_str(&format!("  ✅ Migrated: {}\n", self.migrated));
        summary.push_str(&format!("  ➖ Unchanged: {}\n", self.unchanged));
        summary.push_str(&format!("  ❌ Failed: {}\n", self.failed));
        summary.push_str(&format!("  ⏭️  Skipped: {}\n", self.skipped));
        if let Some(post) = &self.post_validation {
            summary.push_str(&format!(
                "  Post-validation: {} error(s), {} warning(s), health {}\n",
                post.errors, post.warnings, post.health_score
            ));
        }
        summary.push_str(&format!("  Duration: {} ms\n", self.duration.as_millis()));

        if !self.failures.is_empty() {
            summary.push_str("\n❌ Records not migrated:\n");
            for (i, failure) in self.failures.iter().enumerate() {
                summary.push_str(&format!(
                    "  {}. {}: {}\n",
                    i + 1,
                    failure.record_id,
                    failure.message
                ));
            }
        }
        summary
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreError;

    #[test]
    fn test_unmappable_is_skip() {
        let skip = RecordFailure::mapping(
            "m1",
            &MappingError::UnmappableTeam {
                team: "X".to_string(),
            },
        );
        let fail = RecordFailure::mapping(
            "m2",
            &MappingError::Inactive {
                club: "Y".to_string(),
            },
        );
        assert!(skip.is_skip());
        assert!(!fail.is_skip());
        assert_eq!(fail.issue_type, Some(IssueType::InvalidClubLeague));
    }

    #[test]
    fn test_persistence_failure() {
        let failure =
            RecordFailure::persistence("s1", &StoreError::Timeout("deadline".to_string()));
        assert_eq!(failure.kind, FailureKind::Persistence);
        assert!(failure.message.contains("deadline"));
    }
}
