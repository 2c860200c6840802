//! Cleanup engine
//!
//! Candidates are selected from validator findings:
//! - matches without any participant reference
//! - records pointing at leagues, teams or clubs that do not exist
//! - standings rows repeating a display name within a league, except the
//!   row that is kept (the one with a club id, else the newest)
//!
//! A candidate that also fails an unrelated error check is left alone.
//! Everything deleted is snapshotted first.

use crate::core::backup::{BackupKind, BackupPayload};
use crate::core::context::RunContext;
use crate::core::history::{AbortReason, HistoryEntry, OperationKind, RunCounts, RunStatus};
use crate::core::validation::{duplicate_groups, PassResult, Validator};
use crate::domain::ids::{BackupId, RunId};
use crate::domain::records::{MatchDocument, MigrationType, StandingsDocument};
use crate::domain::{IssueType, Result, Severity, StoreError};
use crate::{log_error_with_context, log_run_complete, log_run_start};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::time::Instant;

/// Options for a cleanup run
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupOptions {
    /// Report candidates without deleting
    pub dry_run: bool,
}

/// Why a record was selected for deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanupCategory {
    Orphaned,
    Duplicate,
    EmptyReference,
}

impl CleanupCategory {
    /// The issue type a record of this category is flagged with
    pub fn issue_type(&self) -> IssueType {
        match self {
            Self::Orphaned => IssueType::OrphanedReference,
            Self::Duplicate => IssueType::DuplicateEntry,
            Self::EmptyReference => IssueType::MissingReference,
        }
    }
}

impl fmt::Display for CleanupCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Orphaned => "orphaned",
            Self::Duplicate => "duplicate",
            Self::EmptyReference => "empty-reference",
        };
        write!(f, "{s}")
    }
}

/// Per-type cleanup counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupCounts {
    pub orphaned: usize,
    pub duplicates: usize,
    pub empty_references: usize,
    pub deleted: usize,
    /// Candidates left alone because of an unrelated error issue
    pub skipped: usize,
    pub failed: usize,
}

impl CleanupCounts {
    pub fn detected(&self) -> usize {
        self.orphaned + self.duplicates + self.empty_references
    }

    fn record(&mut self, category: CleanupCategory) {
        match category {
            CleanupCategory::Orphaned => self.orphaned += 1,
            CleanupCategory::Duplicate => self.duplicates += 1,
            CleanupCategory::EmptyReference => self.empty_references += 1,
        }
    }

    fn status(&self) -> RunStatus {
        if self.failed == 0 {
            RunStatus::Completed
        } else if self.deleted == 0 {
            RunStatus::Failed
        } else {
            RunStatus::Partial
        }
    }
}

/// Outcome of a cleanup over one or more types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub run_id: RunId,
    pub dry_run: bool,
    pub per_type: BTreeMap<MigrationType, CleanupCounts>,
    pub backup_ids: Vec<BackupId>,
    /// History entry written for each type
    pub history_ids: BTreeMap<MigrationType, RunId>,
    pub status: RunStatus,
}

impl CleanupResult {
    fn new(dry_run: bool) -> Self {
        Self {
            run_id: RunId::generate(),
            dry_run,
            per_type: BTreeMap::new(),
            backup_ids: Vec::new(),
            history_ids: BTreeMap::new(),
            status: RunStatus::Completed,
        }
    }

    pub fn total_deleted(&self) -> usize {
        self.per_type.values().map(|c| c.deleted).sum()
    }

    /// Format the result as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        let mode = if self.dry_run { " (dry run)" } else { "" };
        summary.push_str(&format!("🧹 Cleanup{mode}: {}\n", self.status));
        for (migration_type, counts) in &self.per_type {
            summary.push_str(&format!("\n  {migration_type}:\n"));
            summary.push_str(&format!("    Orphaned: {}\n", counts.orphaned));
            summary.push_str(&format!("    Duplicates: {}\n", counts.duplicates));
            summary.push_str(&format!("    Empty references: {}\n", counts.empty_references));
            summary.push_str(&format!("    🗑️  Deleted: {}\n", counts.deleted));
            summary.push_str(&format!("    ⏭️  Skipped: {}\n", counts.skipped));
            summary.push_str(&format!("    ❌ Failed: {}\n", counts.failed));
        }
        for backup_id in &self.backup_ids {
            summary.push_str(&format!("\n  Backup: {backup_id}"));
        }
        summary
    }
}

/// Selected deletion candidates of one type
#[derive(Default)]
struct Selection {
    counts: CleanupCounts,
    matches: Vec<MatchDocument>,
    standings: Vec<StandingsDocument>,
}

/// Deletes records the validator cannot repair
pub struct CleanupEngine {
    ctx: RunContext,
}

impl CleanupEngine {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    /// Clean up each of `types` in order
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::MigrateError::AlreadyRunning`] if a type
    /// lock is held or another run of the type is in progress,
    /// [`crate::domain::MigrateError::StaleRun`] if a crashed run must be
    /// rolled back first, or a snapshot or store error that stopped a type before
    /// anything of it was deleted.
    pub async fn cleanup(
        &self,
        types: &[MigrationType],
        options: CleanupOptions,
    ) -> Result<CleanupResult> {
        let mut result = CleanupResult::new(options.dry_run);

        for &migration_type in types {
            let started = Instant::now();
            let _lock = self.ctx.locks.acquire(migration_type)?;

            let mut entry = HistoryEntry::new(OperationKind::Cleanup, migration_type);
            if !options.dry_run {
                self.ctx
                    .history
                    .ensure_no_running(
                        OperationKind::Cleanup,
                        migration_type,
                        self.ctx.stale_run_timeout(),
                    )
                    .await?;
                self.ctx.history.begin(&mut entry).await?;
                result.history_ids.insert(migration_type, entry.id.clone());
            }
            log_run_start!(
                OperationKind::Cleanup,
                migration_type,
                entry.id,
                options.dry_run
            );

            match self
                .clean_type(migration_type, options, &mut entry, &mut result)
                .await
            {
                Ok(counts) => {
                    log_run_complete!(
                        OperationKind::Cleanup,
                        migration_type,
                        counts.status(),
                        counts.deleted,
                        started.elapsed()
                    );
                    result.per_type.insert(migration_type, counts);
                }
                Err(e) => {
                    log_error_with_context!(&e, "Cleanup aborted");
                    if !options.dry_run && entry.status == RunStatus::Running {
                        if let Err(history_err) = self
                            .ctx
                            .history
                            .abort(&mut entry, AbortReason::for_error(&e), e.to_string())
                            .await
                        {
                            log_error_with_context!(&history_err, "Failed to record aborted cleanup");
                        }
                    }
                    return Err(e);
                }
            }
        }

        result.status = overall_status(result.per_type.values().map(CleanupCounts::status));
        Ok(result)
    }

    async fn clean_type(
        &self,
        migration_type: MigrationType,
        options: CleanupOptions,
        entry: &mut HistoryEntry,
        result: &mut CleanupResult,
    ) -> Result<CleanupCounts> {
        let reference = self.ctx.load_reference().await?;
        let validator = self.ctx.validator(reference);
        let store = self.ctx.store.as_ref();

        let mut selection = match migration_type {
            MigrationType::Matches => {
                let matches = self.ctx.retry.run(|| store.list_matches(None)).await?;
                select_matches(&validator, matches)
            }
            MigrationType::Standings => {
                let standings = self.ctx.retry.run(|| store.list_standings(None)).await?;
                select_standings(&validator, standings)
            }
        };

        tracing::info!(
            migration_type = %migration_type,
            orphaned = selection.counts.orphaned,
            duplicates = selection.counts.duplicates,
            empty_references = selection.counts.empty_references,
            skipped = selection.counts.skipped,
            "Cleanup candidates selected"
        );

        let to_delete = selection.matches.len() + selection.standings.len();
        if options.dry_run || to_delete == 0 {
            if !options.dry_run {
                self.finalize(entry, &selection.counts).await?;
            }
            return Ok(selection.counts);
        }

        let snapshot = self
            .ctx
            .backups
            .snapshot(
                migration_type,
                BackupKind::Cleanup,
                BackupPayload {
                    matches: selection.matches.clone(),
                    standings: selection.standings.clone(),
                },
            )
            .await?;
        entry.backup_id = Some(snapshot.id().clone());
        self.ctx.history.checkpoint(entry).await?;
        result.backup_ids.push(snapshot.id().clone());

        for doc in &selection.matches {
            let outcome = self.ctx.retry.run(|| store.delete_match(&doc.id)).await;
            tally(&mut selection.counts, doc.id.as_str(), outcome);
        }
        for doc in &selection.standings {
            let outcome = self.ctx.retry.run(|| store.delete_standings(&doc.id)).await;
            tally(&mut selection.counts, doc.id.as_str(), outcome);
        }
        self.ctx.retry.run(|| store.flush()).await?;

        self.finalize(entry, &selection.counts).await?;
        Ok(selection.counts)
    }

    async fn finalize(&self, entry: &mut HistoryEntry, counts: &CleanupCounts) -> Result<()> {
        entry.counts = RunCounts {
            processed: counts.detected(),
            succeeded: counts.deleted,
            failed: counts.failed,
            skipped: counts.skipped,
        };
        entry.error_count = counts.failed;
        entry.warning_count = counts.skipped;

        let status = counts.status();
        if status == RunStatus::Failed {
            self.ctx
                .history
                .abort(
                    entry,
                    AbortReason::NoRecordSucceeded,
                    format!("none of {} deletion(s) succeeded", counts.failed),
                )
                .await
        } else {
            self.ctx.history.finalize(entry, status).await
        }
    }
}

fn tally(counts: &mut CleanupCounts, record_id: &str, outcome: std::result::Result<bool, StoreError>) {
    match outcome {
        Ok(true) => counts.deleted += 1,
        Ok(false) => tracing::debug!(record_id, "Record already gone"),
        Err(e) => {
            tracing::warn!(record_id, error = %e, "Failed to delete record");
            counts.failed += 1;
        }
    }
}

fn overall_status(statuses: impl Iterator<Item = RunStatus>) -> RunStatus {
    let statuses: Vec<RunStatus> = statuses.collect();
    if statuses.iter().all(|s| *s == RunStatus::Completed) {
        RunStatus::Completed
    } else if statuses.iter().all(|s| *s == RunStatus::Failed) {
        RunStatus::Failed
    } else {
        RunStatus::Partial
    }
}

/// True when `record_id` carries an error issue of a type other than `category`
fn has_unrelated_error(pass: &PassResult, record_id: &str, category: CleanupCategory) -> bool {
    pass.issues_for(record_id)
        .any(|i| i.severity == Severity::Error && i.issue_type != category.issue_type())
}

fn has_issue(pass: &PassResult, record_id: &str, issue_type: IssueType) -> bool {
    pass.issues_for(record_id).any(|i| i.issue_type == issue_type)
}

fn select_matches(validator: &Validator, matches: Vec<MatchDocument>) -> Selection {
    let pass = validator.check_matches(&matches);
    let mut selection = Selection::default();

    for doc in matches {
        let id = doc.id.as_str();
        let category = if has_issue(&pass, id, IssueType::MissingReference) {
            CleanupCategory::EmptyReference
        } else if has_issue(&pass, id, IssueType::OrphanedReference) {
            CleanupCategory::Orphaned
        } else {
            continue;
        };

        selection.counts.record(category);
        if has_unrelated_error(&pass, id, category) {
            tracing::info!(record_id = id, category = %category, "Candidate has unrelated errors, skipping");
            selection.counts.skipped += 1;
            continue;
        }
        selection.matches.push(doc);
    }
    selection
}

fn select_standings(validator: &Validator, standings: Vec<StandingsDocument>) -> Selection {
    let pass = validator.check_standings(&standings);
    let mut selection = Selection::default();

    let redundant: HashSet<String> = duplicate_groups(&standings)
        .into_iter()
        .flat_map(|group| {
            let keep = keeper(&group).map(|k| k.id.as_str().to_string());
            group
                .into_iter()
                .map(|row| row.id.as_str().to_string())
                .filter(move |id| Some(id) != keep.as_ref())
        })
        .collect();

    for doc in standings {
        let id = doc.id.as_str();
        let category = if has_issue(&pass, id, IssueType::OrphanedReference) {
            CleanupCategory::Orphaned
        } else if redundant.contains(id) {
            CleanupCategory::Duplicate
        } else {
            continue;
        };

        selection.counts.record(category);
        if has_unrelated_error(&pass, id, category) {
            tracing::info!(record_id = id, category = %category, "Candidate has unrelated errors, skipping");
            selection.counts.skipped += 1;
            continue;
        }
        selection.standings.push(doc);
    }
    selection
}

/// The row of a duplicate group that survives
fn keeper<'a>(group: &[&'a StandingsDocument]) -> Option<&'a StandingsDocument> {
    group
        .iter()
        .copied()
        .max_by(|a, b| {
            a.club_id
                .is_some()
                .cmp(&b.club_id.is_some())
                .then(a.updated_at.cmp(&b.updated_at))
                .then(b.id.cmp(&a.id))
        })
}
