//! Migration orchestrator - drives one run of one record type
//!
//! A run goes through the same steps for matches and standings:
//! 1. Take the type lock and check the history for a crashed run
//! 2. Pre-validate (error issues abort unless forced)
//! 3. Snapshot every record that still needs migration
//! 4. Resolve, diff and write each candidate on a bounded worker pool
//! 5. Post-validate, derive the terminal status and finalize history
//!
//! Dry runs stop after computing the diffs and never touch history, the
//! snapshot directory or the store.

use crate::adapters::store::{RecordStore, StoreResult};
use crate::core::backup::{BackupKind, BackupPayload};
use crate::core::context::RunContext;
use crate::core::history::{AbortReason, HistoryEntry, OperationKind, RunCounts, RunStatus};
use crate::core::mapping::{MappingResolver, ReferenceData};
use crate::core::migration::summary::{RecordFailure, RunResult};
use crate::core::migration::transform::{migrate_match, migrate_standings, RecordDiff};
use crate::core::validation::{ValidationReport, ValidationScope};
use crate::domain::records::{MatchDocument, MigrationType, StandingsDocument};
use crate::domain::{MappingError, MatchRefs, MigrateError, Result};
use crate::{log_error_with_context, log_run_complete, log_run_start};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Instant;

/// Options for one migration run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Compute diffs without writing anything
    pub dry_run: bool,
    /// Proceed despite pre-validation errors
    pub force: bool,
}

/// A record that still needs migration
#[derive(Debug, Clone)]
enum Candidate {
    Match(MatchDocument),
    Standings(StandingsDocument),
}

impl Candidate {
    fn id(&self) -> &str {
        match self {
            Self::Match(doc) => doc.id.as_str(),
            Self::Standings(doc) => doc.id.as_str(),
        }
    }

    fn migrate(
        &self,
        resolver: &MappingResolver,
        at: DateTime<Utc>,
    ) -> std::result::Result<Candidate, MappingError> {
        match self {
            Self::Match(doc) => migrate_match(doc, resolver, at).map(Self::Match),
            Self::Standings(doc) => migrate_standings(doc, resolver, at).map(Self::Standings),
        }
    }

    fn diff(&self, migrated: &Candidate) -> Result<RecordDiff> {
        match (self, migrated) {
            (Self::Match(before), Self::Match(after)) => {
                RecordDiff::between(before.id.as_str(), before, after)
            }
            (Self::Standings(before), Self::Standings(after)) => {
                RecordDiff::between(before.id.as_str(), before, after)
            }
            _ => Err(MigrateError::Serialization(format!(
                "record {} changed type during migration",
                self.id()
            ))),
        }
    }

    async fn put(&self, store: &(dyn RecordStore + Send + Sync)) -> StoreResult<()> {
        match self {
            Self::Match(doc) => store.put_match(doc).await,
            Self::Standings(doc) => store.put_standings(doc).await,
        }
    }
}

/// Outcome of one candidate
enum RecordOutcome {
    Migrated(RecordDiff),
    Failed(RecordFailure),
}

/// Records of one type split by whether they need work
struct Workload {
    total: usize,
    unchanged: usize,
    candidates: Vec<Candidate>,
}

impl Workload {
    fn payload(&self) -> BackupPayload {
        let mut payload = BackupPayload::default();
        for candidate in &self.candidates {
            match candidate {
                Candidate::Match(doc) => payload.matches.push(doc.clone()),
                Candidate::Standings(doc) => payload.standings.push(doc.clone()),
            }
        }
        payload
    }
}

/// Runs migrations of one type at a time per type
pub struct MigrationOrchestrator {
    ctx: RunContext,
}

impl MigrationOrchestrator {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Migrate every record of `migration_type` that is still team-keyed
    ///
    /// # Errors
    ///
    /// - [`MigrateError::AlreadyRunning`] if the type lock is held or a
    ///   recent run is still marked running
    /// - [`MigrateError::StaleRun`] if a crashed run must be rolled back first
    /// - [`MigrateError::PreValidationFailed`] if pre-validation reports
    ///   errors and `options.force` is not set
    /// - [`MigrateError::Backup`] if the snapshot cannot be written
    ///
    /// Record-level failures never surface here; they are counted in the
    /// returned [`RunResult`].
    pub async fn run(&self, migration_type: MigrationType, options: RunOptions) -> Result<RunResult> {
        let started = Instant::now();
        let _lock = self.ctx.locks.acquire(migration_type)?;

        let mut entry = HistoryEntry::new(OperationKind::Migrate, migration_type);
        if !options.dry_run {
            self.ctx
                .history
                .ensure_no_running(
                    OperationKind::Migrate,
                    migration_type,
                    self.ctx.stale_run_timeout(),
                )
                .await?;
            self.ctx.history.begin(&mut entry).await?;
        }

        log_run_start!(
            OperationKind::Migrate,
            migration_type,
            entry.id,
            options.dry_run
        );

        match self.execute(migration_type, options, &mut entry, started).await {
            Ok(result) => {
                log_run_complete!(
                    OperationKind::Migrate,
                    migration_type,
                    result.status,
                    result.processed,
                    result.duration
                );
                result.log_summary();
                Ok(result)
            }
            Err(e) => {
                log_error_with_context!(&e, "Migration run aborted");
                if !options.dry_run && entry.status == RunStatus::Running {
                    if let Err(history_err) = self
                        .ctx
                        .history
                        .abort(&mut entry, AbortReason::for_error(&e), e.to_string())
                        .await
                    {
                        log_error_with_context!(&history_err, "Failed to record aborted run");
                    }
                }
                Err(e)
            }
        }
    }

    /// Migrate both types, matches first
    ///
    /// Stops at the first type that aborts.
    pub async fn run_all(&self, options: RunOptions) -> Result<Vec<RunResult>> {
        let mut results = Vec::with_capacity(MigrationType::ALL.len());
        for migration_type in MigrationType::ALL {
            results.push(self.run(migration_type, options).await?);
        }
        Ok(results)
    }

    async fn execute(
        &self,
        migration_type: MigrationType,
        options: RunOptions,
        entry: &mut HistoryEntry,
        started: Instant,
    ) -> Result<RunResult> {
        let reference = self.ctx.load_reference().await?;
        let validator = self.ctx.validator(reference.clone());
        let resolver = self.ctx.resolver(reference.clone());

        let pre_validation = validator
            .validate_type(migration_type, &ValidationScope::all())
            .await?;
        if pre_validation.has_errors() {
            if !options.force {
                return Err(MigrateError::PreValidationFailed {
                    errors: pre_validation.errors,
                });
            }
            tracing::warn!(
                migration_type = %migration_type,
                errors = pre_validation.errors,
                "Pre-validation reported errors, continuing because of --force"
            );
        }

        let workload = self.load_workload(migration_type, &reference).await?;
        tracing::info!(
            migration_type = %migration_type,
            total = workload.total,
            candidates = workload.candidates.len(),
            unchanged = workload.unchanged,
            "Migration workload determined"
        );

        let backup_id = if options.dry_run || workload.candidates.is_empty() {
            None
        } else {
            let snapshot = self
                .ctx
                .backups
                .snapshot(migration_type, BackupKind::Migration, workload.payload())
                .await?;
            entry.backup_id = Some(snapshot.id().clone());
            self.ctx.history.checkpoint(entry).await?;
            Some(snapshot.id().clone())
        };

        let run_at = Utc::now();
        let mut diffs = Vec::new();
        let mut failures = Vec::new();
        let batch_size = self.ctx.migration.batch_size.max(1);
        let concurrency = self.ctx.migration.concurrency.max(1);

        for chunk in workload.candidates.chunks(batch_size) {
            let outcomes: Vec<RecordOutcome> = stream::iter(chunk)
                .map(|candidate| self.process(candidate, &resolver, run_at, options.dry_run))
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for outcome in outcomes {
                match outcome {
                    RecordOutcome::Migrated(diff) => diffs.push(diff),
                    RecordOutcome::Failed(failure) => failures.push(failure),
                }
            }

            if !options.dry_run {
                self.ctx.store.flush().await?;
            }
        }

        let migrated = diffs.len();
        let skipped = failures.iter().filter(|f| f.is_skip()).count();
        let failed = failures.len() - skipped;

        let post_validation = if options.dry_run {
            None
        } else {
            Some(
                validator
                    .validate_type(migration_type, &ValidationScope::all())
                    .await?,
            )
        };
        let post_errors = post_validation.as_ref().map_or(0, |r| r.errors);

        let status =
            RunStatus::from_outcomes(migrated + workload.unchanged, failed + skipped, post_errors);

        if !options.dry_run {
            self.finalize(
                entry,
                status,
                RunCounts {
                    processed: workload.total,
                    succeeded: migrated + workload.unchanged,
                    failed,
                    skipped,
                },
                post_validation.as_ref().unwrap_or(&pre_validation),
            )
            .await?;
        }

        diffs.sort_by(|a, b| a.record_id.cmp(&b.record_id));
        failures.sort_by(|a, b| a.record_id.cmp(&b.record_id));

        Ok(RunResult {
            run_id: entry.id.clone(),
            migration_type,
            status,
            dry_run: options.dry_run,
            backup_id,
            processed: workload.total,
            migrated,
            unchanged: workload.unchanged,
            failed,
            skipped,
            pre_validation: Some(pre_validation),
            post_validation,
            failures,
            diffs: if options.dry_run { diffs } else { Vec::new() },
            duration: started.elapsed(),
        })
    }

    async fn load_workload(
        &self,
        migration_type: MigrationType,
        reference: &ReferenceData,
    ) -> Result<Workload> {
        let store = self.ctx.store.as_ref();
        let workload = match migration_type {
            MigrationType::Matches => {
                let matches = self.ctx.retry.run(|| store.list_matches(None)).await?;
                let total = matches.len();
                let candidates: Vec<Candidate> = matches
                    .into_iter()
                    .filter(|m| !matches!(m.refs(), Ok(MatchRefs::Clubs { .. })))
                    .map(Candidate::Match)
                    .collect();
                Workload {
                    total,
                    unchanged: total - candidates.len(),
                    candidates,
                }
            }
            MigrationType::Standings => {
                let standings = self.ctx.retry.run(|| store.list_standings(None)).await?;
                let total = standings.len();
                let candidates: Vec<Candidate> = standings
                    .into_iter()
                    .filter(|s| s.needs_migration() || name_out_of_sync(s, reference))
                    .map(Candidate::Standings)
                    .collect();
                Workload {
                    total,
                    unchanged: total - candidates.len(),
                    candidates,
                }
            }
        };
        Ok(workload)
    }

    async fn process(
        &self,
        candidate: &Candidate,
        resolver: &MappingResolver,
        at: DateTime<Utc>,
        dry_run: bool,
    ) -> RecordOutcome {
        let record_id = candidate.id();

        let migrated = match candidate.migrate(resolver, at) {
            Ok(migrated) => migrated,
            Err(e) => {
                tracing::debug!(record_id, error = %e, "Record cannot be mapped");
                return RecordOutcome::Failed(RecordFailure::mapping(record_id, &e));
            }
        };

        let diff = match candidate.diff(&migrated) {
            Ok(diff) => diff,
            Err(e) => return RecordOutcome::Failed(RecordFailure::persistence(record_id, &e)),
        };

        if dry_run {
            return RecordOutcome::Migrated(diff);
        }

        let store = self.ctx.store.as_ref();
        match self.ctx.retry.run(|| migrated.put(store)).await {
            Ok(()) => RecordOutcome::Migrated(diff),
            Err(e) => {
                tracing::warn!(record_id, error = %e, "Failed to write migrated record");
                RecordOutcome::Failed(RecordFailure::persistence(record_id, &e))
            }
        }
    }

    async fn finalize(
        &self,
        entry: &mut HistoryEntry,
        status: RunStatus,
        counts: RunCounts,
        report: &ValidationReport,
    ) -> Result<()> {
        entry.counts = counts;
        entry.error_count = report.errors;
        entry.warning_count = report.warnings;

        if status == RunStatus::Failed {
            self.ctx
                .history
                .abort(
                    entry,
                    AbortReason::NoRecordSucceeded,
                    format!("none of {} record(s) could be migrated", counts.processed),
                )
                .await
        } else {
            self.ctx.history.finalize(entry, status).await
        }
    }
}

/// A club-keyed row whose display name no longer matches its club
fn name_out_of_sync(row: &StandingsDocument, reference: &ReferenceData) -> bool {
    row.club_id
        .as_ref()
        .and_then(|id| reference.club(id))
        .is_some_and(|club| club.name != row.display_name)
}
