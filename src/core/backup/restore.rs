//! Restoring records from a snapshot

use crate::adapters::store::RecordStore;
use crate::core::backup::manager::BackupManager;
use crate::core::backup::snapshot::{BackupKind, BackupPayload, BackupSnapshot};
use crate::core::migration::retry::RetryPolicy;
use crate::domain::ids::BackupId;
use crate::domain::records::{MatchDocument, StandingsDocument};
use crate::domain::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened to one snapshotted record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestoreStatus {
    Restored,
    SkippedDependentModified,
    StatisticsRecomputed,
    Error,
}

impl RestoreStatus {
    /// Skipped records need a human to reconcile them
    pub fn needs_reconciliation(&self) -> bool {
        matches!(
            self,
            Self::SkippedDependentModified | Self::StatisticsRecomputed
        )
    }
}

impl fmt::Display for RestoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Restored => "restored",
            Self::SkippedDependentModified => "skipped-dependent-modified",
            Self::StatisticsRecomputed => "statistics-recomputed",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub record_id: String,
    pub status: RestoreStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RestoreOutcome {
    fn new(record_id: impl Into<String>, status: RestoreStatus) -> Self {
        Self {
            record_id: record_id.into(),
            status,
            message: None,
        }
    }

    fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Per-record outcomes of a restore
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub pre_rollback_backup_id: Option<BackupId>,
    pub outcomes: Vec<RestoreOutcome>,
}

impl RestoreReport {
    pub fn count(&self, status: RestoreStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn restored(&self) -> usize {
        self.count(RestoreStatus::Restored)
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status.needs_reconciliation())
            .count()
    }

    pub fn errors(&self) -> usize {
        self.count(RestoreStatus::Error)
    }

    /// Ids of records left for manual reconciliation
    pub fn manual_reconciliation(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| o.status.needs_reconciliation())
            .map(|o| o.record_id.clone())
            .collect()
    }
}

/// Options for [`BackupManager::restore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RestoreOptions {
    /// Overwrite records changed after the snapshot
    pub force: bool,
}

impl BackupManager {
    /// Write a snapshot's records back to the store
    ///
    /// The current state of every snapshotted record is read and saved as a
    /// pre-rollback snapshot first. Each record is then written back as a
    /// full document unless it was modified after the snapshot by something
    /// other than a migration, or (standings only) its statistics changed.
    /// `options.force` writes those too. Records missing from the store are
    /// re-created.
    ///
    /// # Errors
    ///
    /// Fails before any write if the current state cannot be read or the
    /// pre-rollback snapshot cannot be saved. Per-record write failures are
    /// reported as [`RestoreStatus::Error`] outcomes.
    pub async fn restore(
        &self,
        store: &(dyn RecordStore + Send + Sync),
        snapshot: &BackupSnapshot,
        options: RestoreOptions,
        retry: &RetryPolicy,
    ) -> Result<RestoreReport> {
        let since = snapshot.metadata.timestamp;
        let migration_type = snapshot.migration_type();

        let current_matches = read_current_matches(store, &snapshot.data.matches, retry).await?;
        let current_standings =
            read_current_standings(store, &snapshot.data.standings, retry).await?;

        let pre_rollback = self
            .snapshot(
                migration_type,
                BackupKind::PreRollback,
                BackupPayload {
                    matches: current_matches.iter().flatten().cloned().collect(),
                    standings: current_standings.iter().flatten().cloned().collect(),
                },
            )
            .await?;

        let mut report = RestoreReport {
            pre_rollback_backup_id: Some(pre_rollback.id().clone()),
            outcomes: Vec::with_capacity(snapshot.data.len()),
        };

        for (saved, current) in snapshot.data.matches.iter().zip(&current_matches) {
            let outcome = match current {
                Some(cur) if !options.force && cur.modified_externally_since(since) => {
                    RestoreOutcome::new(saved.id.as_str(), RestoreStatus::SkippedDependentModified)
                        .with_message(format!("updated at {} after snapshot", cur.updated_at))
                }
                Some(cur) if cur == saved => {
                    RestoreOutcome::new(saved.id.as_str(), RestoreStatus::Restored)
                }
                _ => write_outcome(
                    saved.id.as_str(),
                    retry.run(|| store.put_match(saved)).await,
                ),
            };
            report.outcomes.push(outcome);
        }

        for (saved, current) in snapshot.data.standings.iter().zip(&current_standings) {
            let outcome = match current {
                Some(cur) if !options.force && cur.stats != saved.stats => {
                    RestoreOutcome::new(saved.id.as_str(), RestoreStatus::StatisticsRecomputed)
                        .with_message("statistics changed since the snapshot")
                }
                Some(cur) if !options.force && cur.modified_externally_since(since) => {
                    RestoreOutcome::new(saved.id.as_str(), RestoreStatus::SkippedDependentModified)
                        .with_message(format!("updated at {} after snapshot", cur.updated_at))
                }
                Some(cur) if cur == saved => {
                    RestoreOutcome::new(saved.id.as_str(), RestoreStatus::Restored)
                }
                _ => write_outcome(
                    saved.id.as_str(),
                    retry.run(|| store.put_standings(saved)).await,
                ),
            };
            report.outcomes.push(outcome);
        }

        retry.run(|| store.flush()).await?;

        for outcome in report.outcomes.iter().filter(|o| o.status != RestoreStatus::Restored) {
            tracing::warn!(
                record_id = %outcome.record_id,
                status = %outcome.status,
                message = outcome.message.as_deref().unwrap_or(""),
                "Record not restored"
            );
        }
        tracing::info!(
            backup_id = %snapshot.id(),
            restored = report.restored(),
            skipped = report.skipped(),
            errors = report.errors(),
            "Restore finished"
        );
        Ok(report)
    }
}

fn write_outcome(
    record_id: &str,
    result: std::result::Result<(), crate::domain::StoreError>,
) -> RestoreOutcome {
    match result {
        Ok(()) => RestoreOutcome::new(record_id, RestoreStatus::Restored),
        Err(e) => RestoreOutcome::new(record_id, RestoreStatus::Error).with_message(e.to_string()),
    }
}

async fn read_current_matches(
    store: &(dyn RecordStore + Send + Sync),
    saved: &[MatchDocument],
    retry: &RetryPolicy,
) -> Result<Vec<Option<MatchDocument>>> {
    let mut current = Vec::with_capacity(saved.len());
    for doc in saved {
        let found = retry
            .run(|| store.get_match(&doc.id))
            .await
            .map_err(|e| BackupError::ReadFailed(format!("match {}: {e}", doc.id)))?;
        current.push(found);
    }
    Ok(current)
}

async fn read_current_standings(
    store: &(dyn RecordStore + Send + Sync),
    saved: &[StandingsDocument],
    retry: &RetryPolicy,
) -> Result<Vec<Option<StandingsDocument>>> {
    let mut current = Vec::with_capacity(saved.len());
    for doc in saved {
        let found = retry
            .run(|| store.get_standings(&doc.id))
            .await
            .map_err(|e| BackupError::ReadFailed(format!("standings {}: {e}", doc.id)))?;
        current.push(found);
    }
    Ok(current)
}
