//! Integration tests for rollback and stale-run recovery

mod common;

use chrono::{Duration, Utc};
use clubmigrate::adapters::json::Dataset;
use clubmigrate::adapters::store::RecordStore;
use clubmigrate::core::backup::{BackupKind, BackupManager, BackupPayload, RestoreStatus};
use clubmigrate::core::history::{AbortReason, HistoryEntry, OperationKind, RunStatus};
use clubmigrate::core::migration::{MigrationOrchestrator, RunOptions};
use clubmigrate::core::rollback::{RollbackExecutor, RollbackOptions};
use clubmigrate::domain::{MatchRefs, MigrateError, MigrationType};
use common::{team_match, two_club_dataset, Harness, TWO_CLUB_RULES};
use fake::Fake;

fn ten_match_dataset() -> Dataset {
    let mut dataset = two_club_dataset();
    dataset.matches = (0..10)
        .map(|i| team_match(&format!("m{i:02}"), "t1", "t2"))
        .collect();
    dataset
}

#[tokio::test]
async fn test_rollback_skips_records_modified_after_snapshot() {
    let harness = Harness::new(ten_match_dataset(), TWO_CLUB_RULES);
    let orchestrator = MigrationOrchestrator::new(harness.ctx.clone());

    let run = orchestrator
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(run.migrated, 10);
    let backup_id = run.backup_id.unwrap();

    // results entered for three fixtures after the migration
    for id in ["m01", "m04", "m07"] {
        let mut doc = harness.match_doc(id).await;
        doc.home_score = Some((0..6u32).fake());
        doc.away_score = Some((0..6u32).fake());
        doc.updated_at = Utc::now();
        harness.store.put_match(&doc).await.unwrap();
    }
    harness.store.flush().await.unwrap();

    let executor = RollbackExecutor::new(harness.ctx.clone());
    let result = executor
        .rollback(backup_id.as_str(), RollbackOptions::default())
        .await
        .unwrap();

    assert_eq!(result.restored, 7);
    assert_eq!(result.skipped, 3);
    assert_eq!(result.errors, 0);
    assert_eq!(result.status, RunStatus::Partial);
    assert!(result.pre_rollback_backup_id.is_some());

    let mut skipped: Vec<&str> = result
        .outcomes
        .iter()
        .filter(|o| o.status == RestoreStatus::SkippedDependentModified)
        .map(|o| o.record_id.as_str())
        .collect();
    skipped.sort_unstable();
    assert_eq!(skipped, vec!["m01", "m04", "m07"]);

    assert!(matches!(
        harness.match_doc("m00").await.refs(),
        Ok(MatchRefs::Teams { .. })
    ));
    let modified = harness.match_doc("m04").await;
    assert!(matches!(modified.refs(), Ok(MatchRefs::Clubs { .. })));
    assert!(modified.home_score.is_some());
}

#[tokio::test]
async fn test_rollback_restores_everything_when_untouched() {
    let harness = Harness::new(two_club_dataset(), TWO_CLUB_RULES);
    let original = harness.dataset().await;
    let orchestrator = MigrationOrchestrator::new(harness.ctx.clone());

    let run = orchestrator
        .run(MigrationType::Standings, RunOptions::default())
        .await
        .unwrap();
    let backup_id = run.backup_id.unwrap();

    let result = RollbackExecutor::new(harness.ctx.clone())
        .rollback(backup_id.as_str(), RollbackOptions::default())
        .await
        .unwrap();

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.restored, 2);
    assert_eq!(harness.dataset().await.standings, original.standings);

    let entries = harness.ctx.history.entries().await.unwrap();
    let rollback = entries
        .iter()
        .find(|e| e.operation == OperationKind::Rollback)
        .unwrap();
    assert_eq!(rollback.status, RunStatus::Completed);
    assert_eq!(rollback.backup_id.as_ref(), Some(&backup_id));
}

#[tokio::test]
async fn test_unknown_backup_is_rejected_without_history() {
    let harness = Harness::new(two_club_dataset(), TWO_CLUB_RULES);

    let err = RollbackExecutor::new(harness.ctx.clone())
        .rollback("matches-migration-20200101T000000000Z", RollbackOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, MigrateError::BackupNotFound(_)));
    assert!(harness.ctx.history.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_incompatible_version_needs_force() {
    let harness = Harness::new(two_club_dataset(), TWO_CLUB_RULES);
    let future = BackupManager::with_directory(harness.ctx.backups.directory(), "2.0");
    let snapshot = future
        .snapshot(
            MigrationType::Matches,
            BackupKind::Migration,
            BackupPayload::matches(harness.dataset().await.matches),
        )
        .await
        .unwrap();

    let executor = RollbackExecutor::new(harness.ctx.clone());
    let err = executor
        .rollback(snapshot.id().as_str(), RollbackOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MigrateError::VersionIncompatible { .. }));

    let entries = harness.ctx.history.entries().await.unwrap();
    assert_eq!(entries[0].abort_reason, Some(AbortReason::VersionIncompatible));

    let forced = executor
        .rollback(snapshot.id().as_str(), RollbackOptions { force: true })
        .await
        .unwrap();
    assert_eq!(forced.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_stale_run_blocks_until_rolled_back() {
    let harness = Harness::new(two_club_dataset(), TWO_CLUB_RULES);
    let orchestrator = MigrationOrchestrator::new(harness.ctx.clone());

    let first = orchestrator
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap();
    let backup_id = first.backup_id.unwrap();

    // a crashed run that never finalized
    let mut crashed = HistoryEntry::new(OperationKind::Migrate, MigrationType::Matches);
    crashed.started_at = Utc::now() - Duration::hours(6);
    harness.ctx.history.begin(&mut crashed).await.unwrap();

    let err = orchestrator
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap_err();
    match &err {
        MigrateError::StaleRun { last_backup, .. } => {
            assert_eq!(last_backup.as_deref(), Some(backup_id.as_str()));
        }
        other => panic!("expected stale run, got {other:?}"),
    }
    assert!(err.is_blocked());

    // standings are not affected by a stale matches run
    orchestrator
        .run(MigrationType::Standings, RunOptions::default())
        .await
        .unwrap();

    RollbackExecutor::new(harness.ctx.clone())
        .rollback(backup_id.as_str(), RollbackOptions::default())
        .await
        .unwrap();

    let closed = harness
        .ctx
        .history
        .entries()
        .await
        .unwrap()
        .into_iter()
        .find(|e| e.id == crashed.id)
        .unwrap();
    assert_eq!(closed.status, RunStatus::Failed);
    assert_eq!(closed.abort_reason, Some(AbortReason::SupersededByRollback));

    let rerun = orchestrator
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(rerun.status, RunStatus::Completed);
    assert_eq!(rerun.migrated, 1);
}
