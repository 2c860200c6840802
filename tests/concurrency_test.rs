//! Runs started from separate contexts over one history file and snapshot
//! directory, the way two processes would share them

mod common;

use clubmigrate::adapters::json::{JsonHistoryStorage, JsonStore};
use clubmigrate::core::cleanup::{CleanupEngine, CleanupOptions};
use clubmigrate::core::context::RunContext;
use clubmigrate::core::history::{HistoryEntry, OperationKind, RunStatus};
use clubmigrate::core::migration::{MigrationOrchestrator, RunOptions};
use clubmigrate::core::rollback::{RollbackExecutor, RollbackOptions};
use clubmigrate::domain::{MigrateError, MigrationType};
use common::{config_in, two_club_dataset, TWO_CLUB_RULES};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

async fn context(dir: &Path, store: Arc<JsonStore>) -> RunContext {
    let config = config_in(dir, TWO_CLUB_RULES);
    let history = JsonHistoryStorage::open(&config.history.path).await.unwrap();
    RunContext::new(&config, store, Arc::new(history))
}

fn already_running(err: &MigrateError) -> bool {
    matches!(err, MigrateError::AlreadyRunning(MigrationType::Matches))
}

#[tokio::test]
async fn test_held_type_lock_blocks_other_context() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::in_memory(two_club_dataset()));
    let first = context(dir.path(), store.clone()).await;
    let second = context(dir.path(), store).await;

    let guard = first.locks.acquire(MigrationType::Matches).unwrap();

    let err = MigrationOrchestrator::new(second.clone())
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap_err();
    assert!(already_running(&err));

    let err = CleanupEngine::new(second.clone())
        .cleanup(&[MigrationType::Matches], CleanupOptions::default())
        .await
        .unwrap_err();
    assert!(already_running(&err));

    // the other type is free
    MigrationOrchestrator::new(second.clone())
        .run(MigrationType::Standings, RunOptions::default())
        .await
        .unwrap();

    drop(guard);
    let result = MigrationOrchestrator::new(second)
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap();
    assert_eq!(result.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_running_entry_of_other_context_blocks_every_operation() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(JsonStore::in_memory(two_club_dataset()));
    let first = context(dir.path(), store.clone()).await;
    let second = context(dir.path(), store).await;

    let migrated = MigrationOrchestrator::new(first.clone())
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap();
    let backup_id = migrated.backup_id.unwrap();

    // a run in progress elsewhere, recorded through the shared file
    let mut cleanup = HistoryEntry::new(OperationKind::Cleanup, MigrationType::Matches);
    first.history.begin(&mut cleanup).await.unwrap();

    let err = MigrationOrchestrator::new(second.clone())
        .run(MigrationType::Matches, RunOptions::default())
        .await
        .unwrap_err();
    assert!(already_running(&err));

    let err = RollbackExecutor::new(second.clone())
        .rollback(backup_id.as_str(), RollbackOptions::default())
        .await
        .unwrap_err();
    assert!(already_running(&err));

    let err = CleanupEngine::new(second.clone())
        .cleanup(&[MigrationType::Matches], CleanupOptions::default())
        .await
        .unwrap_err();
    assert!(already_running(&err));

    first
        .history
        .finalize(&mut cleanup, RunStatus::Completed)
        .await
        .unwrap();
    let rolled_back = RollbackExecutor::new(second)
        .rollback(backup_id.as_str(), RollbackOptions::default())
        .await
        .unwrap();
    assert_eq!(rolled_back.status, RunStatus::Completed);
}
