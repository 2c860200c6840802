//! End-to-end tests driving the commands against a file-backed store

mod common;

use clubmigrate::adapters::json::{Dataset, JsonHistoryStorage, JsonStore};
use clubmigrate::adapters::store::HistoryStorage;
use clubmigrate::cli::commands::backups::BackupsArgs;
use clubmigrate::cli::commands::cleanup::CleanupArgs;
use clubmigrate::cli::commands::migrate::MigrateArgs;
use clubmigrate::cli::commands::report::ReportArgs;
use clubmigrate::cli::commands::rollback::RollbackArgs;
use clubmigrate::cli::commands::status::StatusArgs;
use clubmigrate::cli::commands::validate::ValidateArgs;
use clubmigrate::cli::TypeSelection;
use clubmigrate::config::load_config;
use clubmigrate::core::backup::{BackupKind, BackupManager};
use clubmigrate::domain::{MatchRefs, MigrationType};
use common::{team_match, two_club_dataset};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config_path: String,
}

impl Workspace {
    async fn new(dataset: &Dataset) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().display().to_string();
        JsonStore::write_dataset(&dir.path().join("dataset.json"), dataset)
            .await
            .unwrap();

        let config = format!(
            r#"
store_target = "json"

[json_store]
path = "{root}/dataset.json"

[backup]
directory = "{root}/backups"

[history]
path = "{root}/history.jsonl"

[report]
directory = "{root}/reports"

[mapping.team_to_club]
"Nord I" = "SV Nord"
"Sued I" = "FC Sued"
"#
        );
        let config_path = dir.path().join("clubmigrate.toml");
        std::fs::write(&config_path, config).unwrap();

        Self {
            config_path: config_path.display().to_string(),
            dir,
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    async fn dataset(&self) -> Dataset {
        JsonStore::open(self.path("dataset.json"))
            .await
            .unwrap()
            .dataset()
            .await
    }
}

fn migrate(selection: TypeSelection, dry_run: bool) -> MigrateArgs {
    MigrateArgs {
        migration_type: selection,
        dry_run,
        force: false,
        json: false,
    }
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|d| d.filter_map(|e| e.ok()).filter(|e| e.path().is_file()).count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_migrate_persists_records_history_and_snapshots() {
    let ws = Workspace::new(&two_club_dataset()).await;

    let code = migrate(TypeSelection::All, false)
        .execute(&ws.config_path)
        .await
        .unwrap();
    assert_eq!(code, 0);

    let dataset = ws.dataset().await;
    assert!(matches!(dataset.matches[0].refs(), Ok(MatchRefs::Clubs { .. })));
    assert!(dataset.standings.iter().all(|s| s.club_id.is_some()));

    let history = JsonHistoryStorage::open(ws.path("history.jsonl"))
        .await
        .unwrap();
    let entries = history.load_all().await.unwrap();
    // begin, checkpoint and finalize versions for each type
    assert!(entries.len() >= 4);
    assert_eq!(count_files(&ws.path("backups")), 2);
}

#[tokio::test]
async fn test_rollback_command_restores_from_listed_snapshot() {
    let original = two_club_dataset();
    let ws = Workspace::new(&original).await;

    migrate(TypeSelection::Standings, false)
        .execute(&ws.config_path)
        .await
        .unwrap();

    let config = load_config(&ws.config_path).unwrap();
    let snapshots = BackupManager::new(&config.backup).list().await.unwrap();
    let snapshot = snapshots
        .iter()
        .find(|m| m.migration_type == MigrationType::Standings && m.kind == BackupKind::Migration)
        .unwrap();

    let code = RollbackArgs {
        backup_id: snapshot.backup_id.as_str().to_string(),
        force: false,
        json: false,
    }
    .execute(&ws.config_path)
    .await
    .unwrap();
    assert_eq!(code, 0);
    assert_eq!(ws.dataset().await.standings, original.standings);

    let code = BackupsArgs {
        migration_type: Some(MigrationType::Standings),
    }
    .execute(&ws.config_path)
    .await
    .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
async fn test_dry_run_leaves_files_untouched() {
    let ws = Workspace::new(&two_club_dataset()).await;
    let before = std::fs::read(ws.path("dataset.json")).unwrap();

    let code = migrate(TypeSelection::All, true)
        .execute(&ws.config_path)
        .await
        .unwrap();

    assert_eq!(code, 0);
    assert_eq!(std::fs::read(ws.path("dataset.json")).unwrap(), before);
    assert!(!ws.path("history.jsonl").exists());
    assert_eq!(count_files(&ws.path("backups")), 0);
}

#[tokio::test]
async fn test_validate_exit_code_follows_errors() {
    let clean = Workspace::new(&two_club_dataset()).await;
    let args = ValidateArgs {
        json: false,
        league: None,
        config_only: false,
    };
    assert_eq!(args.execute(&clean.config_path).await.unwrap(), 0);

    let mut dataset = two_club_dataset();
    let mut broken = team_match("m2", "t1", "t2");
    broken.home_team_id = None;
    dataset.matches.push(broken);
    let dirty = Workspace::new(&dataset).await;
    assert_eq!(args.execute(&dirty.config_path).await.unwrap(), 1);
}

#[tokio::test]
async fn test_pre_validation_failure_exits_blocked() {
    let mut dataset = two_club_dataset();
    let mut broken = team_match("m2", "t1", "t2");
    broken.away_team_id = None;
    dataset.matches.push(broken);
    let ws = Workspace::new(&dataset).await;

    let code = migrate(TypeSelection::Matches, false)
        .execute(&ws.config_path)
        .await
        .unwrap();
    assert_eq!(code, 3);

    let forced = MigrateArgs {
        force: true,
        ..migrate(TypeSelection::Matches, false)
    };
    assert_eq!(forced.execute(&ws.config_path).await.unwrap(), 1);
}

#[tokio::test]
async fn test_status_cleanup_and_report_succeed() {
    let ws = Workspace::new(&two_club_dataset()).await;
    migrate(TypeSelection::All, false)
        .execute(&ws.config_path)
        .await
        .unwrap();

    assert_eq!(StatusArgs {}.execute(&ws.config_path).await.unwrap(), 0);

    let cleanup = CleanupArgs {
        migration_type: None,
        dry_run: false,
    };
    assert_eq!(cleanup.execute(&ws.config_path).await.unwrap(), 0);

    let report = ReportArgs {
        period: Some(7),
        json: true,
    };
    assert_eq!(report.execute(&ws.config_path).await.unwrap(), 0);
    assert_eq!(count_files(&ws.path("reports")), 1);
}

#[tokio::test]
async fn test_missing_dataset_is_a_connection_error() {
    let ws = Workspace::new(&two_club_dataset()).await;
    std::fs::remove_file(ws.path("dataset.json")).unwrap();

    let code = StatusArgs {}.execute(&ws.config_path).await.unwrap();
    assert_eq!(code, 4);
}

#[tokio::test]
async fn test_missing_config_is_a_config_error() {
    let code = migrate(TypeSelection::All, false)
        .execute("/nonexistent/clubmigrate.toml")
        .await
        .unwrap();
    assert_eq!(code, 2);
}
