//! Services shared by the entry points

use crate::adapters::store::{create_stores, HistoryStorage, RecordStore};
use crate::config::schema::{ClubMigrateConfig, MigrationConfig, ReportConfig};
use crate::core::backup::BackupManager;
use crate::core::history::HistoryLog;
use crate::core::mapping::{MappingResolver, MappingTable, ReferenceData};
use crate::core::migration::lock::LockTable;
use crate::core::migration::retry::RetryPolicy;
use crate::core::validation::Validator;
use crate::domain::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Lock files live here, under the snapshot directory
pub const LOCK_DIRECTORY: &str = ".locks";

/// Store, history, snapshots, mapping and locks for one process
///
/// Cheap to clone. The lock table is shared by every clone and backed by
/// lock files in the snapshot directory, so migrate, rollback and cleanup
/// exclude each other per type across contexts and processes.
#[derive(Clone)]
pub struct RunContext {
    pub store: Arc<dyn RecordStore + Send + Sync>,
    pub history: Arc<HistoryLog>,
    pub backups: Arc<BackupManager>,
    pub table: Arc<MappingTable>,
    pub locks: LockTable,
    pub retry: RetryPolicy,
    pub migration: MigrationConfig,
    pub report: ReportConfig,
}

impl RunContext {
    /// Open the configured store and build the context
    pub async fn from_config(config: &ClubMigrateConfig) -> Result<Self> {
        let (store, history) = create_stores(config).await?;
        Ok(Self::new(config, store, history))
    }

    pub fn new(
        config: &ClubMigrateConfig,
        store: Arc<dyn RecordStore + Send + Sync>,
        history: Arc<dyn HistoryStorage + Send + Sync>,
    ) -> Self {
        Self {
            store,
            history: Arc::new(HistoryLog::new(history)),
            backups: Arc::new(BackupManager::new(&config.backup)),
            table: Arc::new(MappingTable::from_config(&config.mapping)),
            locks: LockTable::with_directory(
                Path::new(&config.backup.directory).join(LOCK_DIRECTORY),
                stale_lock_age(&config.migration),
            ),
            retry: RetryPolicy::from_config(&config.migration.retry),
            migration: config.migration.clone(),
            report: config.report.clone(),
        }
    }

    /// Read reference data for one run
    pub async fn load_reference(&self) -> Result<Arc<ReferenceData>> {
        let store = Arc::clone(&self.store);
        let reference = self
            .retry
            .run(|| ReferenceData::load(store.as_ref()))
            .await?;
        Ok(Arc::new(reference))
    }

    pub fn validator(&self, reference: Arc<ReferenceData>) -> Validator {
        Validator::new(Arc::clone(&self.store), reference, Arc::clone(&self.table))
            .with_retry(self.retry.clone())
    }

    pub fn resolver(&self, reference: Arc<ReferenceData>) -> MappingResolver {
        MappingResolver::new(Arc::clone(&self.table), reference)
    }

    pub fn stale_run_timeout(&self) -> chrono::Duration {
        let secs = i64::try_from(self.migration.stale_run_timeout_secs).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or(chrono::Duration::MAX)
    }
}

fn stale_lock_age(migration: &MigrationConfig) -> Duration {
    Duration::from_secs(migration.stale_run_timeout_secs)
}
