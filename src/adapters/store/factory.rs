//! Store factory
//!
//! Builds the record store and history storage for the configured target.

use crate::adapters::json::{JsonHistoryStorage, JsonStore};
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::store::traits::{HistoryStorage, RecordStore};
use crate::config::schema::{ClubMigrateConfig, StoreTarget};
use crate::domain::{MigrateError, Result};
use std::sync::Arc;

/// Record store and history storage sharing one backend
pub type StorePair = (
    Arc<dyn RecordStore + Send + Sync>,
    Arc<dyn HistoryStorage + Send + Sync>,
);

/// Create the record store and history storage for `config.store_target`
///
/// The PostgreSQL target reuses one connection pool for both.
///
/// # Errors
///
/// Returns [`MigrateError::Configuration`] if the section for the selected
/// target is missing, or a store error if the backend cannot be opened.
pub async fn create_stores(config: &ClubMigrateConfig) -> Result<StorePair> {
    match config.store_target {
        StoreTarget::Json => {
            let json_config = config.json_store.as_ref().ok_or_else(|| {
                MigrateError::Configuration(
                    "[json_store] section is required when store_target = \"json\"".to_string(),
                )
            })?;

            tracing::info!(path = %json_config.path, "Opening JSON record store");
            let store = JsonStore::open(&json_config.path).await?;
            let history = JsonHistoryStorage::open(&config.history.path).await?;

            Ok((
                Arc::new(store) as Arc<dyn RecordStore + Send + Sync>,
                Arc::new(history) as Arc<dyn HistoryStorage + Send + Sync>,
            ))
        }
        StoreTarget::PostgreSQL => {
            let client = Arc::new(create_postgresql_client(config)?);

            tracing::info!(
                target_db = %client.connection_string_safe(),
                "Creating PostgreSQL record store and history storage"
            );
            let adapter = Arc::new(PostgreSQLAdapter::new_with_arc(client));

            Ok((
                adapter.clone() as Arc<dyn RecordStore + Send + Sync>,
                adapter as Arc<dyn HistoryStorage + Send + Sync>,
            ))
        }
    }
}

/// Build a PostgreSQL client from the `[postgresql]` section
///
/// # Errors
///
/// Returns [`MigrateError::Configuration`] if the section is missing or the
/// connection string is invalid.
pub fn create_postgresql_client(config: &ClubMigrateConfig) -> Result<PostgreSQLClient> {
    let pg_config = config.postgresql.as_ref().ok_or_else(|| {
        MigrateError::Configuration(
            "[postgresql] section is required when store_target = \"postgresql\"".to_string(),
        )
    })?;
    PostgreSQLClient::new(pg_config.clone())
}
