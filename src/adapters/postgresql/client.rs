//! PostgreSQL client implementation

use crate::config::schema::PostgreSQLConfig;
use crate::domain::{MigrateError, StoreError};
use deadpool_postgres::{Manager, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use secrecy::ExposeSecret;
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

/// Pooled PostgreSQL client
pub struct PostgreSQLClient {
    pool: Pool,
    config: PostgreSQLConfig,
}

impl PostgreSQLClient {
    /// Create a new PostgreSQL client
    ///
    /// No connection is opened until the first query.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::Configuration`] if the connection string does
    /// not parse or the pool cannot be built.
    pub fn new(config: PostgreSQLConfig) -> Result<Self, MigrateError> {
        let pg_config: tokio_postgres::Config = config
            .connection_string
            .expose_secret()
            .as_ref()
            .parse()
            .map_err(|e| {
                MigrateError::Configuration(format!("Invalid PostgreSQL connection string: {e}"))
            })?;

        let manager = Manager::from_config(
            pg_config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let timeout = Duration::from_secs(config.connection_timeout_seconds);

        let pool = Pool::builder(manager)
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .wait_timeout(Some(timeout))
            .create_timeout(Some(timeout))
            .recycle_timeout(Some(timeout))
            .build()
            .map_err(|e| {
                MigrateError::Configuration(format!("Failed to create connection pool: {e}"))
            })?;

        Ok(Self { pool, config })
    }

    /// Attempts to get a connection from the pool and execute a simple query
    pub async fn test_connection(&self) -> Result<(), StoreError> {
        let client = self.get_connection().await?;
        client
            .query_one("SELECT 1", &[])
            .await
            .map_err(|e| map_pg_error("Connection test failed", e))?;

        tracing::info!(
            target_db = %self.connection_string_safe(),
            "PostgreSQL connection test successful"
        );
        Ok(())
    }

    /// Create tables and indexes if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.get_connection().await?;
        let migration_sql = include_str!("../../../migrations/001_initial_schema.sql");
        client
            .batch_execute(migration_sql)
            .await
            .map_err(|e| map_pg_error("Failed to execute schema migration", e))?;

        tracing::info!("PostgreSQL schema initialized");
        Ok(())
    }

    async fn get_connection(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool.get().await.map_err(|e| match e {
            PoolError::Timeout(_) => {
                StoreError::Timeout(format!("Timed out waiting for a pooled connection: {e}"))
            }
            other => StoreError::ConnectionFailed(format!(
                "Failed to get connection from pool: {other}"
            )),
        })
    }

    async fn with_timeout(&self) -> Result<deadpool_postgres::Object, StoreError> {
        let client = self.get_connection().await?;
        let timeout_query = format!(
            "SET statement_timeout = {}",
            self.config.statement_timeout_seconds * 1000
        );
        client
            .execute(&timeout_query, &[])
            .await
            .map_err(|e| map_pg_error("Failed to set statement timeout", e))?;
        Ok(client)
    }

    /// Execute a query and return rows
    pub async fn query(
        &self,
        query: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<Vec<Row>, StoreError> {
        let client = self.with_timeout().await?;
        client
            .query(query, params)
            .await
            .map_err(|e| map_pg_error("Query failed", e))
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(
        &self,
        statement: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> Result<u64, StoreError> {
        let client = self.with_timeout().await?;
        client.execute(statement, params).await.map_err(|e| {
            let mapped = map_pg_error("Statement failed", e);
            match mapped {
                StoreError::QueryFailed(msg) => StoreError::WriteFailed(msg),
                other => other,
            }
        })
    }

    /// Connection string with credentials removed
    pub fn connection_string_safe(&self) -> String {
        redact_connection_string(self.config.connection_string.expose_secret().as_ref())
    }

    pub fn pool_status(&self) -> deadpool_postgres::Status {
        self.pool.status()
    }
}

fn redact_connection_string(conn: &str) -> String {
    conn.rsplit_once('@')
        .map(|(_, host)| format!("postgresql://***@{host}"))
        .unwrap_or_else(|| "postgresql://***".to_string())
}

/// Translate a driver error into a [`StoreError`]
pub(crate) fn map_pg_error(context: &str, err: tokio_postgres::Error) -> StoreError {
    if err.is_closed() {
        return StoreError::ConnectionFailed(format!("{context}: {err}"));
    }
    match err.code() {
        Some(code) if *code == SqlState::QUERY_CANCELED => {
            StoreError::Timeout(format!("{context}: {err}"))
        }
        Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
            StoreError::Conflict(format!("{context}: {err}"))
        }
        Some(code) if *code == SqlState::ADMIN_SHUTDOWN || *code == SqlState::CANNOT_CONNECT_NOW => {
            StoreError::ConnectionFailed(format!("{context}: {err}"))
        }
        Some(_) => StoreError::QueryFailed(format!("{context}: {err}")),
        // no SQLSTATE means the failure happened below the protocol
        None => StoreError::ConnectionFailed(format!("{context}: {err}")),
    }
}
