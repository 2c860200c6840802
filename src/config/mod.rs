//! Configuration management for clubmigrate.
//!
//! Configuration lives in a TOML file with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - `CLUBMIGRATE_<SECTION>_<KEY>` environment overrides
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! store_target = "postgresql"
//!
//! [application]
//! log_level = "info"
//!
//! [postgresql]
//! connection_string = "${CLUBMIGRATE_DATABASE_URL}"
//! max_connections = 10
//!
//! [migration]
//! concurrency = 8
//! stale_run_timeout_secs = 3600
//!
//! [backup]
//! directory = "backups"
//!
//! [mapping.team_to_club]
//! "Viktoria Wertheim I" = "SV Viktoria Wertheim"
//! ```
//!
//! ```rust,no_run
//! use clubmigrate::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clubmigrate.toml")?;
//! println!("Backups go to {}", config.backup.directory);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, BackupConfig, ClubMigrateConfig, HistoryConfig, JsonStoreConfig,
    LoggingConfig, MappingConfig, MigrationConfig, PostgreSQLConfig, ReportConfig, RetryConfig,
    StoreTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
