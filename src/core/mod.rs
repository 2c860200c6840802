//! Core business logic for clubmigrate.
//!
//! # Modules
//!
//! - [`mapping`] - Static team to club mapping and reference data lookups
//! - [`validation`] - Consistency passes, issue taxonomy and health score
//! - [`backup`] - Point-in-time snapshots and restore
//! - [`history`] - Append-only run history
//! - [`migration`] - The migration orchestrator, retry policy and type locks
//! - [`rollback`] - Restoring a snapshot under the type lock
//! - [`cleanup`] - Removing orphaned, duplicate and reference-less records
//! - [`quality`] - Data quality reports with trends and recommendations
//!
//! # Migration Workflow
//!
//! 1. **Lock**: Take the type lock and check history for a crashed run
//! 2. **Pre-validate**: Abort on error issues unless forced
//! 3. **Snapshot**: Save every record that is about to change
//! 4. **Migrate**: Resolve teams to clubs and write each record
//! 5. **Post-validate**: Derive `completed`, `partial` or `failed`
//! 6. **Record**: Finalize the history entry with counts and backup id
//!
//! # Example
//!
//! ```rust,no_run
//! use clubmigrate::config::load_config;
//! use clubmigrate::core::context::RunContext;
//! use clubmigrate::core::migration::{MigrationOrchestrator, RunOptions};
//! use clubmigrate::domain::MigrationType;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("clubmigrate.toml")?;
//! let ctx = RunContext::from_config(&config).await?;
//!
//! let orchestrator = MigrationOrchestrator::new(ctx);
//! let result = orchestrator
//!     .run(MigrationType::Matches, RunOptions::default())
//!     .await?;
//!
//! println!("Migrated: {}", result.migrated);
//! println!("Failed: {}", result.failed);
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod cleanup;
pub mod context;
pub mod history;
pub mod mapping;
pub mod migration;
pub mod quality;
pub mod rollback;
pub mod validation;
