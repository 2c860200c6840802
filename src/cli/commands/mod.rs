//! CLI command implementations
//!
//! Every command returns its process exit code:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | completed |
//! | 1 | partial, failed, or unresolved validation errors |
//! | 2 | configuration error or unknown backup |
//! | 3 | blocked by a lock, a stale run, pre-validation or a version mismatch |
//! | 4 | store connection error |
//! | 5 | fatal error |

pub mod backups;
pub mod cleanup;
pub mod history;
pub mod init;
pub mod migrate;
pub mod report;
pub mod rollback;
pub mod status;
pub mod validate;

use crate::config::load_config;
use crate::config::schema::ClubMigrateConfig;
use crate::core::context::RunContext;
use crate::core::history::RunStatus;
use crate::domain::{MigrateError, StoreError};

pub const EXIT_OK: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_BLOCKED: i32 = 3;
pub const EXIT_CONNECTION: i32 = 4;
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error that ended a command
pub fn exit_code_for(error: &MigrateError) -> i32 {
    match error {
        MigrateError::Configuration(_) | MigrateError::BackupNotFound(_) => EXIT_CONFIG,
        MigrateError::VersionIncompatible { .. } => EXIT_BLOCKED,
        e if e.is_blocked() => EXIT_BLOCKED,
        MigrateError::Store(StoreError::ConnectionFailed(_) | StoreError::Timeout(_)) => {
            EXIT_CONNECTION
        }
        _ => EXIT_FATAL,
    }
}

/// Exit code for the terminal status of a run
pub fn exit_code_for_status(status: RunStatus) -> i32 {
    match status {
        RunStatus::Completed => EXIT_OK,
        RunStatus::Partial | RunStatus::Failed => EXIT_PARTIAL,
        RunStatus::Pending | RunStatus::Running => EXIT_FATAL,
    }
}

/// Print an error the way every command reports it and return its exit code
pub(crate) fn report_error(action: &str, error: &MigrateError) -> i32 {
    tracing::error!(error = %error, action = action, "Command failed");
    let icon = if error.is_blocked() { "⛔" } else { "❌" };
    println!("{icon} {action}");
    println!("   Error: {error}");
    exit_code_for(error)
}

/// Load the configuration file, printing the failure
pub(crate) fn load_or_report(config_path: &str) -> Result<ClubMigrateConfig, i32> {
    load_config(config_path).map_err(|e| {
        println!("❌ Failed to load configuration file");
        println!("   Error: {e}");
        EXIT_CONFIG
    })
}

/// Open the configured store and build the run context
pub(crate) async fn context_or_report(config: &ClubMigrateConfig) -> Result<RunContext, i32> {
    RunContext::from_config(config).await.map_err(|e| {
        println!("❌ Failed to open the record store");
        println!("   Error: {e}");
        match exit_code_for(&e) {
            EXIT_FATAL => EXIT_CONNECTION,
            code => code,
        }
    })
}

/// Load config and context in one step
pub(crate) async fn setup(config_path: &str) -> Result<(ClubMigrateConfig, RunContext), i32> {
    let config = load_or_report(config_path)?;
    let ctx = context_or_report(&config).await?;
    Ok((config, ctx))
}
