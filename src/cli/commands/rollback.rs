//! Rollback command implementation

use crate::cli::commands::{exit_code_for_status, report_error, setup, EXIT_FATAL};
use crate::core::rollback::{RollbackExecutor, RollbackOptions};
use crate::domain::MigrateError;
use clap::Args;

/// Arguments for the rollback command
#[derive(Args, Debug)]
pub struct RollbackArgs {
    /// Snapshot to restore (see 'clubmigrate backups')
    #[arg(long)]
    pub backup_id: String,

    /// Restore a snapshot written by another format version
    #[arg(long)]
    pub force: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

impl RollbackArgs {
    /// Execute the rollback command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(backup_id = %self.backup_id, force = self.force, "Starting rollback command");

        let (_, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        if !self.json {
            println!("⏪ Rolling back from {}", self.backup_id);
            println!();
        }

        let executor = RollbackExecutor::new(ctx);
        let options = RollbackOptions { force: self.force };
        let result = match executor.rollback(&self.backup_id, options).await {
            Ok(r) => r,
            Err(e) => {
                let code = report_error("Rollback aborted", &e);
                if matches!(e, MigrateError::VersionIncompatible { .. }) {
                    println!("   Use --force to restore it anyway");
                }
                return Ok(code);
            }
        };

        if self.json {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    println!("❌ Failed to encode result: {e}");
                    return Ok(EXIT_FATAL);
                }
            }
        } else {
            println!("{}", result.format_summary());
        }

        Ok(exit_code_for_status(result.status))
    }
}
