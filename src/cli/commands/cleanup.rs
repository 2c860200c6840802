//! Cleanup command implementation

use crate::cli::commands::{exit_code_for_status, report_error, setup};
use crate::cli::TypeSelection;
use crate::core::cleanup::{CleanupEngine, CleanupOptions};
use clap::Args;

/// Arguments for the cleanup command
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Collection to clean (both when omitted)
    #[arg(long = "type", value_enum)]
    pub migration_type: Option<TypeSelection>,

    /// Report what would be deleted without deleting
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanupArgs {
    /// Execute the cleanup command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (config, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let types = self.migration_type.unwrap_or(TypeSelection::All).types();
        let options = CleanupOptions {
            dry_run: self.dry_run || config.application.dry_run,
        };
        tracing::info!(types = ?types, dry_run = options.dry_run, "Starting cleanup command");

        let engine = CleanupEngine::new(ctx);
        match engine.cleanup(&types, options).await {
            Ok(result) => {
                println!("{}", result.format_summary());
                Ok(exit_code_for_status(result.status))
            }
            Err(e) => Ok(report_error("Cleanup aborted", &e)),
        }
    }
}
