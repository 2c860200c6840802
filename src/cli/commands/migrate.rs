//! Migrate command implementation

use crate::cli::commands::{exit_code_for_status, report_error, setup, EXIT_FATAL, EXIT_OK};
use crate::cli::TypeSelection;
use crate::core::migration::{MigrationOrchestrator, RunOptions, RunResult};
use crate::domain::{MigrateError, MigrationType};
use clap::Args;

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Collection to migrate
    #[arg(long = "type", value_enum)]
    pub migration_type: TypeSelection,

    /// Compute changes without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Proceed even when pre-validation reports errors
    #[arg(long)]
    pub force: bool,

    /// Print run results as JSON
    #[arg(long)]
    pub json: bool,
}

impl MigrateArgs {
    /// Execute the migrate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (config, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let options = RunOptions {
            dry_run: self.dry_run || config.application.dry_run,
            force: self.force,
        };
        tracing::info!(
            selection = ?self.migration_type,
            dry_run = options.dry_run,
            force = options.force,
            "Starting migrate command"
        );

        if !self.json {
            let mode = if options.dry_run { " (dry run)" } else { "" };
            println!("🚚 Migrating {:?}{mode}", self.migration_type);
            println!();
        }

        let orchestrator = MigrationOrchestrator::new(ctx);
        let outcome = match self.migration_type {
            TypeSelection::All => orchestrator.run_all(options).await,
            TypeSelection::Matches => orchestrator
                .run(MigrationType::Matches, options)
                .await
                .map(|r| vec![r]),
            TypeSelection::Standings => orchestrator
                .run(MigrationType::Standings, options)
                .await
                .map(|r| vec![r]),
        };

        let results = match outcome {
            Ok(results) => results,
            Err(e) => {
                let code = report_error("Migration aborted", &e);
                print_hint(&e);
                return Ok(code);
            }
        };

        if self.json {
            match serde_json::to_string_pretty(&results) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    println!("❌ Failed to encode results: {e}");
                    return Ok(EXIT_FATAL);
                }
            }
        } else {
            for result in &results {
                println!("{}", result.format_summary());
            }
        }

        Ok(exit_code(&results))
    }
}

/// Highest exit code among the runs
fn exit_code(results: &[RunResult]) -> i32 {
    results
        .iter()
        .map(|r| exit_code_for_status(r.status))
        .max()
        .unwrap_or(EXIT_OK)
}

fn print_hint(error: &MigrateError) {
    match error {
        MigrateError::PreValidationFailed { .. } => {
            println!("   Run 'clubmigrate validate' to inspect the issues");
        }
        MigrateError::StaleRun {
            last_backup: Some(backup),
            ..
        } => {
            println!("   Run 'clubmigrate rollback --backup-id {backup}' to recover");
        }
        _ => {}
    }
}
