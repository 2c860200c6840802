//! Status command implementation
//!
//! Prints the newest history entry per migration type, flags running
//! migrations older than `migration.stale_run_timeout_secs`, and shows how
//! many records still carry team references.

use crate::cli::commands::{report_error, setup, EXIT_BLOCKED, EXIT_OK};
use crate::core::context::RunContext;
use crate::core::history::{HistoryEntry, OperationKind, RunStatus};
use crate::core::quality::TypeProgress;
use crate::domain::{MigrationType, Result};
use chrono::Utc;
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking migration status");

        println!("📊 Migration Status");
        println!();

        let (_, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let mut stale = false;
        for migration_type in MigrationType::ALL {
            match type_status(&ctx, migration_type).await {
                Ok(line) => {
                    stale |= line.stale;
                    print!("{}", line.render());
                }
                Err(e) => return Ok(report_error("Failed to read status", &e)),
            }
        }

        if stale {
            println!("⚠️  A stale run must be resolved with 'clubmigrate rollback' before migrating.");
            return Ok(EXIT_BLOCKED);
        }
        Ok(EXIT_OK)
    }
}

struct TypeStatus {
    migration_type: MigrationType,
    latest: Option<HistoryEntry>,
    stale: bool,
    progress: TypeProgress,
}

impl TypeStatus {
    fn render(&self) -> String {
        let mut out = format!("{}:\n", self.migration_type);
        out.push_str(&format!(
            "  Progress: {}/{} migrated ({:.1}%), {} remaining\n",
            self.progress.migrated,
            self.progress.total,
            self.progress.progress_pct,
            self.progress.remaining
        ));

        match &self.latest {
            Some(entry) => {
                let icon = match entry.status {
                    RunStatus::Completed => "✅",
                    RunStatus::Partial => "⚠️ ",
                    RunStatus::Failed => "❌",
                    RunStatus::Running if self.stale => "💀",
                    RunStatus::Running | RunStatus::Pending => "🔄",
                };
                out.push_str(&format!(
                    "  Last run: {icon} {} {} ({}), started {}\n",
                    entry.operation,
                    entry.status,
                    entry.id,
                    entry.started_at.format("%Y-%m-%d %H:%M:%S")
                ));
                if let Some(backup_id) = &entry.backup_id {
                    out.push_str(&format!("  Backup: {backup_id}\n"));
                }
                if self.stale {
                    out.push_str("  Stale: running past the configured timeout\n");
                }
            }
            None => out.push_str("  Last run: never\n"),
        }
        out.push('\n');
        out
    }
}

async fn type_status(ctx: &RunContext, migration_type: MigrationType) -> Result<TypeStatus> {
    let now = Utc::now();
    let timeout = ctx.stale_run_timeout();
    let entries = ctx.history.entries().await?;

    let latest = entries
        .iter()
        .find(|e| e.migration_type == migration_type)
        .cloned();
    let stale = entries.iter().any(|e| {
        e.migration_type == migration_type
            && e.operation == OperationKind::Migrate
            && e.status == RunStatus::Running
            && e.is_stale(now, timeout)
    });

    let store = ctx.store.as_ref();
    let progress = match migration_type {
        MigrationType::Matches => {
            let matches = ctx.retry.run(|| store.list_matches(None)).await?;
            TypeProgress::of_matches(&matches)
        }
        MigrationType::Standings => {
            let standings = ctx.retry.run(|| store.list_standings(None)).await?;
            TypeProgress::of_standings(&standings)
        }
    };

    Ok(TypeStatus {
        migration_type,
        latest,
        stale,
        progress,
    })
}
