//! History command implementation

use crate::cli::commands::{report_error, setup, EXIT_OK};
use crate::cli::parse_migration_type;
use crate::core::history::HistoryEntry;
use crate::domain::MigrationType;
use clap::Args;

/// Arguments for the history command
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Number of runs to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,

    /// Only show runs of one type
    #[arg(long = "type", value_parser = parse_migration_type)]
    pub migration_type: Option<MigrationType>,
}

impl HistoryArgs {
    /// Execute the history command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (_, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let entries = match ctx.history.entries().await {
            Ok(e) => e,
            Err(e) => return Ok(report_error("Failed to read history", &e)),
        };

        let selected: Vec<&HistoryEntry> = entries
            .iter()
            .filter(|e| self.migration_type.map_or(true, |t| e.migration_type == t))
            .take(self.limit)
            .collect();

        println!("📜 Run History");
        println!();
        if selected.is_empty() {
            println!("No runs recorded.");
            return Ok(EXIT_OK);
        }
        print!("{}", render(&selected));
        Ok(EXIT_OK)
    }
}

fn render(entries: &[&HistoryEntry]) -> String {
    let mut out = format!(
        "{:<38} {:<9} {:<10} {:<10} {:<20} {:>8} {:>8}  {}\n",
        "Run ID", "Operation", "Type", "Status", "Started", "Errors", "Warnings", "Backup / Reason"
    );
    out.push_str(&"-".repeat(140));
    out.push('\n');
    for entry in entries {
        let detail = match (&entry.abort_reason, &entry.backup_id) {
            (Some(reason), _) => reason.to_string(),
            (None, Some(backup)) => backup.to_string(),
            (None, None) => String::new(),
        };
        out.push_str(&format!(
            "{:<38} {:<9} {:<10} {:<10} {:<20} {:>8} {:>8}  {}\n",
            entry.id.as_str(),
            entry.operation.to_string(),
            entry.migration_type.as_str(),
            entry.status.to_string(),
            entry.started_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            entry.error_count,
            entry.warning_count,
            detail
        ));
    }
    out
}
