//! Backups command implementation

use crate::cli::commands::{report_error, EXIT_OK};
use crate::cli::parse_migration_type;
use crate::config::load_config;
use crate::core::backup::{BackupManager, BackupMetadata};
use crate::domain::MigrationType;
use clap::Args;

/// Arguments for the backups command
#[derive(Args, Debug)]
pub struct BackupsArgs {
    /// Only list snapshots of one type
    #[arg(long = "type", value_parser = parse_migration_type)]
    pub migration_type: Option<MigrationType>,
}

impl BackupsArgs {
    /// Execute the backups command
    ///
    /// Snapshots live on disk, so no store connection is opened.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => return Ok(report_error("Failed to load configuration file", &e)),
        };

        let manager = BackupManager::new(&config.backup);
        let snapshots = match manager.list().await {
            Ok(s) => s,
            Err(e) => return Ok(report_error("Failed to list snapshots", &e)),
        };

        let filtered: Vec<&BackupMetadata> = snapshots
            .iter()
            .filter(|m| self.migration_type.map_or(true, |t| m.migration_type == t))
            .collect();

        println!("💾 Snapshots in {}", manager.directory().display());
        println!();
        if filtered.is_empty() {
            println!("No snapshots found.");
            return Ok(EXIT_OK);
        }
        print!("{}", render(&filtered));
        Ok(EXIT_OK)
    }
}

fn render(snapshots: &[&BackupMetadata]) -> String {
    let mut out = format!(
        "{:<48} {:<10} {:<16} {:>8} {:<8} {:<20}\n",
        "Backup ID", "Type", "Kind", "Records", "Version", "Taken"
    );
    out.push_str(&"-".repeat(115));
    out.push('\n');
    for meta in snapshots {
        out.push_str(&format!(
            "{:<48} {:<10} {:<16} {:>8} {:<8} {:<20}\n",
            meta.backup_id.as_str(),
            meta.migration_type.as_str(),
            meta.kind.as_str(),
            meta.record_count,
            meta.version,
            meta.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}
