//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for clubmigrate using clap.

pub mod commands;

use crate::domain::MigrationType;
use clap::{Parser, Subcommand, ValueEnum};

/// clubmigrate - team to club reference migration
#[derive(Parser, Debug)]
#[command(name = "clubmigrate")]
#[command(version, about, long_about = None)]
#[command(author = "clubmigrate Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "clubmigrate.toml", env = "CLUBMIGRATE_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CLUBMIGRATE_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the latest run per type, stale runs and migration progress
    Status(commands::status::StatusArgs),

    /// Run the validation passes and print the report
    Validate(commands::validate::ValidateArgs),

    /// Migrate team references to club references
    Migrate(commands::migrate::MigrateArgs),

    /// Restore records from a snapshot
    Rollback(commands::rollback::RollbackArgs),

    /// Delete orphaned, duplicate and empty-reference records
    Cleanup(commands::cleanup::CleanupArgs),

    /// Generate a data quality report
    Report(commands::report::ReportArgs),

    /// List snapshots
    Backups(commands::backups::BackupsArgs),

    /// Show recent runs from the history log
    History(commands::history::HistoryArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// `--type` values accepted by commands that can target both collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TypeSelection {
    Matches,
    Standings,
    All,
}

impl TypeSelection {
    /// Selected types in execution order
    pub fn types(&self) -> Vec<MigrationType> {
        match self {
            Self::Matches => vec![MigrationType::Matches],
            Self::Standings => vec![MigrationType::Standings],
            Self::All => MigrationType::ALL.to_vec(),
        }
    }
}

/// Parse a single migration type for filters
pub(crate) fn parse_migration_type(s: &str) -> Result<MigrationType, String> {
    s.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["clubmigrate", "status"]);
        assert_eq!(cli.config, "clubmigrate.toml");
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["clubmigrate", "--config", "custom.toml", "status"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["clubmigrate", "--log-level", "debug", "validate"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_migrate() {
        let cli = Cli::parse_from([
            "clubmigrate",
            "migrate",
            "--type",
            "standings",
            "--dry-run",
            "--force",
        ]);
        match cli.command {
            Commands::Migrate(args) => {
                assert_eq!(args.migration_type, TypeSelection::Standings);
                assert!(args.dry_run);
                assert!(args.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_migrate_requires_type() {
        assert!(Cli::try_parse_from(["clubmigrate", "migrate"]).is_err());
        assert!(Cli::try_parse_from(["clubmigrate", "migrate", "--type", "teams"]).is_err());
    }

    #[test]
    fn test_cli_parse_rollback() {
        let cli = Cli::parse_from([
            "clubmigrate",
            "rollback",
            "--backup-id",
            "matches-migration-20250101T000000000Z",
        ]);
        match cli.command {
            Commands::Rollback(args) => {
                assert_eq!(args.backup_id, "matches-migration-20250101T000000000Z");
                assert!(!args.force);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(Cli::try_parse_from(["clubmigrate", "rollback"]).is_err());
    }

    #[test]
    fn test_cli_parse_cleanup_defaults_to_all() {
        let cli = Cli::parse_from(["clubmigrate", "cleanup", "--dry-run"]);
        match cli.command {
            Commands::Cleanup(args) => {
                assert!(args.migration_type.is_none());
                assert!(args.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_report_period() {
        let cli = Cli::parse_from(["clubmigrate", "report", "--period", "7", "--json"]);
        match cli.command {
            Commands::Report(args) => {
                assert_eq!(args.period, Some(7));
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_history_filter() {
        let cli = Cli::parse_from(["clubmigrate", "history", "--type", "matches"]);
        match cli.command {
            Commands::History(args) => {
                assert_eq!(args.limit, 20);
                assert_eq!(args.migration_type, Some(MigrationType::Matches));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_type_selection_order() {
        assert_eq!(
            TypeSelection::All.types(),
            vec![MigrationType::Matches, MigrationType::Standings]
        );
        assert_eq!(TypeSelection::Standings.types(), vec![MigrationType::Standings]);
    }
}
