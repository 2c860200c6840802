//! Validate command implementation
//!
//! Runs the match, standings and cross-consistency passes. With
//! `--config-only` it only checks the configuration file.

use crate::cli::commands::{
    load_or_report, report_error, setup, EXIT_CONFIG, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL,
};
use crate::config::schema::{ClubMigrateConfig, StoreTarget};
use crate::core::validation::ValidationScope;
use crate::domain::LeagueId;
use clap::Args;

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Restrict the passes to one league
    #[arg(long)]
    pub league: Option<String>,

    /// Only validate the configuration file
    #[arg(long)]
    pub config_only: bool,
}

impl ValidateArgs {
    /// Execute the validate command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating");

        if self.config_only {
            return Ok(validate_config(config_path));
        }

        let (_, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let scope = match &self.league {
            Some(league) => match LeagueId::new(league.as_str()) {
                Ok(id) => ValidationScope::league(id),
                Err(e) => {
                    println!("❌ Invalid league id: {e}");
                    return Ok(EXIT_CONFIG);
                }
            },
            None => ValidationScope::all(),
        };

        let reference = match ctx.load_reference().await {
            Ok(r) => r,
            Err(e) => return Ok(report_error("Failed to load reference data", &e)),
        };
        let report = match ctx.validator(reference).validate_all(&scope).await {
            Ok(r) => r,
            Err(e) => return Ok(report_error("Validation failed", &e.into())),
        };

        if self.json {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    println!("❌ Failed to encode report: {e}");
                    return Ok(EXIT_FATAL);
                }
            }
        } else {
            println!("{}", report.format_summary());
        }

        if report.has_errors() {
            Ok(EXIT_PARTIAL)
        } else {
            Ok(EXIT_OK)
        }
    }
}

fn validate_config(config_path: &str) -> i32 {
    println!("🔍 Validating configuration file: {config_path}");
    println!();

    let config = match load_or_report(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };

    println!("✅ Configuration is valid");
    println!();
    print!("{}", config_summary(&config));
    EXIT_OK
}

fn config_summary(config: &ClubMigrateConfig) -> String {
    let mut out = String::from("Configuration Summary:\n");
    out.push_str(&format!("  Log Level: {}\n", config.application.log_level));
    out.push_str(&format!("  Dry Run: {}\n", config.application.dry_run));
    match config.store_target {
        StoreTarget::Json => {
            out.push_str("  Store: json\n");
            if let Some(json) = &config.json_store {
                out.push_str(&format!("  Dataset: {}\n", json.path));
            }
            out.push_str(&format!("  History: {}\n", config.history.path));
        }
        StoreTarget::PostgreSQL => {
            out.push_str("  Store: postgresql\n");
            if let Some(pg) = &config.postgresql {
                out.push_str(&format!("  Max Connections: {}\n", pg.max_connections));
            }
        }
    }
    out.push_str(&format!(
        "  Concurrency: {}, Batch Size: {}\n",
        config.migration.concurrency, config.migration.batch_size
    ));
    out.push_str(&format!(
        "  Backups: {} (format {})\n",
        config.backup.directory, config.backup.version
    ));
    out.push_str(&format!("  Mapping Rules: {}\n", config.mapping.team_to_club.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::JsonStoreConfig;

    #[test]
    fn test_config_summary_counts_rules() {
        let mut config = ClubMigrateConfig {
            json_store: Some(JsonStoreConfig::default()),
            ..Default::default()
        };
        config
            .mapping
            .team_to_club
            .insert("Nord I".to_string(), "SV Nord".to_string());

        let summary = config_summary(&config);
        assert!(summary.contains("Store: json"));
        assert!(summary.contains("Mapping Rules: 1"));
    }

    #[test]
    fn test_validate_config_missing_file() {
        assert_eq!(validate_config("/nonexistent/clubmigrate.toml"), 2);
    }
}
