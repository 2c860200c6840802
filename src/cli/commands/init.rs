//! Init command implementation
//!
//! Writes a sample configuration file. With `--apply-schema` it instead
//! creates the PostgreSQL tables for the configured database.

use crate::adapters::store::create_postgresql_client;
use crate::cli::commands::{load_or_report, report_error, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::config::schema::StoreTarget;
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "clubmigrate.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,

    /// Create the PostgreSQL schema for the loaded configuration
    #[arg(long)]
    pub apply_schema: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        if self.apply_schema {
            return Ok(apply_schema(config_path).await);
        }

        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing clubmigrate configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        match fs::write(&self.output, sample_config()) {
            Ok(()) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Fill [mapping.team_to_club] with one line per team");
                println!("  3. For PostgreSQL: set CLUBMIGRATE_PG_CONNECTION and run");
                println!("     clubmigrate init --apply-schema");
                println!("  4. Check the data: clubmigrate validate");
                println!("  5. Preview: clubmigrate migrate --type all --dry-run");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}

async fn apply_schema(config_path: &str) -> i32 {
    let config = match load_or_report(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if config.store_target != StoreTarget::PostgreSQL {
        println!("❌ --apply-schema requires store_target = \"postgresql\"");
        return EXIT_CONFIG;
    }

    let client = match create_postgresql_client(&config) {
        Ok(c) => c,
        Err(e) => return report_error("Failed to create PostgreSQL client", &e),
    };
    match client.ensure_schema().await {
        Ok(()) => {
            println!("✅ Schema applied to {}", client.connection_string_safe());
            EXIT_OK
        }
        Err(e) => report_error("Failed to apply schema", &e.into()),
    }
}

/// Sample configuration written by `init`
pub fn sample_config() -> &'static str {
    r#"# clubmigrate configuration

# Record store: "json" or "postgresql"
store_target = "json"

[application]
log_level = "info"
# Treat every migrate and cleanup as a dry run
dry_run = false

[json_store]
path = "data/clubmigrate.json"

# [postgresql]
# connection_string = "${CLUBMIGRATE_PG_CONNECTION}"
# max_connections = 10
# connection_timeout_seconds = 30
# statement_timeout_seconds = 60
# ssl_mode = "prefer"

[migration]
# Records processed concurrently (1-64)
concurrency = 8
# Records per write batch
batch_size = 500
# A run still marked running after this many seconds is stale
stale_run_timeout_secs = 3600

[migration.retry]
max_attempts = 3
initial_delay_ms = 200
max_delay_ms = 5000
backoff_multiplier = 2.0

[backup]
directory = "backups"
# Snapshots with another major version need --force to restore
version = "1.0"

[history]
path = "data/history.jsonl"

[report]
directory = "reports"
default_period_days = 30

# Team name = club name. The club must be active and play in the
# record's league.
[mapping.team_to_club]
# "Nord I" = "SV Nord"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use tempfile::TempDir;

    #[test]
    fn test_sample_config_parses() {
        let config = parse_config(sample_config()).unwrap();
        assert_eq!(config.store_target, StoreTarget::Json);
        assert_eq!(config.migration.concurrency, 8);
        assert!(config.mapping.team_to_club.is_empty());
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("clubmigrate.toml");
        fs::write(&output, "existing").unwrap();

        let args = InitArgs {
            output: output.to_string_lossy().to_string(),
            force: false,
            apply_schema: false,
        };
        assert_eq!(args.execute("unused.toml").await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "existing");

        let args = InitArgs { force: true, ..args };
        assert_eq!(args.execute("unused.toml").await.unwrap(), EXIT_OK);
        assert!(fs::read_to_string(&output).unwrap().contains("store_target"));
    }
}
