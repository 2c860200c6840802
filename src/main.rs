// clubmigrate - Team to Club Reference Migration Tool
// Copyright (c) 2025 clubmigrate Contributors
// Licensed under the MIT License

use clap::Parser;
use clubmigrate::cli::{Cli, Commands};
use clubmigrate::config::load_config;
use clubmigrate::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Commands report config errors themselves; logging falls back to defaults
    let config = load_config(&cli.config).ok();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    let logging_config = config.map(|c| c.logging).unwrap_or_default();
    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "clubmigrate - Team to Club Reference Migration Tool"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Status(args) => args.execute(&cli.config).await,
        Commands::Validate(args) => args.execute(&cli.config).await,
        Commands::Migrate(args) => args.execute(&cli.config).await,
        Commands::Rollback(args) => args.execute(&cli.config).await,
        Commands::Cleanup(args) => args.execute(&cli.config).await,
        Commands::Report(args) => args.execute(&cli.config).await,
        Commands::Backups(args) => args.execute(&cli.config).await,
        Commands::History(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute(&cli.config).await,
    }
}
