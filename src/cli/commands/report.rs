//! Report command implementation

use crate::cli::commands::{report_error, setup, EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use crate::core::quality::QualityReporter;
use clap::Args;

/// Arguments for the report command
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Days of history to cover (defaults to report.default_period_days)
    #[arg(long)]
    pub period: Option<u32>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ReportArgs {
    /// Execute the report command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let (config, ctx) = match setup(config_path).await {
            Ok(v) => v,
            Err(code) => return Ok(code),
        };

        let period = self.period.unwrap_or(config.report.default_period_days);
        if period == 0 {
            println!("❌ --period must be at least one day");
            return Ok(EXIT_CONFIG);
        }
        tracing::info!(period_days = period, "Generating quality report");

        let reporter = QualityReporter::new(ctx);
        let report = match reporter.generate(period).await {
            Ok(r) => r,
            Err(e) => return Ok(report_error("Failed to generate report", &e)),
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
            println!("Saved to {}", reporter.directory().display());
        }

        Ok(EXIT_OK)
    }
}
