//! Logging and observability
//!
//! Structured logging through `tracing`, plus a few macros that keep the
//! field names of recurring events consistent across the crate.
//!
//! ```no_run
//! use clubmigrate::logging::init_logging;
//! use clubmigrate::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(migration_type = "matches", "Starting run");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a migrate, rollback or cleanup run
///
/// ```no_run
/// use clubmigrate::log_run_start;
///
/// log_run_start!("migrate", "matches", "6d1f0c8e", false);
/// ```
#[macro_export]
macro_rules! log_run_start {
    ($operation:expr, $migration_type:expr, $run_id:expr, $dry_run:expr) => {
        tracing::info!(
            operation = %$operation,
            migration_type = %$migration_type,
            run_id = %$run_id,
            dry_run = $dry_run,
            "Run started"
        );
    };
}

/// Log the terminal status of a run
///
/// ```no_run
/// use clubmigrate::log_run_complete;
/// use std::time::Duration;
///
/// log_run_complete!("migrate", "matches", "completed", 42, Duration::from_secs(3));
/// ```
#[macro_export]
macro_rules! log_run_complete {
    ($operation:expr, $migration_type:expr, $status:expr, $count:expr, $duration:expr) => {
        tracing::info!(
            operation = %$operation,
            migration_type = %$migration_type,
            status = %$status,
            count = $count,
            duration_ms = $duration.as_millis() as u64,
            "Run finished"
        );
    };
}

/// Log an error with context
///
/// ```no_run
/// use clubmigrate::log_error_with_context;
/// use clubmigrate::domain::MigrateError;
///
/// let error = MigrateError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// ```no_run
/// use clubmigrate::log_retry_attempt;
///
/// log_retry_attempt!(2, 3, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
