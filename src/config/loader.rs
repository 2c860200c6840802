//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ClubMigrateConfig, StoreTarget};
use super::secret_string;
use crate::domain::errors::MigrateError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`ClubMigrateConfig`]
/// 4. Applies environment variable overrides (`CLUBMIGRATE_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`MigrateError::Configuration`] if the file is missing or
/// unreadable, a referenced variable is unset, parsing fails or validation
/// rejects a value.
///
/// # Examples
///
/// ```no_run
/// use clubmigrate::config::loader::load_config;
///
/// let config = load_config("clubmigrate.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ClubMigrateConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MigrateError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        MigrateError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<ClubMigrateConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ClubMigrateConfig = toml::from_str(&contents)
        .map_err(|e| MigrateError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        MigrateError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| MigrateError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(MigrateError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the `CLUBMIGRATE_*` prefix
///
/// Variables follow the pattern `CLUBMIGRATE_<SECTION>_<KEY>`, for example
/// `CLUBMIGRATE_MIGRATION_CONCURRENCY`. Unparseable numeric values are ignored.
fn apply_env_overrides(config: &mut ClubMigrateConfig) {
    if let Ok(val) = std::env::var("CLUBMIGRATE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    if let Ok(val) = std::env::var("CLUBMIGRATE_STORE_TARGET") {
        match val.to_lowercase().as_str() {
            "json" => config.store_target = StoreTarget::Json,
            "postgresql" => config.store_target = StoreTarget::PostgreSQL,
            _ => {}
        }
    }

    if let Ok(val) = std::env::var("CLUBMIGRATE_JSON_STORE_PATH") {
        config.json_store.get_or_insert_with(Default::default).path = val;
    }

    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("CLUBMIGRATE_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("CLUBMIGRATE_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(n) = val.parse() {
                pg.max_connections = n;
            }
        }
    }

    if let Ok(val) = std::env::var("CLUBMIGRATE_MIGRATION_CONCURRENCY") {
        if let Ok(n) = val.parse() {
            config.migration.concurrency = n;
        }
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_MIGRATION_BATCH_SIZE") {
        if let Ok(n) = val.parse() {
            config.migration.batch_size = n;
        }
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_MIGRATION_STALE_RUN_TIMEOUT_SECS") {
        if let Ok(n) = val.parse() {
            config.migration.stale_run_timeout_secs = n;
        }
    }

    if let Ok(val) = std::env::var("CLUBMIGRATE_BACKUP_DIRECTORY") {
        config.backup.directory = val;
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_HISTORY_PATH") {
        config.history.path = val;
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_REPORT_DIRECTORY") {
        config.report.directory = val;
    }

    if let Ok(val) = std::env::var("CLUBMIGRATE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("CLUBMIGRATE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("CLUBMIGRATE_TEST_SUBST", "s3cret");
        let input = "connection_string = \"postgresql://u:${CLUBMIGRATE_TEST_SUBST}@db/league\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(
            result,
            "connection_string = \"postgresql://u:s3cret@db/league\""
        );
        std::env::remove_var("CLUBMIGRATE_TEST_SUBST");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("CLUBMIGRATE_TEST_MISSING");
        let input = "password = \"${CLUBMIGRATE_TEST_MISSING}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("CLUBMIGRATE_TEST_MISSING"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("CLUBMIGRATE_TEST_COMMENTED");
        let input = "# path = \"${CLUBMIGRATE_TEST_COMMENTED}\"\nlog_level = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, input);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("does-not-exist.toml");
        assert!(matches!(result, Err(MigrateError::Configuration(_))));
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
store_target = "json"

[application]
log_level = "debug"

[json_store]
path = "data/league.json"

[migration]
concurrency = 4

[mapping.team_to_club]
"Viktoria I" = "SV Viktoria Wertheim"
"Viktoria II" = "SV Viktoria Wertheim"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.migration.concurrency, 4);
        assert_eq!(config.mapping.team_to_club.len(), 2);
        assert_eq!(config.backup.directory, "backups");
    }

    #[test]
    fn test_parse_config_validation_error() {
        let result = parse_config("[json_store]\npath = \"x.json\"\n[migration]\nconcurrency = 0\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("migration.concurrency"));
    }
}
