//! Domain error types
//!
//! Errors are split by scope. [`MappingError`] and record-level
//! [`StoreError`]s are collected per record and never abort a run;
//! [`BackupError`] and the lock/stale-run variants of [`MigrateError`]
//! abort before anything is written.

use crate::domain::issues::IssueType;
use crate::domain::records::MigrationType;
use thiserror::Error;

/// Main clubmigrate error type
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Record store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Snapshot creation or loading failed
    #[error("Backup error: {0}")]
    Backup(#[from] BackupError),

    /// A team could not be resolved to a club
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Another run already holds the lock for this type
    #[error("A {0} operation is already running")]
    AlreadyRunning(MigrationType),

    /// A crashed run left a running history entry behind
    #[error(
        "Stale {migration_type} run {run_id} found (started {started_at}); roll back from {} first",
        last_backup.as_deref().unwrap_or("the last successful backup")
    )]
    StaleRun {
        migration_type: MigrationType,
        run_id: String,
        started_at: String,
        last_backup: Option<String>,
    },

    /// Requested snapshot does not exist
    #[error("Backup not found: {0}")]
    BackupNotFound(String),

    /// Snapshot was written by an incompatible format version
    #[error("Backup version {found} is incompatible with {expected}")]
    VersionIncompatible { found: String, expected: String },

    /// Pre-validation reported errors and the run was not forced
    #[error("Pre-validation found {errors} error issue(s); use --force to override")]
    PreValidationFailed { errors: usize },

    /// History log errors
    #[error("History error: {0}")]
    History(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl MigrateError {
    /// Returns true for aborts caused by another run or by a prior crash
    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning(_) | Self::StaleRun { .. } | Self::PreValidationFailed { .. }
        )
    }
}

/// Record store errors
///
/// Adapters translate driver errors into these variants so nothing above the
/// gateway sees a third-party type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to reach the store
    #[error("Failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// The store did not answer in time
    #[error("Store operation timed out: {0}")]
    Timeout(String),

    /// A read failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A write failed
    #[error("Write failed: {0}")]
    WriteFailed(String),

    /// Record does not exist
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Conflicting concurrent write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be decoded
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Returns true when retrying the same call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionFailed(_) | Self::Timeout(_))
    }
}

/// Snapshot errors
#[derive(Debug, Error)]
pub enum BackupError {
    /// Reading the records to snapshot failed
    #[error("Failed to read records for snapshot: {0}")]
    ReadFailed(String),

    /// Writing the snapshot file failed
    #[error("Failed to write snapshot {backup_id}: {reason}")]
    WriteFailed { backup_id: String, reason: String },

    /// Snapshot file content does not match its metadata
    #[error("Snapshot {backup_id} is corrupted: {reason}")]
    Corrupted { backup_id: String, reason: String },

    /// Metadata count and payload length disagree
    #[error("Snapshot record count mismatch: metadata says {expected}, payload has {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

/// Record-scoped mapping failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// No mapping entry exists for the team name
    #[error("No club mapping for team '{team}'")]
    UnmappableTeam { team: String },

    /// Mapping target does not exist in the store
    #[error("Mapped club '{club}' does not exist")]
    ClubNotFound { club: String },

    /// Mapping target is inactive
    #[error("Mapped club '{club}' is inactive")]
    Inactive { club: String },

    /// Mapping target is not assigned to the league
    #[error("Mapped club '{club}' is not assigned to league {league}")]
    WrongLeague { club: String, league: String },

    /// Both sides resolved to the same club
    #[error("Home and away both resolve to club '{club}'")]
    SelfPlay { club: String },

    /// The record has no usable reference to map from
    #[error("Record has no resolvable team reference: {0}")]
    NoSourceReference(String),
}

impl MappingError {
    /// The validation issue category this failure corresponds to
    pub fn issue_type(&self) -> IssueType {
        match self {
            Self::UnmappableTeam { .. } => IssueType::UnmappableTeam,
            Self::ClubNotFound { .. } | Self::NoSourceReference(_) => IssueType::OrphanedReference,
            Self::Inactive { .. } | Self::WrongLeague { .. } => IssueType::InvalidClubLeague,
            Self::SelfPlay { .. } => IssueType::SelfPlay,
        }
    }
}

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        MigrateError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for MigrateError {
    fn from(err: toml::de::Error) -> Self {
        MigrateError::Configuration(format!("TOML parse error: {err}"))
    }
}
