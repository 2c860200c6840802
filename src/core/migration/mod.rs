//! Team to club migration
//!
//! [`MigrationOrchestrator`] runs one record type at a time. Record-level
//! mapping and write failures are collected in the [`RunResult`]; only lock,
//! stale-run, pre-validation and snapshot failures abort a run.

pub mod lock;
pub mod orchestrator;
pub mod retry;
pub mod summary;
pub mod transform;

pub use lock::{LockGuard, LockTable};
pub use orchestrator::{MigrationOrchestrator, RunOptions};
pub use retry::RetryPolicy;
pub use summary::{FailureKind, RecordFailure, RunResult};
pub use transform::{migrate_match, migrate_standings, FieldChange, RecordDiff};
