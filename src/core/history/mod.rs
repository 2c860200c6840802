//! Append-only run history
//!
//! Every migrate, rollback and cleanup run appends a `running` version when
//! it starts and exactly one terminal version when it ends.

pub mod entry;
pub mod log;

pub use entry::{AbortReason, HistoryEntry, OperationKind, RunCounts, RunStatus};
pub use log::HistoryLog;
