//! Rollback from a snapshot

pub mod executor;

pub use executor::{RollbackExecutor, RollbackOptions, RollbackResult};
