//! Point-in-time snapshots and restore
//!
//! A snapshot is taken immediately before every mutating operation and is
//! never modified afterwards. Restores always take a pre-rollback snapshot
//! of the state they are about to overwrite.

pub mod checksum;
pub mod manager;
pub mod restore;
pub mod snapshot;

pub use manager::BackupManager;
pub use restore::{RestoreOptions, RestoreOutcome, RestoreReport, RestoreStatus};
pub use snapshot::{generate_id, BackupKind, BackupMetadata, BackupPayload, BackupSnapshot};
