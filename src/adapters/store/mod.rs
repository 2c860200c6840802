//! Store abstraction layer
//!
//! Trait-based access to the persisted collections so the orchestrator runs
//! unchanged against the JSON file store or PostgreSQL.

pub mod factory;
pub mod traits;

pub use factory::{create_postgresql_client, create_stores, StorePair};
pub use traits::{HistoryStorage, RecordStore, StoreResult};
