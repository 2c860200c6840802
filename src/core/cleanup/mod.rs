//! Removal of orphaned, duplicate and reference-less records

pub mod engine;

pub use engine::{CleanupCategory, CleanupCounts, CleanupEngine, CleanupOptions, CleanupResult};
