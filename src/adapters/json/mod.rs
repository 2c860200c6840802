//! JSON file record store
//!
//! A dataset file holds leagues, clubs, teams, matches and standings. History
//! goes to a separate JSON lines file.

pub mod history;
pub mod store;

pub use history::JsonHistoryStorage;
pub use store::{Dataset, JsonStore};
