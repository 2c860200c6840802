//! Storage backends for clubmigrate.
//!
//! - [`store`] - backend-neutral traits and the factory
//! - [`json`] - JSON dataset file plus JSON lines history
//! - [`postgresql`] - PostgreSQL tables via a pooled client
//!
//! Both backends implement [`store::RecordStore`] and
//! [`store::HistoryStorage`]; the rest of the crate only sees the traits.

pub mod json;
pub mod postgresql;
pub mod store;
