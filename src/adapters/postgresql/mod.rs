//! PostgreSQL record store
//!
//! Tables are created by `migrations/001_initial_schema.sql`, which the
//! `init --apply-schema` command runs through [`PostgreSQLClient::ensure_schema`].

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
pub use models::{PgMatchRow, PgStandingsRow};
