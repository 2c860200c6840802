// clubmigrate - Team to Club Reference Migration Tool
// Copyright (c) 2025 clubmigrate Contributors
// Licensed under the MIT License

//! # clubmigrate - Team to Club Reference Migration
//!
//! clubmigrate moves league data from team-keyed references to club-keyed
//! references across two collections: matches and standings entries. Every
//! mutating run is gated by a snapshot, validated before and after, and
//! recorded in an append-only history log.
//!
//! ## Overview
//!
//! This library provides:
//! - **Migrating** matches and standings through a static team to club mapping
//! - **Validating** both collections against a typed issue taxonomy with a
//!   health score
//! - **Rolling back** from immutable snapshots, skipping records modified
//!   after the snapshot was taken
//! - **Cleaning up** orphaned, duplicate and empty-reference records
//! - **Reporting** data quality with progress, trends and recommendations
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Orchestrator, rollback, cleanup, validation, backups, history
//! - [`adapters`] - Record stores (JSON file, PostgreSQL)
//! - [`domain`] - Identifiers, reference modes, records, issues and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clubmigrate::config::load_config;
//! use clubmigrate::core::context::RunContext;
//! use clubmigrate::core::migration::{MigrationOrchestrator, RunOptions};
//! use clubmigrate::domain::MigrationType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("clubmigrate.toml")?;
//!     let ctx = RunContext::from_config(&config).await?;
//!
//!     let orchestrator = MigrationOrchestrator::new(ctx);
//!     let result = orchestrator
//!         .run(MigrationType::Matches, RunOptions::default())
//!         .await?;
//!
//!     println!("{} migrated, status {}", result.migrated, result.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], an alias over
//! [`domain::MigrateError`]. Record-scoped failures are collected on the
//! run result and never abort a run.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
