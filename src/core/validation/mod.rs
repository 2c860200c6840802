//! Validation passes, issues and health score
//!
//! - matches: reference shape, club activity and league, self-play
//! - standings: name consistency, club league, resolvable references, duplicates
//! - cross: migrated match participants present in their league table

pub mod report;
pub mod validator;

pub use report::{PassResult, PassSummary, ValidationReport};
pub use validator::{duplicate_groups, ValidationScope, Validator};
