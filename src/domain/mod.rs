//! Domain models and types for clubmigrate.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`MatchId`], [`ClubId`], [`TeamId`], ...)
//! - **Reference modes** ([`TeamOrClubRef`], [`MatchRefs`]) that make a half
//!   migrated match unrepresentable
//! - **Persisted documents** ([`MatchDocument`], [`StandingsDocument`]) and
//!   reference data ([`League`], [`Club`], [`Team`])
//! - **Validation issues** and the [`HealthScore`]
//! - **Error types** ([`MigrateError`], [`StoreError`], [`BackupError`], [`MappingError`])
//!
//! ```rust
//! use clubmigrate::domain::{ClubId, MatchRefs};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let refs = MatchRefs::Clubs {
//!     home: ClubId::new("club-1")?,
//!     away: ClubId::new("club-2")?,
//! };
//! assert!(refs.is_migrated());
//! assert!(!refs.is_self_play());
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod issues;
pub mod records;
pub mod refs;
pub mod result;

pub use errors::{BackupError, MappingError, MigrateError, StoreError};
pub use ids::{BackupId, ClubId, LeagueId, MatchId, RunId, SeasonId, StandingsId, TeamId};
pub use issues::{HealthBand, HealthScore, IssueType, Severity, ValidationIssue};
pub use records::{
    Club, League, MatchDocument, MatchStatus, MigrationType, StandingsDocument, StandingsStats,
    Team,
};
pub use refs::{classify_match_refs, MatchRefs, RefShape, TeamOrClubRef};
pub use result::Result;
