//! Domain identifier types with validation
//!
//! This module provides newtype wrappers for every identifier the migration
//! touches. Keeping them distinct prevents passing a team id where a club id
//! is expected, which is exactly the confusion this tool exists to remove.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new ", $label, " from a string")]
            ///
            /// # Errors
            ///
            /// Returns an error if the identifier is empty or whitespace only.
            pub fn new(id: impl Into<String>) -> Result<Self, String> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(format!("{} cannot be empty", $label));
                }
                Ok(Self(id))
            }

            /// Returns the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes self and returns the inner String
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a persisted match record
    ///
    /// # Examples
    ///
    /// ```
    /// use clubmigrate::domain::ids::MatchId;
    /// use std::str::FromStr;
    ///
    /// let id = MatchId::from_str("match-42").unwrap();
    /// assert_eq!(id.as_str(), "match-42");
    /// ```
    MatchId,
    "Match ID"
);

define_id!(
    /// Identifier of a persisted standings entry (one league table row)
    StandingsId,
    "Standings ID"
);

define_id!(
    /// Identifier of a league
    LeagueId,
    "League ID"
);

define_id!(
    /// Identifier of a season
    SeasonId,
    "Season ID"
);

define_id!(
    /// Identifier of a club, the canonical organisational entity
    ClubId,
    "Club ID"
);

define_id!(
    /// Identifier of a legacy team record
    TeamId,
    "Team ID"
);

define_id!(
    /// Identifier of a backup snapshot
    ///
    /// Derived from the migration type, the snapshot kind and the timestamp,
    /// see [`crate::core::backup::BackupSnapshot::generate_id`].
    BackupId,
    "Backup ID"
);

define_id!(
    /// Identifier of a single migrate, rollback or cleanup run
    RunId,
    "Run ID"
);

impl RunId {
    /// Generate a fresh random run id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}
