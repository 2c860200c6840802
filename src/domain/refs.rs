//! Participant references
//!
//! A match participant is referenced either by a legacy team or by a club,
//! never both. The persisted documents keep four independent nullable columns
//! because legacy rows may be malformed, but everything the domain reads or
//! writes goes through the tagged types in this module.

use crate::domain::ids::{ClubId, TeamId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single reference in exactly one of two modes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "id", rename_all = "lowercase")]
pub enum TeamOrClubRef {
    /// Legacy team reference
    Team(TeamId),
    /// Canonical club reference
    Club(ClubId),
}

impl TeamOrClubRef {
    /// Returns true for the legacy team mode
    pub fn is_team(&self) -> bool {
        matches!(self, Self::Team(_))
    }

    /// Returns true for the club mode
    pub fn is_club(&self) -> bool {
        matches!(self, Self::Club(_))
    }
}

/// The home/away pair of a match
///
/// Both sides always share the same mode, so a half-migrated match cannot be
/// expressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum MatchRefs {
    /// Both sides reference legacy teams
    Teams {
        /// Home team
        home: TeamId,
        /// Away team
        away: TeamId,
    },
    /// Both sides reference clubs
    Clubs {
        /// Home club
        home: ClubId,
        /// Away club
        away: ClubId,
    },
}

impl MatchRefs {
    /// Home side as a single reference
    pub fn home(&self) -> TeamOrClubRef {
        match self {
            Self::Teams { home, .. } => TeamOrClubRef::Team(home.clone()),
            Self::Clubs { home, .. } => TeamOrClubRef::Club(home.clone()),
        }
    }

    /// Away side as a single reference
    pub fn away(&self) -> TeamOrClubRef {
        match self {
            Self::Teams { away, .. } => TeamOrClubRef::Team(away.clone()),
            Self::Clubs { away, .. } => TeamOrClubRef::Club(away.clone()),
        }
    }

    /// Returns true when both sides reference clubs
    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Clubs { .. })
    }

    /// Returns true when a club would play against itself
    pub fn is_self_play(&self) -> bool {
        match self {
            Self::Teams { home, away } => home == away,
            Self::Clubs { home, away } => home == away,
        }
    }

    /// Mode label used in logs and diffs
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Teams { .. } => "team",
            Self::Clubs { .. } => "club",
        }
    }
}

/// Why a persisted reference pair could not be read as [`MatchRefs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RefShape {
    /// Team and club columns are both populated
    Mixed,
    /// No reference column is populated
    Empty,
    /// Only one side of a pair is populated
    Incomplete,
}

impl fmt::Display for RefShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Mixed => "mixed team and club references",
            Self::Empty => "no team or club references",
            Self::Incomplete => "only one side referenced",
        };
        write!(f, "{label}")
    }
}

/// Read the four nullable reference columns of a match as a tagged pair
pub fn classify_match_refs(
    home_team: Option<&TeamId>,
    away_team: Option<&TeamId>,
    home_club: Option<&ClubId>,
    away_club: Option<&ClubId>,
) -> Result<MatchRefs, RefShape> {
    let any_team = home_team.is_some() || away_team.is_some();
    let any_club = home_club.is_some() || away_club.is_some();

    match (any_team, any_club) {
        (true, true) => Err(RefShape::Mixed),
        (false, false) => Err(RefShape::Empty),
        (true, false) => match (home_team, away_team) {
            (Some(home), Some(away)) => Ok(MatchRefs::Teams {
                home: home.clone(),
                away: away.clone(),
            }),
            _ => Err(RefShape::Incomplete),
        },
        (false, true) => match (home_club, away_club) {
            (Some(home), Some(away)) => Ok(MatchRefs::Clubs {
                home: home.clone(),
                away: away.clone(),
            }),
            _ => Err(RefShape::Incomplete),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: &str) -> TeamId {
        TeamId::new(id).unwrap()
    }

    fn club(id: &str) -> ClubId {
        ClubId::new(id).unwrap()
    }

    #[test]
    fn test_classify_team_pair() {
        let refs = classify_match_refs(Some(&team("t1")), Some(&team("t2")), None, None).unwrap();
        assert_eq!(
            refs,
            MatchRefs::Teams {
                home: team("t1"),
                away: team("t2")
            }
        );
        assert!(!refs.is_migrated());
        assert_eq!(refs.mode(), "team");
    }

    #[test]
    fn test_classify_club_pair() {
        let refs = classify_match_refs(None, None, Some(&club("c1")), Some(&club("c2"))).unwrap();
        assert!(refs.is_migrated());
        assert_eq!(refs.home(), TeamOrClubRef::Club(club("c1")));
        assert_eq!(refs.away(), TeamOrClubRef::Club(club("c2")));
    }

    #[test]
    fn test_classify_mixed() {
        let shape =
            classify_match_refs(Some(&team("t1")), None, None, Some(&club("c2"))).unwrap_err();
        assert_eq!(shape, RefShape::Mixed);

        let shape = classify_match_refs(
            Some(&team("t1")),
            Some(&team("t2")),
            Some(&club("c1")),
            Some(&club("c2")),
        )
        .unwrap_err();
        assert_eq!(shape, RefShape::Mixed);
    }

    #[test]
    fn test_classify_empty_and_incomplete() {
        assert_eq!(
            classify_match_refs(None, None, None, None).unwrap_err(),
            RefShape::Empty
        );
        assert_eq!(
            classify_match_refs(Some(&team("t1")), None, None, None).unwrap_err(),
            RefShape::Incomplete
        );
        assert_eq!(
            classify_match_refs(None, None, None, Some(&club("c1"))).unwrap_err(),
            RefShape::Incomplete
        );
    }

    #[test]
    fn test_self_play() {
        let refs = MatchRefs::Clubs {
            home: club("c1"),
            away: club("c1"),
        };
        assert!(refs.is_self_play());
    }

    #[test]
    fn test_single_ref_serialization() {
        let r = TeamOrClubRef::Club(club("c9"));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "club", "id": "c9"}));
        assert!(r.is_club());
        assert!(!r.is_team());
    }
}
