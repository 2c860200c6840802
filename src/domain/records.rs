//! Persisted record shapes
//!
//! Documents mirror what the record store holds. Reference columns are kept
//! as independent nullable ids because legacy data can be malformed; callers
//! read them through [`MatchDocument::refs`] and write them through
//! [`MatchDocument::set_refs`] so a mixed pair is never written.

use crate::domain::ids::{ClubId, LeagueId, MatchId, SeasonId, StandingsId, TeamId};
use crate::domain::refs::{classify_match_refs, MatchRefs, RefShape, TeamOrClubRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two entity collections a run can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationType {
    /// Match records
    Matches,
    /// League table rows
    Standings,
}

impl MigrationType {
    /// Both types in execution order
    pub const ALL: [MigrationType; 2] = [MigrationType::Matches, MigrationType::Standings];

    /// Lowercase name, also used as the collection name in backups
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Matches => "matches",
            Self::Standings => "standings",
        }
    }
}

impl fmt::Display for MigrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MigrationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "matches" | "match" => Ok(Self::Matches),
            "standings" | "standing" | "table" => Ok(Self::Standings),
            other => Err(format!(
                "Invalid migration type '{other}'. Must be one of: matches, standings"
            )),
        }
    }
}

/// A league grouping clubs for one season
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub season_id: SeasonId,
}

/// A club, the canonical entity replacing team references
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub league_ids: Vec<LeagueId>,
}

impl Club {
    /// Returns true when the club is assigned to the league
    pub fn plays_in(&self, league_id: &LeagueId) -> bool {
        self.league_ids.iter().any(|l| l == league_id)
    }
}

fn default_active() -> bool {
    true
}

/// A legacy team record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub league_id: Option<LeagueId>,
}

/// Match lifecycle status as stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
    Postponed,
    Cancelled,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Live => "live",
            Self::Finished => "finished",
            Self::Postponed => "postponed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "live" => Ok(Self::Live),
            "finished" => Ok(Self::Finished),
            "postponed" => Ok(Self::Postponed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("Unknown match status '{other}'")),
        }
    }
}

/// A persisted match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDocument {
    pub id: MatchId,
    pub league_id: LeagueId,
    pub season_id: SeasonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_club_id: Option<ClubId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_club_id: Option<ClubId>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_score: Option<u32>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_migration_at: Option<DateTime<Utc>>,
}

impl MatchDocument {
    /// Read the reference columns as a same-mode pair
    ///
    /// # Errors
    ///
    /// Returns the [`RefShape`] describing why the columns do not form a
    /// valid pair.
    pub fn refs(&self) -> Result<MatchRefs, RefShape> {
        classify_match_refs(
            self.home_team_id.as_ref(),
            self.away_team_id.as_ref(),
            self.home_club_id.as_ref(),
            self.away_club_id.as_ref(),
        )
    }

    /// Overwrite all four reference columns from a pair
    pub fn set_refs(&mut self, refs: MatchRefs) {
        match refs {
            MatchRefs::Teams { home, away } => {
                self.home_team_id = Some(home);
                self.away_team_id = Some(away);
                self.home_club_id = None;
                self.away_club_id = None;
            }
            MatchRefs::Clubs { home, away } => {
                self.home_team_id = None;
                self.away_team_id = None;
                self.home_club_id = Some(home);
                self.away_club_id = Some(away);
            }
        }
    }

    /// Stamp a write made by a migration run
    pub fn stamp_migration(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.last_migration_at = Some(at);
    }

    /// Returns true if something other than a migration changed this
    /// record after `since`
    pub fn modified_externally_since(&self, since: DateTime<Utc>) -> bool {
        externally_modified(self.updated_at, self.last_migration_at, since)
    }
}

/// Counters of a league table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StandingsStats {
    #[serde(default)]
    pub played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub goals_for: u32,
    #[serde(default)]
    pub goals_against: u32,
    #[serde(default)]
    pub points: i32,
}

/// A persisted league table row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsDocument {
    pub id: StandingsId,
    pub league_id: LeagueId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub club_id: Option<ClubId>,
    #[serde(default)]
    pub rank: u32,
    #[serde(flatten)]
    pub stats: StandingsStats,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_migration_at: Option<DateTime<Utc>>,
}

impl StandingsDocument {
    /// The reference the row currently carries, club taking precedence
    pub fn reference(&self) -> Option<TeamOrClubRef> {
        match (&self.club_id, &self.team_id) {
            (Some(club), _) => Some(TeamOrClubRef::Club(club.clone())),
            (None, Some(team)) => Some(TeamOrClubRef::Team(team.clone())),
            (None, None) => None,
        }
    }

    /// Returns true while the row is not yet keyed by a club
    pub fn needs_migration(&self) -> bool {
        self.club_id.is_none() || self.team_id.is_some()
    }

    /// Point the row at a club and adopt its canonical name
    pub fn assign_club(&mut self, club_id: ClubId, club_name: &str) {
        self.club_id = Some(club_id);
        self.team_id = None;
        self.display_name = club_name.to_string();
    }

    /// Stamp a write made by a migration run
    pub fn stamp_migration(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
        self.last_migration_at = Some(at);
    }

    /// Returns true if something other than a migration changed this
    /// record after `since`
    pub fn modified_externally_since(&self, since: DateTime<Utc>) -> bool {
        externally_modified(self.updated_at, self.last_migration_at, since)
    }
}

fn externally_modified(
    updated_at: DateTime<Utc>,
    last_migration_at: Option<DateTime<Utc>>,
    since: DateTime<Utc>,
) -> bool {
    updated_at > since && last_migration_at != Some(updated_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_match() -> MatchDocument {
        MatchDocument {
            id: MatchId::new("m1").unwrap(),
            league_id: LeagueId::new("L1").unwrap(),
            season_id: SeasonId::new("2024").unwrap(),
            home_team_id: Some(TeamId::new("t1").unwrap()),
            away_team_id: Some(TeamId::new("t2").unwrap()),
            home_club_id: None,
            away_club_id: None,
            status: MatchStatus::Finished,
            home_score: Some(2),
            away_score: Some(1),
            updated_at: Utc::now() - Duration::days(3),
            last_migration_at: None,
        }
    }

    #[test]
    fn test_migration_type_parse() {
        assert_eq!(
            MigrationType::from_str("matches").unwrap(),
            MigrationType::Matches
        );
        assert_eq!(
            MigrationType::from_str(" Standings ").unwrap(),
            MigrationType::Standings
        );
        assert!(MigrationType::from_str("players").is_err());
        assert_eq!(MigrationType::Standings.to_string(), "standings");
    }

    #[test]
    fn test_set_refs_clears_other_mode() {
        let mut doc = sample_match();
        doc.set_refs(MatchRefs::Clubs {
            home: ClubId::new("c1").unwrap(),
            away: ClubId::new("c2").unwrap(),
        });

        assert!(doc.home_team_id.is_none());
        assert!(doc.away_team_id.is_none());
        assert!(doc.refs().unwrap().is_migrated());
    }

    #[test]
    fn test_match_json_omits_unset_refs() {
        let doc = sample_match();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("homeClubId").is_none());
        assert_eq!(json["homeTeamId"], "t1");
        assert_eq!(json["status"], "finished");
    }

    #[test]
    fn test_modified_externally_since() {
        let snapshot_at = Utc::now() - Duration::hours(1);
        let mut doc = sample_match();
        assert!(!doc.modified_externally_since(snapshot_at));

        // a migration write is not an external change
        doc.stamp_migration(Utc::now());
        assert!(!doc.modified_externally_since(snapshot_at));

        // an edit after the migration is
        doc.updated_at = Utc::now() + Duration::seconds(5);
        assert!(doc.modified_externally_since(snapshot_at));
    }

    #[test]
    fn test_standings_assign_club() {
        let mut row = StandingsDocument {
            id: StandingsId::new("s1").unwrap(),
            league_id: LeagueId::new("L1").unwrap(),
            display_name: "1. Mannschaft".to_string(),
            team_id: Some(TeamId::new("t1").unwrap()),
            club_id: None,
            rank: 1,
            stats: StandingsStats::default(),
            updated_at: Utc::now(),
            last_migration_at: None,
        };
        assert!(row.needs_migration());
        assert_eq!(
            row.reference(),
            Some(TeamOrClubRef::Team(TeamId::new("t1").unwrap()))
        );

        row.assign_club(ClubId::new("c1").unwrap(), "SV Viktoria Wertheim");
        assert!(!row.needs_migration());
        assert_eq!(row.display_name, "SV Viktoria Wertheim");
        assert!(row.team_id.is_none());
    }

    #[test]
    fn test_standings_stats_flattened() {
        let json = serde_json::json!({
            "id": "s1",
            "leagueId": "L1",
            "displayName": "FC Example",
            "clubId": "c1",
            "rank": 3,
            "played": 10,
            "wins": 6,
            "draws": 2,
            "losses": 2,
            "goalsFor": 20,
            "goalsAgainst": 9,
            "points": 20,
            "updatedAt": "2024-05-01T10:00:00Z"
        });
        let row: StandingsDocument = serde_json::from_value(json).unwrap();
        assert_eq!(row.stats.points, 20);
        assert_eq!(row.stats.goals_for, 20);
        assert!(!row.needs_migration());
    }

    #[test]
    fn test_club_plays_in() {
        let club = Club {
            id: ClubId::new("c1").unwrap(),
            name: "SV Viktoria Wertheim".to_string(),
            active: true,
            league_ids: vec![LeagueId::new("L1").unwrap()],
        };
        assert!(club.plays_in(&LeagueId::new("L1").unwrap()));
        assert!(!club.plays_in(&LeagueId::new("L2").unwrap()));
    }
}
