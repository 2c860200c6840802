//! PostgreSQL row models
//!
//! Rows are read into plain structs mirroring the table columns, then
//! converted to domain documents. Integer columns are `INTEGER` (i32) in the
//! database and `u32` in the domain.

use crate::domain::ids::{ClubId, LeagueId, MatchId, SeasonId, StandingsId, TeamId};
use crate::domain::records::{MatchDocument, MatchStatus, StandingsDocument, StandingsStats};
use crate::domain::StoreError;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tokio_postgres::Row;

type ConvResult<T> = std::result::Result<T, StoreError>;

fn column<'a, T: tokio_postgres::types::FromSql<'a>>(row: &'a Row, name: &str) -> ConvResult<T> {
    row.try_get(name)
        .map_err(|e| StoreError::InvalidData(format!("column {name}: {e}")))
}

fn id<T: FromStr<Err = String>>(value: String) -> ConvResult<T> {
    T::from_str(&value).map_err(StoreError::InvalidData)
}

fn opt_id<T: FromStr<Err = String>>(value: Option<String>) -> ConvResult<Option<T>> {
    value.map(id::<T>).transpose()
}

fn to_u32(name: &str, value: i32) -> ConvResult<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("column {name} is negative: {value}")))
}

fn to_i32(name: &str, value: u32) -> ConvResult<i32> {
    i32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{name} does not fit INTEGER: {value}")))
}

/// A row of the `matches` table
#[derive(Debug, Clone)]
pub struct PgMatchRow {
    pub id: String,
    pub league_id: String,
    pub season_id: String,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub home_club_id: Option<String>,
    pub away_club_id: Option<String>,
    pub status: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub updated_at: DateTime<Utc>,
    pub last_migration_at: Option<DateTime<Utc>>,
}

impl PgMatchRow {
    pub fn from_row(row: &Row) -> ConvResult<Self> {
        Ok(Self {
            id: column(row, "id")?,
            league_id: column(row, "league_id")?,
            season_id: column(row, "season_id")?,
            home_team_id: column(row, "home_team_id")?,
            away_team_id: column(row, "away_team_id")?,
            home_club_id: column(row, "home_club_id")?,
            away_club_id: column(row, "away_club_id")?,
            status: column(row, "status")?,
            home_score: column(row, "home_score")?,
            away_score: column(row, "away_score")?,
            updated_at: column(row, "updated_at")?,
            last_migration_at: column(row, "last_migration_at")?,
        })
    }

    pub fn from_domain(doc: &MatchDocument) -> ConvResult<Self> {
        Ok(Self {
            id: doc.id.to_string(),
            league_id: doc.league_id.to_string(),
            season_id: doc.season_id.to_string(),
            home_team_id: doc.home_team_id.as_ref().map(ToString::to_string),
            away_team_id: doc.away_team_id.as_ref().map(ToString::to_string),
            home_club_id: doc.home_club_id.as_ref().map(ToString::to_string),
            away_club_id: doc.away_club_id.as_ref().map(ToString::to_string),
            status: doc.status.as_str().to_string(),
            home_score: doc.home_score.map(|s| to_i32("home_score", s)).transpose()?,
            away_score: doc.away_score.map(|s| to_i32("away_score", s)).transpose()?,
            updated_at: doc.updated_at,
            last_migration_at: doc.last_migration_at,
        })
    }

    pub fn to_domain(self) -> ConvResult<MatchDocument> {
        Ok(MatchDocument {
            id: id::<MatchId>(self.id)?,
            league_id: id::<LeagueId>(self.league_id)?,
            season_id: id::<SeasonId>(self.season_id)?,
            home_team_id: opt_id::<TeamId>(self.home_team_id)?,
            away_team_id: opt_id::<TeamId>(self.away_team_id)?,
            home_club_id: opt_id::<ClubId>(self.home_club_id)?,
            away_club_id: opt_id::<ClubId>(self.away_club_id)?,
            status: MatchStatus::from_str(&self.status).map_err(StoreError::InvalidData)?,
            home_score: self.home_score.map(|s| to_u32("home_score", s)).transpose()?,
            away_score: self.away_score.map(|s| to_u32("away_score", s)).transpose()?,
            updated_at: self.updated_at,
            last_migration_at: self.last_migration_at,
        })
    }
}

/// A row of the `standings` table
#[derive(Debug, Clone)]
pub struct PgStandingsRow {
    pub id: String,
    pub league_id: String,
    pub display_name: String,
    pub team_id: Option<String>,
    pub club_id: Option<String>,
    pub rank: i32,
    pub played: i32,
    pub wins: i32,
    pub draws: i32,
    pub losses: i32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
    pub updated_at: DateTime<Utc>,
    pub last_migration_at: Option<DateTime<Utc>>,
}

impl PgStandingsRow {
    pub fn from_row(row: &Row) -> ConvResult<Self> {
        Ok(Self {
            id: column(row, "id")?,
            league_id: column(row, "league_id")?,
            display_name: column(row, "display_name")?,
            team_id: column(row, "team_id")?,
            club_id: column(row, "club_id")?,
            rank: column(row, "rank")?,
            played: column(row, "played")?,
            wins: column(row, "wins")?,
            draws: column(row, "draws")?,
            losses: column(row, "losses")?,
            goals_for: column(row, "goals_for")?,
            goals_against: column(row, "goals_against")?,
            points: column(row, "points")?,
            updated_at: column(row, "updated_at")?,
            last_migration_at: column(row, "last_migration_at")?,
        })
    }

    pub fn from_domain(doc: &StandingsDocument) -> ConvResult<Self> {
        let s = &doc.stats;
        Ok(Self {
            id: doc.id.to_string(),
            league_id: doc.league_id.to_string(),
            display_name: doc.display_name.clone(),
            team_id: doc.team_id.as_ref().map(ToString::to_string),
            club_id: doc.club_id.as_ref().map(ToString::to_string),
            rank: to_i32("rank", doc.rank)?,
            played: to_i32("played", s.played)?,
            wins: to_i32("wins", s.wins)?,
            draws: to_i32("draws", s.draws)?,
            losses: to_i32("losses", s.losses)?,
            goals_for: to_i32("goals_for", s.goals_for)?,
            goals_against: to_i32("goals_against", s.goals_against)?,
            points: s.points,
            updated_at: doc.updated_at,
            last_migration_at: doc.last_migration_at,
        })
    }

    pub fn to_domain(self) -> ConvResult<StandingsDocument> {
        Ok(StandingsDocument {
            id: id::<StandingsId>(self.id)?,
            league_id: id::<LeagueId>(self.league_id)?,
            display_name: self.display_name,
            team_id: opt_id::<TeamId>(self.team_id)?,
            club_id: opt_id::<ClubId>(self.club_id)?,
            rank: to_u32("rank", self.rank)?,
            stats: StandingsStats {
                played: to_u32("played", self.played)?,
                wins: to_u32("wins", self.wins)?,
                draws: to_u32("draws", self.draws)?,
                losses: to_u32("losses", self.losses)?,
                goals_for: to_u32("goals_for", self.goals_for)?,
                goals_against: to_u32("goals_against", self.goals_against)?,
                points: self.points,
            },
            updated_at: self.updated_at,
            last_migration_at: self.last_migration_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn match_row() -> PgMatchRow {
        PgMatchRow {
            id: "m1".to_string(),
            league_id: "L1".to_string(),
            season_id: "2024".to_string(),
            home_team_id: None,
            away_team_id: None,
            home_club_id: Some("c1".to_string()),
            away_club_id: Some("c2".to_string()),
            status: "finished".to_string(),
            home_score: Some(1),
            away_score: Some(0),
            updated_at: Utc::now(),
            last_migration_at: None,
        }
    }

    #[test]
    fn test_match_row_to_domain() {
        let doc = match_row().to_domain().unwrap();
        assert!(doc.refs().unwrap().is_migrated());
        assert_eq!(doc.status, MatchStatus::Finished);

        let back = PgMatchRow::from_domain(&doc).unwrap();
        assert_eq!(back.home_club_id.as_deref(), Some("c1"));
        assert_eq!(back.status, "finished");
    }

    #[test]
    fn test_negative_score_rejected() {
        let mut row = match_row();
        row.home_score = Some(-1);
        assert!(matches!(row.to_domain(), Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_unknown_status_rejected() {
        let mut row = match_row();
        row.status = "abandoned".to_string();
        assert!(row.to_domain().is_err());
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut row = match_row();
        row.home_club_id = Some(String::new());
        assert!(row.to_domain().is_err());
    }
}
