//! Shared fixtures for integration tests
//!
//! Every harness works on league `L1` (season 2024) with an in-memory JSON
//! store, in-memory history and snapshot/report directories inside a
//! temporary directory.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use clubmigrate::adapters::json::{Dataset, JsonHistoryStorage, JsonStore};
use clubmigrate::config::schema::{ClubMigrateConfig, JsonStoreConfig};
use clubmigrate::core::context::RunContext;
use clubmigrate::domain::{
    Club, ClubId, League, LeagueId, MatchDocument, MatchId, SeasonId, StandingsDocument,
    StandingsId, StandingsStats, Team, TeamId,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const LEAGUE: &str = "L1";

pub fn league_id() -> LeagueId {
    LeagueId::new(LEAGUE).unwrap()
}

pub fn league() -> League {
    League {
        id: league_id(),
        name: "Kreisliga A".to_string(),
        season_id: SeasonId::new("2024").unwrap(),
    }
}

pub fn club(id: &str, name: &str, active: bool) -> Club {
    Club {
        id: ClubId::new(id).unwrap(),
        name: name.to_string(),
        active,
        league_ids: vec![league_id()],
    }
}

pub fn team(id: &str, name: &str) -> Team {
    Team {
        id: TeamId::new(id).unwrap(),
        name: name.to_string(),
        league_id: Some(league_id()),
    }
}

/// Team-keyed match last touched a day ago
pub fn team_match(id: &str, home: &str, away: &str) -> MatchDocument {
    MatchDocument {
        id: MatchId::new(id).unwrap(),
        league_id: league_id(),
        season_id: SeasonId::new("2024").unwrap(),
        home_team_id: Some(TeamId::new(home).unwrap()),
        away_team_id: Some(TeamId::new(away).unwrap()),
        home_club_id: None,
        away_club_id: None,
        status: Default::default(),
        home_score: None,
        away_score: None,
        updated_at: Utc::now() - Duration::days(1),
        last_migration_at: None,
    }
}

/// Team-keyed standings row last touched a day ago
pub fn team_standings(id: &str, team_id: &str, display_name: &str, rank: u32) -> StandingsDocument {
    StandingsDocument {
        id: StandingsId::new(id).unwrap(),
        league_id: league_id(),
        display_name: display_name.to_string(),
        team_id: Some(TeamId::new(team_id).unwrap()),
        club_id: None,
        rank,
        stats: StandingsStats {
            played: 10,
            wins: 5,
            draws: 3,
            losses: 2,
            goals_for: 18,
            goals_against: 11,
            points: 18,
        },
        updated_at: Utc::now() - Duration::days(1),
        last_migration_at: None,
    }
}

/// Two active clubs, their first teams, one match and both table rows
pub fn two_club_dataset() -> Dataset {
    Dataset {
        leagues: vec![league()],
        clubs: vec![club("c1", "SV Nord", true), club("c2", "FC Sued", true)],
        teams: vec![team("t1", "Nord I"), team("t2", "Sued I")],
        matches: vec![team_match("m1", "t1", "t2")],
        standings: vec![
            team_standings("s1", "t1", "Nord I", 1),
            team_standings("s2", "t2", "Sued I", 2),
        ],
    }
}

pub const TWO_CLUB_RULES: &[(&str, &str)] = &[("Nord I", "SV Nord"), ("Sued I", "FC Sued")];

/// Configuration with snapshot and report directories under `dir`
pub fn config_in(dir: &Path, rules: &[(&str, &str)]) -> ClubMigrateConfig {
    let mut config = ClubMigrateConfig {
        json_store: Some(JsonStoreConfig {
            path: dir.join("dataset.json").display().to_string(),
        }),
        ..Default::default()
    };
    config.backup.directory = dir.join("backups").display().to_string();
    config.report.directory = dir.join("reports").display().to_string();
    config.history.path = dir.join("history.jsonl").display().to_string();
    for (team, club) in rules {
        config
            .mapping
            .team_to_club
            .insert((*team).to_string(), (*club).to_string());
    }
    config
}

pub struct Harness {
    pub dir: TempDir,
    pub config: ClubMigrateConfig,
    pub store: Arc<JsonStore>,
    pub ctx: RunContext,
}

impl Harness {
    pub fn new(dataset: Dataset, rules: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        let config = config_in(dir.path(), rules);
        let store = Arc::new(JsonStore::in_memory(dataset));
        let ctx = RunContext::new(
            &config,
            store.clone(),
            Arc::new(JsonHistoryStorage::in_memory()),
        );
        Self {
            dir,
            config,
            store,
            ctx,
        }
    }

    pub async fn dataset(&self) -> Dataset {
        self.store.dataset().await
    }

    pub async fn match_doc(&self, id: &str) -> MatchDocument {
        self.dataset()
            .await
            .matches
            .into_iter()
            .find(|m| m.id.as_str() == id)
            .unwrap()
    }

    pub async fn standings_doc(&self, id: &str) -> StandingsDocument {
        self.dataset()
            .await
            .standings
            .into_iter()
            .find(|s| s.id.as_str() == id)
            .unwrap()
    }
}
