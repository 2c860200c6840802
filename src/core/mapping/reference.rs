//! Reference data snapshot used by resolution and validation

use crate::adapters::store::{RecordStore, StoreResult};
use crate::domain::ids::{ClubId, LeagueId, TeamId};
use crate::domain::records::{Club, League, Team};
use std::collections::HashMap;

/// Leagues, clubs and teams indexed for lookups
///
/// Loaded once per run; reference data is not changed by migrations.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    leagues: HashMap<LeagueId, League>,
    clubs: HashMap<ClubId, Club>,
    club_names: HashMap<String, ClubId>,
    teams: HashMap<TeamId, Team>,
    team_names: HashMap<String, TeamId>,
}

impl ReferenceData {
    /// Read reference collections from the store
    pub async fn load(store: &(dyn RecordStore + Send + Sync)) -> StoreResult<Self> {
        let leagues = store.list_leagues().await?;
        let clubs = store.list_clubs().await?;
        let teams = store.list_teams().await?;

        tracing::debug!(
            leagues = leagues.len(),
            clubs = clubs.len(),
            teams = teams.len(),
            "Reference data loaded"
        );
        Ok(Self::from_parts(leagues, clubs, teams))
    }

    pub fn from_parts(leagues: Vec<League>, clubs: Vec<Club>, teams: Vec<Team>) -> Self {
        let club_names = clubs
            .iter()
            .map(|c| (c.name.clone(), c.id.clone()))
            .collect();
        let team_names = teams
            .iter()
            .map(|t| (t.name.clone(), t.id.clone()))
            .collect();

        Self {
            leagues: leagues.into_iter().map(|l| (l.id.clone(), l)).collect(),
            clubs: clubs.into_iter().map(|c| (c.id.clone(), c)).collect(),
            club_names,
            teams: teams.into_iter().map(|t| (t.id.clone(), t)).collect(),
            team_names,
        }
    }

    pub fn league(&self, id: &LeagueId) -> Option<&League> {
        self.leagues.get(id)
    }

    pub fn club(&self, id: &ClubId) -> Option<&Club> {
        self.clubs.get(id)
    }

    /// Club by canonical name, falling back to the name being an id
    pub fn club_by_name(&self, name: &str) -> Option<&Club> {
        let name = name.trim();
        self.club_names
            .get(name)
            .and_then(|id| self.clubs.get(id))
            .or_else(|| {
                ClubId::new(name)
                    .ok()
                    .and_then(|id| self.clubs.get(&id))
            })
    }

    /// Club whose canonical name is exactly `name` after trimming
    pub fn club_named(&self, name: &str) -> Option<&Club> {
        self.club_names
            .get(name.trim())
            .and_then(|id| self.clubs.get(id))
    }

    pub fn team(&self, id: &TeamId) -> Option<&Team> {
        self.teams.get(id)
    }

    pub fn team_by_name(&self, name: &str) -> Option<&Team> {
        self.team_names
            .get(name.trim())
            .and_then(|id| self.teams.get(id))
    }

    /// Returns true if `name` is the name of a known team or club
    pub fn is_known_name(&self, name: &str) -> bool {
        let name = name.trim();
        self.team_names.contains_key(name) || self.club_names.contains_key(name)
    }

    pub fn club_count(&self) -> usize {
        self.clubs.len()
    }
}
