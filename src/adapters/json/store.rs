//! File-backed JSON document store
//!
//! The whole dataset is loaded into memory on open. Writes mark the store
//! dirty and [`RecordStore::flush`] rewrites the file atomically through a
//! temporary sibling and a rename.

use crate::adapters::store::{RecordStore, StoreResult};
use crate::domain::ids::{LeagueId, MatchId, StandingsId};
use crate::domain::records::{Club, League, MatchDocument, StandingsDocument, Team};
use crate::domain::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// On-disk shape of a dataset file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub leagues: Vec<League>,
    #[serde(default)]
    pub clubs: Vec<Club>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub matches: Vec<MatchDocument>,
    #[serde(default)]
    pub standings: Vec<StandingsDocument>,
}

#[derive(Default)]
struct State {
    leagues: Vec<League>,
    clubs: Vec<Club>,
    teams: Vec<Team>,
    matches: BTreeMap<MatchId, MatchDocument>,
    standings: BTreeMap<StandingsId, StandingsDocument>,
    dirty: bool,
}

impl State {
    fn from_dataset(dataset: Dataset) -> Self {
        Self {
            leagues: dataset.leagues,
            clubs: dataset.clubs,
            teams: dataset.teams,
            matches: dataset
                .matches
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            standings: dataset
                .standings
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
            dirty: false,
        }
    }

    fn to_dataset(&self) -> Dataset {
        Dataset {
            leagues: self.leagues.clone(),
            clubs: self.clubs.clone(),
            teams: self.teams.clone(),
            matches: self.matches.values().cloned().collect(),
            standings: self.standings.values().cloned().collect(),
        }
    }
}

/// JSON document store
pub struct JsonStore {
    path: Option<PathBuf>,
    state: RwLock<State>,
}

impl JsonStore {
    /// Open a dataset file
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionFailed`] if the file is missing or
    /// unreadable and [`StoreError::InvalidData`] if it does not parse.
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            StoreError::ConnectionFailed(format!(
                "failed to read dataset {}: {e}",
                path.display()
            ))
        })?;
        let dataset: Dataset = serde_json::from_str(&raw).map_err(|e| {
            StoreError::InvalidData(format!("dataset {} is not valid: {e}", path.display()))
        })?;

        tracing::info!(
            path = %path.display(),
            matches = dataset.matches.len(),
            standings = dataset.standings.len(),
            "Opened JSON dataset"
        );

        Ok(Self {
            path: Some(path),
            state: RwLock::new(State::from_dataset(dataset)),
        })
    }

    /// Create a store that never touches the filesystem
    pub fn in_memory(dataset: Dataset) -> Self {
        Self {
            path: None,
            state: RwLock::new(State::from_dataset(dataset)),
        }
    }

    /// Copy of the current contents
    pub async fn dataset(&self) -> Dataset {
        self.state.read().await.to_dataset()
    }

    /// Write a dataset file atomically
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WriteFailed`] if the file cannot be written.
    pub async fn write_dataset(path: &Path, dataset: &Dataset) -> StoreResult<()> {
        let json = serde_json::to_vec_pretty(dataset)
            .map_err(|e| StoreError::WriteFailed(format!("failed to encode dataset: {e}")))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::WriteFailed(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::WriteFailed(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            StoreError::WriteFailed(format!("failed to replace {}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl RecordStore for JsonStore {
    fn store_name(&self) -> &str {
        "json"
    }

    async fn test_connection(&self) -> StoreResult<()> {
        if let Some(path) = &self.path {
            if tokio::fs::metadata(path).await.is_err() {
                return Err(StoreError::ConnectionFailed(format!(
                    "dataset {} is no longer accessible",
                    path.display()
                )));
            }
        }
        Ok(())
    }

    async fn list_leagues(&self) -> StoreResult<Vec<League>> {
        Ok(self.state.read().await.leagues.clone())
    }

    async fn list_clubs(&self) -> StoreResult<Vec<Club>> {
        Ok(self.state.read().await.clubs.clone())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        Ok(self.state.read().await.teams.clone())
    }

    async fn list_matches(&self, league: Option<&LeagueId>) -> StoreResult<Vec<MatchDocument>> {
        let state = self.state.read().await;
        Ok(state
            .matches
            .values()
            .filter(|m| league.map_or(true, |l| &m.league_id == l))
            .cloned()
            .collect())
    }

    async fn get_match(&self, id: &MatchId) -> StoreResult<Option<MatchDocument>> {
        Ok(self.state.read().await.matches.get(id).cloned())
    }

    async fn put_match(&self, doc: &MatchDocument) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.matches.insert(doc.id.clone(), doc.clone());
        state.dirty = true;
        Ok(())
    }

    async fn delete_match(&self, id: &MatchId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.matches.remove(id).is_some();
        state.dirty |= removed;
        Ok(removed)
    }

    async fn count_matches(&self) -> StoreResult<usize> {
        Ok(self.state.read().await.matches.len())
    }

    async fn list_standings(
        &self,
        league: Option<&LeagueId>,
    ) -> StoreResult<Vec<StandingsDocument>> {
        let state = self.state.read().await;
        Ok(state
            .standings
            .values()
            .filter(|s| league.map_or(true, |l| &s.league_id == l))
            .cloned()
            .collect())
    }

    async fn get_standings(&self, id: &StandingsId) -> StoreResult<Option<StandingsDocument>> {
        Ok(self.state.read().await.standings.get(id).cloned())
    }

    async fn put_standings(&self, doc: &StandingsDocument) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.standings.insert(doc.id.clone(), doc.clone());
        state.dirty = true;
        Ok(())
    }

    async fn delete_standings(&self, id: &StandingsId) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.standings.remove(id).is_some();
        state.dirty |= removed;
        Ok(removed)
    }

    async fn count_standings(&self) -> StoreResult<usize> {
        Ok(self.state.read().await.standings.len())
    }

    async fn flush(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut state = self.state.write().await;
        if !state.dirty {
            return Ok(());
        }
        Self::write_dataset(path, &state.to_dataset()).await?;
        state.dirty = false;
        tracing::debug!(path = %path.display(), "Flushed JSON dataset");
        Ok(())
    }
}
