//! Record store abstraction traits
//!
//! Adapters implement these traits to plug a backend into the orchestrator.
//! They carry no business logic: reads, upserts, deletes and counts only.

use crate::core::history::entry::HistoryEntry;
use crate::domain::ids::{LeagueId, MatchId, StandingsId};
use crate::domain::records::{Club, League, MatchDocument, StandingsDocument, Team};
use crate::domain::StoreError;
use async_trait::async_trait;

/// Result type for gateway calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Typed access to the persisted collections
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Short backend name for logs
    fn store_name(&self) -> &str;

    /// Test the store connection
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConnectionFailed`] if the store is unreachable.
    async fn test_connection(&self) -> StoreResult<()>;

    async fn list_leagues(&self) -> StoreResult<Vec<League>>;

    async fn list_clubs(&self) -> StoreResult<Vec<Club>>;

    async fn list_teams(&self) -> StoreResult<Vec<Team>>;

    /// List matches, optionally restricted to one league
    async fn list_matches(&self, league: Option<&LeagueId>) -> StoreResult<Vec<MatchDocument>>;

    async fn get_match(&self, id: &MatchId) -> StoreResult<Option<MatchDocument>>;

    /// Insert or fully replace a match document
    async fn put_match(&self, doc: &MatchDocument) -> StoreResult<()>;

    /// Delete a match, returning false if it did not exist
    async fn delete_match(&self, id: &MatchId) -> StoreResult<bool>;

    async fn count_matches(&self) -> StoreResult<usize>;

    /// List standings rows, optionally restricted to one league
    async fn list_standings(
        &self,
        league: Option<&LeagueId>,
    ) -> StoreResult<Vec<StandingsDocument>>;

    async fn get_standings(&self, id: &StandingsId) -> StoreResult<Option<StandingsDocument>>;

    /// Insert or fully replace a standings document
    async fn put_standings(&self, doc: &StandingsDocument) -> StoreResult<()>;

    /// Delete a standings row, returning false if it did not exist
    async fn delete_standings(&self, id: &StandingsId) -> StoreResult<bool>;

    async fn count_standings(&self) -> StoreResult<usize>;

    /// Persist buffered writes
    ///
    /// Backends that write through on every call keep the default.
    async fn flush(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Append-only persistence for history entries
#[async_trait]
pub trait HistoryStorage: Send + Sync {
    /// Append one entry version
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be persisted.
    async fn append(&self, entry: &HistoryEntry) -> StoreResult<()>;

    /// All entry versions in append order
    async fn load_all(&self) -> StoreResult<Vec<HistoryEntry>>;
}
