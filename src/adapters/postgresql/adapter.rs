//! PostgreSQL adapter implementing the store traits

use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{PgMatchRow, PgStandingsRow};
use crate::adapters::store::{HistoryStorage, RecordStore, StoreResult};
use crate::core::history::entry::HistoryEntry;
use crate::domain::ids::{ClubId, LeagueId, MatchId, SeasonId, StandingsId, TeamId};
use crate::domain::records::{Club, League, MatchDocument, StandingsDocument, Team};
use crate::domain::StoreError;
use async_trait::async_trait;
use std::str::FromStr;
use std::sync::Arc;

const MATCH_COLUMNS: &str = "id, league_id, season_id, home_team_id, away_team_id, \
    home_club_id, away_club_id, status, home_score, away_score, updated_at, last_migration_at";

const STANDINGS_COLUMNS: &str = "id, league_id, display_name, team_id, club_id, rank, played, \
    wins, draws, losses, goals_for, goals_against, points, updated_at, last_migration_at";

/// PostgreSQL implementation of [`RecordStore`] and [`HistoryStorage`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    fn parse_id<T: FromStr<Err = String>>(value: String) -> StoreResult<T> {
        T::from_str(&value).map_err(StoreError::InvalidData)
    }

    async fn count(&self, table: &str) -> StoreResult<usize> {
        let rows = self
            .client
            .query(&format!("SELECT COUNT(*) FROM {table}"), &[])
            .await?;
        let count: i64 = rows
            .first()
            .map(|r| r.get(0))
            .unwrap_or_default();
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

#[async_trait]
impl RecordStore for PostgreSQLAdapter {
    fn store_name(&self) -> &str {
        "postgresql"
    }

    async fn test_connection(&self) -> StoreResult<()> {
        self.client.test_connection().await
    }

    async fn list_leagues(&self) -> StoreResult<Vec<League>> {
        let rows = self
            .client
            .query("SELECT id, name, season_id FROM leagues ORDER BY id", &[])
            .await?;

        rows.into_iter()
            .map(|row| {
                Ok(League {
                    id: Self::parse_id::<LeagueId>(row.get("id"))?,
                    name: row.get("name"),
                    season_id: Self::parse_id::<SeasonId>(row.get("season_id"))?,
                })
            })
            .collect()
    }

    async fn list_clubs(&self) -> StoreResult<Vec<Club>> {
        let query = r#"
            SELECT c.id, c.name, c.active,
                   COALESCE(array_agg(cl.league_id ORDER BY cl.league_id)
                            FILTER (WHERE cl.league_id IS NOT NULL), '{}') AS league_ids
            FROM clubs c
            LEFT JOIN club_leagues cl ON cl.club_id = c.id
            GROUP BY c.id, c.name, c.active
            ORDER BY c.id
        "#;
        let rows = self.client.query(query, &[]).await?;

        rows.into_iter()
            .map(|row| {
                let league_ids: Vec<String> = row.get("league_ids");
                Ok(Club {
                    id: Self::parse_id::<ClubId>(row.get("id"))?,
                    name: row.get("name"),
                    active: row.get("active"),
                    league_ids: league_ids
                        .into_iter()
                        .map(Self::parse_id::<LeagueId>)
                        .collect::<StoreResult<Vec<_>>>()?,
                })
            })
            .collect()
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let rows = self
            .client
            .query("SELECT id, name, league_id FROM teams ORDER BY id", &[])
            .await?;

        rows.into_iter()
            .map(|row| {
                let league_id: Option<String> = row.get("league_id");
                Ok(Team {
                    id: Self::parse_id::<TeamId>(row.get("id"))?,
                    name: row.get("name"),
                    league_id: league_id.map(Self::parse_id::<LeagueId>).transpose()?,
                })
            })
            .collect()
    }

    async fn list_matches(&self, league: Option<&LeagueId>) -> StoreResult<Vec<MatchDocument>> {
        let rows = match league {
            Some(league) => {
                let query =
                    format!("SELECT {MATCH_COLUMNS} FROM matches WHERE league_id = $1 ORDER BY id");
                self.client.query(&query, &[&league.as_str()]).await?
            }
            None => {
                let query = format!("SELECT {MATCH_COLUMNS} FROM matches ORDER BY id");
                self.client.query(&query, &[]).await?
            }
        };

        rows.iter()
            .map(|row| PgMatchRow::from_row(row)?.to_domain())
            .collect()
    }

    async fn get_match(&self, id: &MatchId) -> StoreResult<Option<MatchDocument>> {
        let query = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let rows = self.client.query(&query, &[&id.as_str()]).await?;
        rows.first()
            .map(|row| PgMatchRow::from_row(row)?.to_domain())
            .transpose()
    }

    async fn put_match(&self, doc: &MatchDocument) -> StoreResult<()> {
        let row = PgMatchRow::from_domain(doc)?;
        let upsert = format!(
            r#"
            INSERT INTO matches ({MATCH_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                league_id = EXCLUDED.league_id,
                season_id = EXCLUDED.season_id,
                home_team_id = EXCLUDED.home_team_id,
                away_team_id = EXCLUDED.away_team_id,
                home_club_id = EXCLUDED.home_club_id,
                away_club_id = EXCLUDED.away_club_id,
                status = EXCLUDED.status,
                home_score = EXCLUDED.home_score,
                away_score = EXCLUDED.away_score,
                updated_at = EXCLUDED.updated_at,
                last_migration_at = EXCLUDED.last_migration_at
            "#
        );

        self.client
            .execute(
                &upsert,
                &[
                    &row.id,
                    &row.league_id,
                    &row.season_id,
                    &row.home_team_id,
                    &row.away_team_id,
                    &row.home_club_id,
                    &row.away_club_id,
                    &row.status,
                    &row.home_score,
                    &row.away_score,
                    &row.updated_at,
                    &row.last_migration_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_match(&self, id: &MatchId) -> StoreResult<bool> {
        let affected = self
            .client
            .execute("DELETE FROM matches WHERE id = $1", &[&id.as_str()])
            .await?;
        Ok(affected > 0)
    }

    async fn count_matches(&self) -> StoreResult<usize> {
        self.count("matches").await
    }

    async fn list_standings(
        &self,
        league: Option<&LeagueId>,
    ) -> StoreResult<Vec<StandingsDocument>> {
        let rows = match league {
            Some(league) => {
                let query = format!(
                    "SELECT {STANDINGS_COLUMNS} FROM standings WHERE league_id = $1 ORDER BY league_id, rank, id"
                );
                self.client.query(&query, &[&league.as_str()]).await?
            }
            None => {
                let query =
                    format!("SELECT {STANDINGS_COLUMNS} FROM standings ORDER BY league_id, rank, id");
                self.client.query(&query, &[]).await?
            }
        };

        rows.iter()
            .map(|row| PgStandingsRow::from_row(row)?.to_domain())
            .collect()
    }

    async fn get_standings(&self, id: &StandingsId) -> StoreResult<Option<StandingsDocument>> {
        let query = format!("SELECT {STANDINGS_COLUMNS} FROM standings WHERE id = $1");
        let rows = self.client.query(&query, &[&id.as_str()]).await?;
        rows.first()
            .map(|row| PgStandingsRow::from_row(row)?.to_domain())
            .transpose()
    }

    async fn put_standings(&self, doc: &StandingsDocument) -> StoreResult<()> {
        let row = PgStandingsRow::from_domain(doc)?;
        let upsert = format!(
            r#"
            INSERT INTO standings ({STANDINGS_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (id) DO UPDATE SET
                league_id = EXCLUDED.league_id,
                display_name = EXCLUDED.display_name,
                team_id = EXCLUDED.team_id,
                club_id = EXCLUDED.club_id,
                rank = EXCLUDED.rank,
                played = EXCLUDED.played,
                wins = EXCLUDED.wins,
                draws = EXCLUDED.draws,
                losses = EXCLUDED.losses,
                goals_for = EXCLUDED.goals_for,
                goals_against = EXCLUDED.goals_against,
                points = EXCLUDED.points,
                updated_at = EXCLUDED.updated_at,
                last_migration_at = EXCLUDED.last_migration_at
            "#
        );

        self.client
            .execute(
                &upsert,
                &[
                    &row.id,
                    &row.league_id,
                    &row.display_name,
                    &row.team_id,
                    &row.club_id,
                    &row.rank,
                    &row.played,
                    &row.wins,
                    &row.draws,
                    &row.losses,
                    &row.goals_for,
                    &row.goals_against,
                    &row.points,
                    &row.updated_at,
                    &row.last_migration_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn delete_standings(&self, id: &StandingsId) -> StoreResult<bool> {
        let affected = self
            .client
            .execute("DELETE FROM standings WHERE id = $1", &[&id.as_str()])
            .await?;
        Ok(affected > 0)
    }

    async fn count_standings(&self) -> StoreResult<usize> {
        self.count("standings").await
    }
}

#[async_trait]
impl HistoryStorage for PostgreSQLAdapter {
    async fn append(&self, entry: &HistoryEntry) -> StoreResult<()> {
        let json = serde_json::to_value(entry)
            .map_err(|e| StoreError::WriteFailed(format!("failed to encode entry: {e}")))?;

        let insert = r#"
            INSERT INTO migration_history (
                run_id, operation, migration_type, status, started_at, recorded_at, entry
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#;

        self.client
            .execute(
                insert,
                &[
                    &entry.id.as_str(),
                    &entry.operation.to_string(),
                    &entry.migration_type.as_str(),
                    &entry.status.to_string(),
                    &entry.started_at,
                    &entry.recorded_at,
                    &json,
                ],
            )
            .await?;

        tracing::debug!(
            run_id = %entry.id,
            status = %entry.status,
            "History entry appended to PostgreSQL"
        );
        Ok(())
    }

    async fn load_all(&self) -> StoreResult<Vec<HistoryEntry>> {
        let rows = self
            .client
            .query("SELECT entry FROM migration_history ORDER BY seq", &[])
            .await?;

        rows.into_iter()
            .map(|row| {
                let value: serde_json::Value = row.get("entry");
                serde_json::from_value(value)
                    .map_err(|e| StoreError::InvalidData(format!("history entry: {e}")))
            })
            .collect()
    }
}
