//! Team to club resolution

use crate::core::mapping::reference::ReferenceData;
use crate::core::mapping::table::MappingTable;
use crate::domain::ids::{ClubId, LeagueId, TeamId};
use crate::domain::records::StandingsDocument;
use crate::domain::MappingError;
use std::sync::Arc;

/// A club a team resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClub {
    pub id: ClubId,
    pub name: String,
}

/// Resolves legacy team references to clubs
///
/// A resolution succeeds only when the mapped club exists, is active and is
/// assigned to the league of the record being migrated.
#[derive(Debug, Clone)]
pub struct MappingResolver {
    table: Arc<MappingTable>,
    reference: Arc<ReferenceData>,
}

impl MappingResolver {
    pub fn new(table: Arc<MappingTable>, reference: Arc<ReferenceData>) -> Self {
        Self { table, reference }
    }

    pub fn table(&self) -> &MappingTable {
        &self.table
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    /// Resolve a team name within a league
    ///
    /// A name without a mapping rule resolves to the club of the same
    /// canonical name, if there is one.
    ///
    /// # Errors
    ///
    /// - [`MappingError::UnmappableTeam`] if the name has no mapping entry
    ///   and is not a club name
    /// - [`MappingError::ClubNotFound`] if the mapped club does not exist
    /// - [`MappingError::Inactive`] if the club is inactive
    /// - [`MappingError::WrongLeague`] if the club is not in `league`
    pub fn resolve(&self, team_name: &str, league: &LeagueId) -> Result<ResolvedClub, MappingError> {
        let club = match self.table.club_for(team_name) {
            Some(club_name) => self.reference.club_by_name(club_name).ok_or_else(|| {
                MappingError::ClubNotFound {
                    club: club_name.to_string(),
                }
            })?,
            None => self.reference.club_named(team_name).ok_or_else(|| {
                MappingError::UnmappableTeam {
                    team: team_name.trim().to_string(),
                }
            })?,
        };

        if !club.active {
            return Err(MappingError::Inactive {
                club: club.name.clone(),
            });
        }
        if !club.plays_in(league) {
            return Err(MappingError::WrongLeague {
                club: club.name.clone(),
                league: league.to_string(),
            });
        }

        Ok(ResolvedClub {
            id: club.id.clone(),
            name: club.name.clone(),
        })
    }

    /// Resolve a team id by looking up its name
    pub fn resolve_team(
        &self,
        team_id: &TeamId,
        league: &LeagueId,
    ) -> Result<ResolvedClub, MappingError> {
        let team = self
            .reference
            .team(team_id)
            .ok_or_else(|| MappingError::NoSourceReference(format!("team {team_id} does not exist")))?;
        self.resolve(&team.name, league)
    }

    /// Resolve both participants of a match
    ///
    /// # Errors
    ///
    /// Any error of [`Self::resolve`] for either side, or
    /// [`MappingError::SelfPlay`] if both sides land on the same club.
    pub fn resolve_pair(
        &self,
        home: &TeamId,
        away: &TeamId,
        league: &LeagueId,
    ) -> Result<(ResolvedClub, ResolvedClub), MappingError> {
        let home = self.resolve_team(home, league)?;
        let away = self.resolve_team(away, league)?;

        if home.id == away.id {
            return Err(MappingError::SelfPlay { club: home.name });
        }
        Ok((home, away))
    }

    /// Resolve a standings row from its team reference, its assigned club or
    /// its display name
    ///
    /// A row already assigned to a club keeps that club; only its canonical
    /// name is looked up.
    pub fn resolve_standings(&self, doc: &StandingsDocument) -> Result<ResolvedClub, MappingError> {
        match (&doc.team_id, &doc.club_id) {
            (Some(team_id), _) => self.resolve_team(team_id, &doc.league_id),
            (None, Some(club_id)) => {
                let club = self
                    .reference
                    .club(club_id)
                    .ok_or_else(|| MappingError::ClubNotFound {
                        club: club_id.to_string(),
                    })?;
                Ok(ResolvedClub {
                    id: club.id.clone(),
                    name: club.name.clone(),
                })
            }
            (None, None) if !doc.display_name.trim().is_empty() => {
                self.resolve(&doc.display_name, &doc.league_id)
            }
            (None, None) => Err(MappingError::NoSourceReference(format!(
                "standings {} has neither team nor display name",
                doc.id
            ))),
        }
    }
}
