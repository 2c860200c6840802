//! Per-record transformation and diffs

use crate::core::mapping::MappingResolver;
use crate::domain::records::{MatchDocument, StandingsDocument};
use crate::domain::{MappingError, MatchRefs, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// One changed top-level field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    pub before: Value,
    pub after: Value,
}

/// Before and after images of a record with the fields that changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDiff {
    pub record_id: String,
    pub before: Value,
    pub after: Value,
    pub changes: Vec<FieldChange>,
}

impl RecordDiff {
    /// Compare the JSON forms of two versions of a record
    ///
    /// A field missing on one side is reported as `null`.
    pub fn between<T: Serialize>(record_id: impl Into<String>, before: &T, after: &T) -> Result<Self> {
        let before = serde_json::to_value(before)?;
        let after = serde_json::to_value(after)?;

        let empty = Map::new();
        let b = before.as_object().unwrap_or(&empty);
        let a = after.as_object().unwrap_or(&empty);
        let fields: BTreeSet<&String> = b.keys().chain(a.keys()).collect();

        let changes = fields
            .into_iter()
            .filter_map(|field| {
                let old = b.get(field).cloned().unwrap_or(Value::Null);
                let new = a.get(field).cloned().unwrap_or(Value::Null);
                (old != new).then(|| FieldChange {
                    field: field.clone(),
                    before: old,
                    after: new,
                })
            })
            .collect();

        Ok(Self {
            record_id: record_id.into(),
            before,
            after,
            changes,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn changed_fields(&self) -> Vec<&str> {
        self.changes.iter().map(|c| c.field.as_str()).collect()
    }
}

/// Build the club-keyed version of a team-keyed match
///
/// # Errors
///
/// Returns the [`MappingError`] of either side, [`MappingError::SelfPlay`],
/// or [`MappingError::NoSourceReference`] when the stored references do not
/// form a team pair.
pub fn migrate_match(
    doc: &MatchDocument,
    resolver: &MappingResolver,
    at: DateTime<Utc>,
) -> std::result::Result<MatchDocument, MappingError> {
    let (home, away) = match doc.refs() {
        Ok(MatchRefs::Teams { home, away }) => (home, away),
        Ok(MatchRefs::Clubs { .. }) => {
            return Err(MappingError::NoSourceReference(format!(
                "match {} is already club-keyed",
                doc.id
            )))
        }
        Err(shape) => {
            return Err(MappingError::NoSourceReference(format!(
                "match {} has {shape}",
                doc.id
            )))
        }
    };

    let (home_club, away_club) = resolver.resolve_pair(&home, &away, &doc.league_id)?;

    let mut migrated = doc.clone();
    migrated.set_refs(MatchRefs::Clubs {
        home: home_club.id,
        away: away_club.id,
    });
    migrated.stamp_migration(at);
    Ok(migrated)
}

/// Build the club-keyed version of a standings row
///
/// The display name becomes the club's canonical name.
pub fn migrate_standings(
    doc: &StandingsDocument,
    resolver: &MappingResolver,
    at: DateTime<Utc>,
) -> std::result::Result<StandingsDocument, MappingError> {
    let club = resolver.resolve_standings(doc)?;
    let mut migrated = doc.clone();
    migrated.assign_club(club.id, &club.name);
    migrated.stamp_migration(at);
    Ok(migrated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mapping::{MappingTable, ReferenceData};
    use crate::domain::ids::{ClubId, LeagueId, MatchId, SeasonId, StandingsId, TeamId};
    use crate::domain::records::{Club, League, StandingsStats, Team};
    use std::sync::Arc;

    fn resolver() -> MappingResolver {
        let l1 = LeagueId::new("L1").unwrap();
        let reference = ReferenceData::from_parts(
            vec![League {
                id: l1.clone(),
                name: "Premier".to_string(),
                season_id: SeasonId::new("2024").unwrap(),
            }],
            vec![
                Club {
                    id: ClubId::new("c1").unwrap(),
                    name: "Rovers".to_string(),
                    active: true,
                    league_ids: vec![l1.clone()],
                },
                Club {
                    id: ClubId::new("c2").unwrap(),
                    name: "Wanderers".to_string(),
                    active: true,
                    league_ids: vec![l1.clone()],
                },
            ],
            vec![
                Team {
                    id: TeamId::new("t1").unwrap(),
                    name: "Rovers A".to_string(),
                    league_id: Some(l1.clone()),
                },
                Team {
                    id: TeamId::new("t2").unwrap(),
                    name: "Wanderers A".to_string(),
                    league_id: Some(l1),
                },
            ],
        );
        let table = MappingTable::from_rules([("Rovers A", "Rovers"), ("Wanderers A", "Wanderers")]);
        MappingResolver::new(Arc::new(table), Arc::new(reference))
    }

    fn team_match() -> MatchDocument {
        MatchDocument {
            id: MatchId::new("m1").unwrap(),
            league_id: LeagueId::new("L1").unwrap(),
            season_id: SeasonId::new("2024").unwrap(),
            home_team_id: Some(TeamId::new("t1").unwrap()),
            away_team_id: Some(TeamId::new("t2").unwrap()),
            home_club_id: None,
            away_club_id: None,
            status: Default::default(),
            home_score: Some(2),
            away_score: Some(1),
            updated_at: Utc::now(),
            last_migration_at: None,
        }
    }

    #[test]
    fn test_migrate_match_switches_mode() {
        let at = Utc::now();
        let doc = team_match();
        let migrated = migrate_match(&doc, &resolver(), at).unwrap();

        assert_eq!(
            migrated.refs().unwrap(),
            MatchRefs::Clubs {
                home: ClubId::new("c1").unwrap(),
                away: ClubId::new("c2").unwrap(),
            }
        );
        assert_eq!(migrated.last_migration_at, Some(at));
        assert_eq!(migrated.home_score, Some(2));

        let diff = RecordDiff::between("m1", &doc, &migrated).unwrap();
        let fields = diff.changed_fields();
        assert!(fields.contains(&"homeTeamId"));
        assert!(fields.contains(&"homeClubId"));
        assert!(fields.contains(&"lastMigrationAt"));
        assert!(!fields.contains(&"homeScore"));
    }

    #[test]
    fn test_migrate_match_rejects_malformed() {
        let mut doc = team_match();
        doc.away_team_id = None;
        assert!(matches!(
            migrate_match(&doc, &resolver(), Utc::now()),
            Err(MappingError::NoSourceReference(_))
        ));
    }

    #[test]
    fn test_migrate_standings_sets_club_name() {
        let doc = StandingsDocument {
            id: StandingsId::new("s1").unwrap(),
            league_id: LeagueId::new("L1").unwrap(),
            display_name: "Rovers A".to_string(),
            team_id: Some(TeamId::new("t1").unwrap()),
            club_id: None,
            rank: 2,
            stats: StandingsStats::default(),
            updated_at: Utc::now(),
            last_migration_at: None,
        };
        let migrated = migrate_standings(&doc, &resolver(), Utc::now()).unwrap();
        assert_eq!(migrated.club_id, Some(ClubId::new("c1").unwrap()));
        assert_eq!(migrated.team_id, None);
        assert_eq!(migrated.display_name, "Rovers");
    }
}
