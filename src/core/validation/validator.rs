//! Consistency and integrity checks
//!
//! Passes only read. They are safe to run repeatedly and concurrently with
//! each other and never take a type lock.

use crate::adapters::store::{RecordStore, StoreResult};
use crate::core::mapping::{MappingTable, ReferenceData};
use crate::core::migration::retry::RetryPolicy;
use crate::core::validation::report::{PassResult, ValidationReport};
use crate::domain::ids::{ClubId, LeagueId};
use crate::domain::records::{MatchDocument, MigrationType, StandingsDocument};
use crate::domain::{IssueType, MatchRefs, RefShape, TeamOrClubRef, ValidationIssue};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

/// Narrows a validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationScope {
    pub league: Option<LeagueId>,
    pub ids: Option<Vec<String>>,
}

impl ValidationScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn league(league: LeagueId) -> Self {
        Self {
            league: Some(league),
            ids: None,
        }
    }

    pub fn ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            league: None,
            ids: Some(ids.into_iter().collect()),
        }
    }

    fn includes(&self, id: &str) -> bool {
        self.ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|i| i == id))
    }
}

/// Runs validation passes against the store
pub struct Validator {
    store: Arc<dyn RecordStore + Send + Sync>,
    reference: Arc<ReferenceData>,
    table: Arc<MappingTable>,
    retry: RetryPolicy,
}

impl Validator {
    pub fn new(
        store: Arc<dyn RecordStore + Send + Sync>,
        reference: Arc<ReferenceData>,
        table: Arc<MappingTable>,
    ) -> Self {
        Self {
            store,
            reference,
            table,
            retry: RetryPolicy::none(),
        }
    }

    /// Retry transient store failures while reading records
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Build a validator with freshly loaded reference data
    pub async fn load(
        store: Arc<dyn RecordStore + Send + Sync>,
        table: Arc<MappingTable>,
    ) -> StoreResult<Self> {
        let reference = Arc::new(ReferenceData::load(store.as_ref()).await?);
        Ok(Self::new(store, reference, table))
    }

    pub fn reference(&self) -> &Arc<ReferenceData> {
        &self.reference
    }

    pub async fn validate_matches(&self, scope: &ValidationScope) -> StoreResult<PassResult> {
        let matches = self.scoped_matches(scope).await?;
        Ok(self.check_matches(&matches))
    }

    pub async fn validate_standings(&self, scope: &ValidationScope) -> StoreResult<PassResult> {
        let standings = self.scoped_standings(scope).await?;
        Ok(self.check_standings(&standings))
    }

    pub async fn validate_cross_consistency(
        &self,
        scope: &ValidationScope,
    ) -> StoreResult<PassResult> {
        let matches = self.scoped_matches(scope).await?;
        let store = self.store.as_ref();
        let standings = self
            .retry
            .run(|| store.list_standings(scope.league.as_ref()))
            .await?;
        Ok(self.check_cross(&matches, &standings))
    }

    /// Run the pass for one collection
    pub async fn validate_type(
        &self,
        migration_type: MigrationType,
        scope: &ValidationScope,
    ) -> StoreResult<ValidationReport> {
        let report = match migration_type {
            MigrationType::Matches => {
                ValidationReport::from_passes(Some(self.validate_matches(scope).await?), None, None)
            }
            MigrationType::Standings => ValidationReport::from_passes(
                None,
                Some(self.validate_standings(scope).await?),
                None,
            ),
        };
        Ok(report)
    }

    /// Run all three passes and merge them
    pub async fn validate_all(&self, scope: &ValidationScope) -> StoreResult<ValidationReport> {
        let matches = self.scoped_matches(scope).await?;
        let standings = self.scoped_standings(scope).await?;

        let report = ValidationReport::from_passes(
            Some(self.check_matches(&matches)),
            Some(self.check_standings(&standings)),
            Some(self.check_cross(&matches, &standings)),
        );

        tracing::info!(
            total = report.total,
            valid = report.valid,
            errors = report.errors,
            warnings = report.warnings,
            health_score = report.health_score.value(),
            "Validation finished"
        );
        Ok(report)
    }

    async fn scoped_matches(&self, scope: &ValidationScope) -> StoreResult<Vec<MatchDocument>> {
        let store = self.store.as_ref();
        Ok(self
            .retry
            .run(|| store.list_matches(scope.league.as_ref()))
            .await?
            .into_iter()
            .filter(|m| scope.includes(m.id.as_str()))
            .collect())
    }

    async fn scoped_standings(
        &self,
        scope: &ValidationScope,
    ) -> StoreResult<Vec<StandingsDocument>> {
        let store = self.store.as_ref();
        Ok(self
            .retry
            .run(|| store.list_standings(scope.league.as_ref()))
            .await?
            .into_iter()
            .filter(|s| scope.includes(s.id.as_str()))
            .collect())
    }

    /// A team name resolves through a mapping rule or by being a club's name
    fn is_mappable(&self, team_name: &str) -> bool {
        self.table.contains(team_name) || self.reference.club_named(team_name).is_some()
    }

    /// Match checks over an already loaded set
    pub fn check_matches(&self, matches: &[MatchDocument]) -> PassResult {
        let issues = matches.iter().flat_map(|m| self.match_issues(m)).collect();
        PassResult::from_issues(matches.len(), issues)
    }

    fn match_issues(&self, doc: &MatchDocument) -> Vec<ValidationIssue> {
        let id = doc.id.as_str();
        let mut issues = Vec::new();

        if self.reference.league(&doc.league_id).is_none() {
            issues.push(
                ValidationIssue::new(
                    IssueType::OrphanedReference,
                    format!("Match {id} references unknown league {}", doc.league_id),
                )
                .for_record(id)
                .with_details(json!({"leagueId": doc.league_id})),
            );
        }

        let refs = match doc.refs() {
            Ok(refs) => refs,
            Err(shape) => {
                let issue_type = match shape {
                    RefShape::Mixed => IssueType::MixedReference,
                    RefShape::Empty => IssueType::MissingReference,
                    RefShape::Incomplete => IssueType::IncompleteReference,
                };
                issues.push(
                    ValidationIssue::new(issue_type, format!("Match {id} has {shape}"))
                        .for_record(id)
                        .with_details(json!({
                            "homeTeamId": doc.home_team_id,
                            "awayTeamId": doc.away_team_id,
                            "homeClubId": doc.home_club_id,
                            "awayClubId": doc.away_club_id,
                        })),
                );
                return issues;
            }
        };

        if refs.is_self_play() {
            issues.push(
                ValidationIssue::new(
                    IssueType::SelfPlay,
                    format!("Match {id} has the same {} on both sides", refs.mode()),
                )
                .for_record(id)
                .with_details(json!({"home": refs.home(), "away": refs.away()})),
            );
        }

        match &refs {
            MatchRefs::Teams { home, away } => {
                for team_id in [home, away] {
                    match self.reference.team(team_id) {
                        None => issues.push(
                            ValidationIssue::new(
                                IssueType::OrphanedReference,
                                format!("Match {id} references unknown team {team_id}"),
                            )
                            .for_record(id)
                            .with_details(json!({"teamId": team_id})),
                        ),
                        Some(team) if !self.is_mappable(&team.name) => issues.push(
                            ValidationIssue::new(
                                IssueType::UnmappableTeam,
                                format!("Team '{}' in match {id} has no club mapping", team.name),
                            )
                            .for_record(id)
                            .with_details(json!({"teamId": team_id, "teamName": team.name})),
                        ),
                        Some(_) => {}
                    }
                }
            }
            MatchRefs::Clubs { home, away } => {
                for club_id in [home, away] {
                    if let Some(issue) = self.club_issue(id, club_id, &doc.league_id) {
                        issues.push(issue);
                    }
                }
            }
        }

        issues
    }

    fn club_issue(
        &self,
        record_id: &str,
        club_id: &ClubId,
        league: &LeagueId,
    ) -> Option<ValidationIssue> {
        let Some(club) = self.reference.club(club_id) else {
            return Some(
                ValidationIssue::new(
                    IssueType::OrphanedReference,
                    format!("Record {record_id} references unknown club {club_id}"),
                )
                .for_record(record_id)
                .with_details(json!({"clubId": club_id})),
            );
        };

        if !club.active || !club.plays_in(league) {
            let reason = if club.active {
                "is not assigned to the league"
            } else {
                "is inactive"
            };
            return Some(
                ValidationIssue::new(
                    IssueType::InvalidClubLeague,
                    format!("Club '{}' in record {record_id} {reason}", club.name),
                )
                .for_record(record_id)
                .with_details(json!({
                    "clubId": club_id,
                    "leagueId": league,
                    "active": club.active,
                })),
            );
        }
        None
    }

    /// Standings checks over an already loaded set
    pub fn check_standings(&self, standings: &[StandingsDocument]) -> PassResult {
        let mut issues: Vec<ValidationIssue> = standings
            .iter()
            .flat_map(|s| self.standings_issues(s))
            .collect();
        issues.extend(duplicate_issues(standings));
        PassResult::from_issues(standings.len(), issues)
    }

    fn standings_issues(&self, doc: &StandingsDocument) -> Vec<ValidationIssue> {
        let id = doc.id.as_str();
        let mut issues = Vec::new();

        if self.reference.league(&doc.league_id).is_none() {
            issues.push(
                ValidationIssue::new(
                    IssueType::OrphanedReference,
                    format!("Standings {id} references unknown league {}", doc.league_id),
                )
                .for_record(id)
                .with_details(json!({"leagueId": doc.league_id})),
            );
        }

        if doc.team_id.is_some() && doc.club_id.is_some() {
            issues.push(
                ValidationIssue::new(
                    IssueType::MixedReference,
                    format!("Standings {id} references both a team and a club"),
                )
                .for_record(id)
                .with_details(json!({"teamId": doc.team_id, "clubId": doc.club_id})),
            );
        }

        match doc.reference() {
            Some(TeamOrClubRef::Club(club_id)) => match self.reference.club(&club_id) {
                None => issues.push(
                    ValidationIssue::new(
                        IssueType::OrphanedReference,
                        format!("Standings {id} references unknown club {club_id}"),
                    )
                    .for_record(id)
                    .with_details(json!({"clubId": club_id})),
                ),
                Some(club) => {
                    if doc.display_name != club.name {
                        issues.push(
                            ValidationIssue::new(
                                IssueType::NameMismatch,
                                format!(
                                    "Standings {id} shows '{}' but club {club_id} is named '{}'",
                                    doc.display_name, club.name
                                ),
                            )
                            .for_record(id)
                            .with_details(json!({
                                "displayName": doc.display_name,
                                "clubName": club.name,
                            })),
                        );
                    }
                    if let Some(issue) = self.club_issue(id, &club_id, &doc.league_id) {
                        issues.push(issue);
                    }
                }
            },
            Some(TeamOrClubRef::Team(team_id)) => match self.reference.team(&team_id) {
                None => issues.push(
                    ValidationIssue::new(
                        IssueType::OrphanedReference,
                        format!("Standings {id} references unknown team {team_id}"),
                    )
                    .for_record(id)
                    .with_details(json!({"teamId": team_id})),
                ),
                Some(team) if !self.is_mappable(&team.name) => issues.push(
                    ValidationIssue::new(
                        IssueType::UnmappableTeam,
                        format!("Team '{}' in standings {id} has no club mapping", team.name),
                    )
                    .for_record(id)
                    .with_details(json!({"teamId": team_id, "teamName": team.name})),
                ),
                Some(_) => {}
            },
            None => {
                let name = doc.display_name.trim();
                if !self.reference.is_known_name(name) && !self.table.contains(name) {
                    issues.push(
                        ValidationIssue::new(
                            IssueType::OrphanedReference,
                            format!("Standings {id} name '{name}' matches no team or club"),
                        )
                        .for_record(id)
                        .with_details(json!({"displayName": doc.display_name})),
                    );
                }
            }
        }

        issues
    }

    /// Every migrated match participant must appear in its league table
    pub fn check_cross(
        &self,
        matches: &[MatchDocument],
        standings: &[StandingsDocument],
    ) -> PassResult {
        let in_table: HashSet<(&LeagueId, &ClubId)> = standings
            .iter()
            .filter_map(|s| s.club_id.as_ref().map(|c| (&s.league_id, c)))
            .collect();

        let mut checked = 0;
        let mut issues = Vec::new();
        for doc in matches {
            let Ok(MatchRefs::Clubs { home, away }) = doc.refs() else {
                continue;
            };
            checked += 1;
            for club in [&home, &away] {
                if !in_table.contains(&(&doc.league_id, club)) {
                    issues.push(
                        ValidationIssue::new(
                            IssueType::CrossInconsistency,
                            format!(
                                "Club {club} plays in match {} but is missing from the {} table",
                                doc.id, doc.league_id
                            ),
                        )
                        .for_record(doc.id.as_str())
                        .with_details(json!({"clubId": club, "leagueId": doc.league_id})),
                    );
                }
            }
        }

        PassResult::from_issues(checked, issues)
    }
}

/// Rows sharing a display name within a league
pub fn duplicate_groups(standings: &[StandingsDocument]) -> Vec<Vec<&StandingsDocument>> {
    let mut groups: BTreeMap<(&LeagueId, String), Vec<&StandingsDocument>> = BTreeMap::new();
    for row in standings {
        groups
            .entry((&row.league_id, row.display_name.trim().to_string()))
            .or_default()
            .push(row);
    }
    groups.into_values().filter(|g| g.len() > 1).collect()
}

fn duplicate_issues(standings: &[StandingsDocument]) -> Vec<ValidationIssue> {
    duplicate_groups(standings)
        .into_iter()
        .flat_map(|group| {
            let count = group.len();
            group.into_iter().map(move |row| {
                ValidationIssue::new(
                    IssueType::DuplicateEntry,
                    format!(
                        "'{}' appears {count} times in the {} table",
                        row.display_name, row.league_id
                    ),
                )
                .for_record(row.id.as_str())
                .with_details(json!({
                    "displayName": row.display_name,
                    "leagueId": row.league_id,
                    "count": count,
                }))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::json::{Dataset, JsonStore};
    use crate::domain::ids::{MatchId, SeasonId, StandingsId, TeamId};
    use crate::domain::records::{Club, League, StandingsStats, Team};
    use crate::domain::{Severity, StoreError};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn lid(s: &str) -> LeagueId {
        LeagueId::new(s).unwrap()
    }

    fn cid(s: &str) -> ClubId {
        ClubId::new(s).unwrap()
    }

    fn tid(s: &str) -> TeamId {
        TeamId::new(s).unwrap()
    }

    fn reference() -> ReferenceData {
        ReferenceData::from_parts(
            vec![League {
                id: lid("L1"),
                name: "Premier".to_string(),
                season_id: SeasonId::new("2024").unwrap(),
            }],
            vec![
                Club {
                    id: cid("c1"),
                    name: "Rovers".to_string(),
                    active: true,
                    league_ids: vec![lid("L1")],
                },
                Club {
                    id: cid("c2"),
                    name: "Wanderers".to_string(),
                    active: true,
                    league_ids: vec![lid("L1")],
                },
                Club {
                    id: cid("c3"),
                    name: "Retired".to_string(),
                    active: false,
                    league_ids: vec![lid("L1")],
                },
            ],
            vec![
                Team {
                    id: tid("t1"),
                    name: "Rovers A".to_string(),
                    league_id: Some(lid("L1")),
                },
                Team {
                    id: tid("t2"),
                    name: "Unmapped XI".to_string(),
                    league_id: Some(lid("L1")),
                },
                Team {
                    id: tid("t3"),
                    name: "Wanderers".to_string(),
                    league_id: Some(lid("L1")),
                },
            ],
        )
    }

    fn validator(dataset: Dataset) -> Validator {
        Validator::new(
            Arc::new(JsonStore::in_memory(dataset)),
            Arc::new(reference()),
            Arc::new(MappingTable::from_rules([("Rovers A", "Rovers")])),
        )
    }

    fn a_match(id: &str) -> MatchDocument {
        MatchDocument {
            id: MatchId::new(id).unwrap(),
            league_id: lid("L1"),
            season_id: SeasonId::new("2024").unwrap(),
            home_team_id: None,
            away_team_id: None,
            home_club_id: None,
            away_club_id: None,
            status: Default::default(),
            home_score: None,
            away_score: None,
            updated_at: Utc::now(),
            last_migration_at: None,
        }
    }

    fn a_row(id: &str, name: &str, club: Option<&str>) -> StandingsDocument {
        StandingsDocument {
            id: StandingsId::new(id).unwrap(),
            league_id: lid("L1"),
            display_name: name.to_string(),
            team_id: None,
            club_id: club.map(cid),
            rank: 1,
            stats: StandingsStats::default(),
            updated_at: Utc::now(),
            last_migration_at: None,
        }
    }

    fn types(pass: &PassResult) -> Vec<IssueType> {
        pass.issues.iter().map(|i| i.issue_type).collect()
    }

    #[test]
    fn test_reference_shapes() {
        let v = validator(Dataset::default());

        let mut mixed = a_match("m1");
        mixed.home_team_id = Some(tid("t1"));
        mixed.away_club_id = Some(cid("c2"));
        let empty = a_match("m2");
        let mut half = a_match("m3");
        half.home_club_id = Some(cid("c1"));

        let pass = v.check_matches(&[mixed, empty, half]);
        assert_eq!(
            types(&pass),
            vec![
                IssueType::MixedReference,
                IssueType::MissingReference,
                IssueType::IncompleteReference
            ]
        );
        assert_eq!(pass.valid_count, 0);
    }

    #[test]
    fn test_club_mode_checks() {
        let v = validator(Dataset::default());

        let mut ok = a_match("m1");
        ok.home_club_id = Some(cid("c1"));
        ok.away_club_id = Some(cid("c2"));
        let mut self_play = a_match("m2");
        self_play.home_club_id = Some(cid("c1"));
        self_play.away_club_id = Some(cid("c1"));
        let mut inactive = a_match("m3");
        inactive.home_club_id = Some(cid("c1"));
        inactive.away_club_id = Some(cid("c3"));

        let pass = v.check_matches(&[ok, self_play, inactive]);
        assert_eq!(pass.valid_count, 1);
        assert!(types(&pass).contains(&IssueType::SelfPlay));
        assert!(types(&pass).contains(&IssueType::InvalidClubLeague));
    }

    #[test]
    fn test_unmappable_team_is_informational() {
        let v = validator(Dataset::default());
        let mut m = a_match("m1");
        m.home_team_id = Some(tid("t1"));
        m.away_team_id = Some(tid("t2"));

        let pass = v.check_matches(&[m]);
        assert_eq!(types(&pass), vec![IssueType::UnmappableTeam]);
        assert_eq!(pass.issues[0].severity, Severity::Info);
        assert_eq!(pass.valid_count, 1);
    }

    #[test]
    fn test_standings_checks() {
        let v = validator(Dataset::default());
        let pass = v.check_standings(&[
            a_row("s1", "Rovers", Some("c1")),
            a_row("s2", "Rovers FC", Some("c2")),
            a_row("s3", "Nobody", None),
            a_row("s4", "Rovers A", None),
        ]);

        assert!(pass.issues_for("s1").next().is_none());
        assert_eq!(
            pass.issues_for("s2").map(|i| i.issue_type).collect::<Vec<_>>(),
            vec![IssueType::NameMismatch]
        );
        assert_eq!(
            pass.issues_for("s3").map(|i| i.issue_type).collect::<Vec<_>>(),
            vec![IssueType::OrphanedReference]
        );
        assert!(pass.issues_for("s4").next().is_none());
        assert_eq!(pass.valid_count, 2);
    }

    #[test]
    fn test_duplicates_flagged() {
        let v = validator(Dataset::default());
        let pass = v.check_standings(&[
            a_row("s1", "Rovers", Some("c1")),
            a_row("s2", "Rovers", Some("c1")),
        ]);
        assert_eq!(pass.warnings(), 2);
        assert_eq!(pass.valid_count, 0);
    }

    #[tokio::test]
    async fn test_validate_all_cross_consistency() {
        let mut m = a_match("m1");
        m.home_club_id = Some(cid("c1"));
        m.away_club_id = Some(cid("c2"));

        let v = validator(Dataset {
            matches: vec![m],
            standings: vec![a_row("s1", "Rovers", Some("c1"))],
            ..Default::default()
        });

        let report = v.validate_all(&ValidationScope::all()).await.unwrap();
        assert_eq!(report.errors, 0);
        assert_eq!(report.warnings, 1);
        assert_eq!(
            report.issues[0].issue_type,
            IssueType::CrossInconsistency
        );
        assert_eq!(report.total, 2);
        assert_eq!(report.valid, 1);
    }

    #[tokio::test]
    async fn test_scope_filters_ids() {
        let v = validator(Dataset {
            matches: vec![a_match("m1"), a_match("m2")],
            ..Default::default()
        });
        let pass = v
            .validate_matches(&ValidationScope::ids(["m2".to_string()]))
            .await
            .unwrap();
        assert_eq!(pass.total_count, 1);
        assert_eq!(pass.issues[0].record_id.as_deref(), Some("m2"));
    }

    #[test]
    fn test_team_named_like_club_is_mappable() {
        let v = validator(Dataset::default());
        let mut m = a_match("m1");
        m.home_team_id = Some(tid("t1"));
        m.away_team_id = Some(tid("t3"));

        let pass = v.check_matches(&[m]);
        assert!(pass.issues.is_empty());
    }

    /// Store whose first `failures` match reads time out
    struct FlakyStore {
        inner: JsonStore,
        failures: AtomicU32,
    }

    #[async_trait]
    impl RecordStore for FlakyStore {
        fn store_name(&self) -> &str {
            "flaky"
        }

        async fn test_connection(&self) -> StoreResult<()> {
            self.inner.test_connection().await
        }

        async fn list_leagues(&self) -> StoreResult<Vec<League>> {
            self.inner.list_leagues().await
        }

        async fn list_clubs(&self) -> StoreResult<Vec<Club>> {
            self.inner.list_clubs().await
        }

        async fn list_teams(&self) -> StoreResult<Vec<Team>> {
            self.inner.list_teams().await
        }

        async fn list_matches(&self, league: Option<&LeagueId>) -> StoreResult<Vec<MatchDocument>> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Timeout("list_matches".to_string()));
            }
            self.inner.list_matches(league).await
        }

        async fn get_match(&self, id: &MatchId) -> StoreResult<Option<MatchDocument>> {
            self.inner.get_match(id).await
        }

        async fn put_match(&self, doc: &MatchDocument) -> StoreResult<()> {
            self.inner.put_match(doc).await
        }

        async fn delete_match(&self, id: &MatchId) -> StoreResult<bool> {
            self.inner.delete_match(id).await
        }

        async fn count_matches(&self) -> StoreResult<usize> {
            self.inner.count_matches().await
        }

        async fn list_standings(
            &self,
            league: Option<&LeagueId>,
        ) -> StoreResult<Vec<StandingsDocument>> {
            self.inner.list_standings(league).await
        }

        async fn get_standings(&self, id: &StandingsId) -> StoreResult<Option<StandingsDocument>> {
            self.inner.get_standings(id).await
        }

        async fn put_standings(&self, doc: &StandingsDocument) -> StoreResult<()> {
            self.inner.put_standings(doc).await
        }

        async fn delete_standings(&self, id: &StandingsId) -> StoreResult<bool> {
            self.inner.delete_standings(id).await
        }

        async fn count_standings(&self) -> StoreResult<usize> {
            self.inner.count_standings().await
        }
    }

    fn flaky_validator(failures: u32, retry: RetryPolicy) -> Validator {
        let store = FlakyStore {
            inner: JsonStore::in_memory(Dataset {
                matches: vec![a_match("m1")],
                ..Default::default()
            }),
            failures: AtomicU32::new(failures),
        };
        Validator::new(
            Arc::new(store),
            Arc::new(reference()),
            Arc::new(MappingTable::from_rules([("Rovers A", "Rovers")])),
        )
        .with_retry(retry)
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn test_transient_read_failure_is_retried() {
        let v = flaky_validator(2, fast_retry());
        let pass = v.validate_matches(&ValidationScope::all()).await.unwrap();
        assert_eq!(pass.total_count, 1);
    }

    #[tokio::test]
    async fn test_read_failure_without_retry_surfaces() {
        let v = flaky_validator(1, RetryPolicy::none());
        let err = v.validate_matches(&ValidationScope::all()).await.unwrap_err();
        assert!(err.is_transient());
    }
}
