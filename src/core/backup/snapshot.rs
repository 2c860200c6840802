//! Snapshot model and file schema

use crate::core::backup::checksum::payload_checksum;
use crate::domain::ids::BackupId;
use crate::domain::records::{MatchDocument, MigrationType, StandingsDocument};
use crate::domain::{BackupError, MigrateError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupKind {
    Migration,
    PreRollback,
    Cleanup,
}

impl BackupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Migration => "migration",
            Self::PreRollback => "pre-rollback",
            Self::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for BackupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Header of a snapshot file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupMetadata {
    pub backup_id: BackupId,
    pub timestamp: DateTime<Utc>,
    pub record_count: usize,
    pub version: String,
    pub migration_type: MigrationType,
    pub kind: BackupKind,
    pub checksum: String,
}

/// Verbatim records keyed by collection name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupPayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<MatchDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub standings: Vec<StandingsDocument>,
}

impl BackupPayload {
    pub fn matches(records: Vec<MatchDocument>) -> Self {
        Self {
            matches: records,
            standings: Vec::new(),
        }
    }

    pub fn standings(records: Vec<StandingsDocument>) -> Self {
        Self {
            matches: Vec::new(),
            standings: records,
        }
    }

    pub fn len(&self) -> usize {
        self.matches.len() + self.standings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ids of every record in the payload
    pub fn record_ids(&self) -> Vec<String> {
        self.matches
            .iter()
            .map(|m| m.id.to_string())
            .chain(self.standings.iter().map(|s| s.id.to_string()))
            .collect()
    }
}

/// An immutable point-in-time copy of affected records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub metadata: BackupMetadata,
    pub data: BackupPayload,
}

impl BackupSnapshot {
    /// Build a snapshot and seal it with a checksum
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the payload cannot be encoded, or a
    /// backup error if it holds records of the other type.
    pub fn new(
        migration_type: MigrationType,
        kind: BackupKind,
        version: impl Into<String>,
        timestamp: DateTime<Utc>,
        data: BackupPayload,
    ) -> Result<Self> {
        let foreign = match migration_type {
            MigrationType::Matches => data.standings.len(),
            MigrationType::Standings => data.matches.len(),
        };
        if foreign > 0 {
            return Err(BackupError::Corrupted {
                backup_id: generate_id(migration_type, kind, timestamp)?.to_string(),
                reason: format!("payload holds {foreign} record(s) of another type"),
            }
            .into());
        }

        let checksum = payload_checksum(&data)?;
        Ok(Self {
            metadata: BackupMetadata {
                backup_id: generate_id(migration_type, kind, timestamp)?,
                timestamp,
                record_count: data.len(),
                version: version.into(),
                migration_type,
                kind,
                checksum,
            },
            data,
        })
    }

    pub fn id(&self) -> &BackupId {
        &self.metadata.backup_id
    }

    pub fn migration_type(&self) -> MigrationType {
        self.metadata.migration_type
    }

    /// Check the record count and checksum against the payload
    ///
    /// # Errors
    ///
    /// [`BackupError::CountMismatch`] or [`BackupError::Corrupted`].
    pub fn verify(&self) -> Result<()> {
        let actual = self.data.len();
        if self.metadata.record_count != actual {
            return Err(BackupError::CountMismatch {
                expected: self.metadata.record_count,
                actual,
            }
            .into());
        }

        let checksum = payload_checksum(&self.data)?;
        if checksum != self.metadata.checksum {
            return Err(MigrateError::Backup(BackupError::Corrupted {
                backup_id: self.metadata.backup_id.to_string(),
                reason: "payload checksum does not match metadata".to_string(),
            }));
        }
        Ok(())
    }
}

/// `{type}-{kind}-{timestamp}` with millisecond precision
pub fn generate_id(
    migration_type: MigrationType,
    kind: BackupKind,
    at: DateTime<Utc>,
) -> Result<BackupId> {
    let raw = format!(
        "{}-{}-{}",
        migration_type.as_str(),
        kind.as_str(),
        at.format("%Y%m%dT%H%M%S%3fZ")
    );
    BackupId::new(raw).map_err(|reason| {
        MigrateError::Backup(BackupError::WriteFailed {
            backup_id: String::new(),
            reason,
        })
    })
}

/// Major component of a dotted version tag
pub fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{LeagueId, MatchId, SeasonId, TeamId};
    use chrono::TimeZone;

    fn sample_match(id: &str) -> MatchDocument {
        MatchDocument {
            id: MatchId::new(id).unwrap(),
            league_id: LeagueId::new("L1").unwrap(),
            season_id: SeasonId::new("2024").unwrap(),
            home_team_id: Some(TeamId::new("t1").unwrap()),
            away_team_id: Some(TeamId::new("t2").unwrap()),
            home_club_id: None,
            away_club_id: None,
            status: Default::default(),
            home_score: None,
            away_score: None,
            updated_at: Utc::now(),
            last_migration_at: None,
        }
    }

    #[test]
    fn test_generate_id_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let id = generate_id(MigrationType::Standings, BackupKind::PreRollback, at).unwrap();
        assert_eq!(id.as_str(), "standings-pre-rollback-20240309T140507000Z");
    }

    #[test]
    fn test_snapshot_counts_and_verifies() {
        let payload = BackupPayload::matches(vec![sample_match("m1"), sample_match("m2")]);
        let snapshot = BackupSnapshot::new(
            MigrationType::Matches,
            BackupKind::Migration,
            "1.0",
            Utc::now(),
            payload,
        )
        .unwrap();

        assert_eq!(snapshot.metadata.record_count, 2);
        snapshot.verify().unwrap();
    }

    #[test]
    fn test_tampered_payload_fails_verification() {
        let mut snapshot = BackupSnapshot::new(
            MigrationType::Matches,
            BackupKind::Migration,
            "1.0",
            Utc::now(),
            BackupPayload::matches(vec![sample_match("m1")]),
        )
        .unwrap();

        snapshot.data.matches[0].home_score = Some(9);
        assert!(matches!(
            snapshot.verify(),
            Err(MigrateError::Backup(BackupError::Corrupted { .. }))
        ));

        snapshot.data.matches.push(sample_match("m2"));
        assert!(matches!(
            snapshot.verify(),
            Err(MigrateError::Backup(BackupError::CountMismatch { expected: 1, actual: 2 }))
        ));
    }

    #[test]
    fn test_file_schema_keys() {
        let snapshot = BackupSnapshot::new(
            MigrationType::Matches,
            BackupKind::Migration,
            "1.0",
            Utc::now(),
            BackupPayload::matches(vec![sample_match("m1")]),
        )
        .unwrap();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["metadata"]["backupId"].is_string());
        assert_eq!(json["metadata"]["recordCount"], 1);
        assert_eq!(json["metadata"]["migrationType"], "matches");
        assert!(json["data"]["matches"].is_array());
        assert!(json["data"].get("standings").is_none());
    }

    #[test]
    fn test_major_version() {
        assert_eq!(major_version("1.0"), "1");
        assert_eq!(major_version("2"), "2");
        assert_eq!(major_version("1.4.2"), "1");
    }
}
