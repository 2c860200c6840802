//! Validation issue taxonomy and health score

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    /// Team and club references mixed on one record
    MixedReference,
    /// Match with no participant references at all
    MissingReference,
    /// Only one side of a match is referenced
    IncompleteReference,
    /// Standings display name differs from the club name
    NameMismatch,
    /// Referenced team, club or league does not exist
    OrphanedReference,
    /// Team name has no mapping entry
    UnmappableTeam,
    /// Club inactive or not assigned to the record's league
    InvalidClubLeague,
    /// A club plays against itself
    SelfPlay,
    /// Migrated match participant missing from the league table
    CrossInconsistency,
    /// More than one standings row for the same name in a league
    DuplicateEntry,
}

impl IssueType {
    /// Kebab-case name used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MixedReference => "mixed-reference",
            Self::MissingReference => "missing-reference",
            Self::IncompleteReference => "incomplete-reference",
            Self::NameMismatch => "name-mismatch",
            Self::OrphanedReference => "orphaned-reference",
            Self::UnmappableTeam => "unmappable-team",
            Self::InvalidClubLeague => "invalid-club-league",
            Self::SelfPlay => "self-play",
            Self::CrossInconsistency => "cross-inconsistency",
            Self::DuplicateEntry => "duplicate-entry",
        }
    }

    /// Severity issues of this type are raised with
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NameMismatch | Self::CrossInconsistency | Self::DuplicateEntry => {
                Severity::Warning
            }
            Self::UnmappableTeam => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Human readable description for quality reports
    pub fn description(&self) -> &'static str {
        match self {
            Self::MixedReference => "Records reference teams and clubs at the same time",
            Self::MissingReference => "Matches without any participant reference",
            Self::IncompleteReference => "Matches with only one participant referenced",
            Self::NameMismatch => "Standings whose display name differs from the club name",
            Self::OrphanedReference => "References to teams, clubs or leagues that do not exist",
            Self::UnmappableTeam => "Team names without a club mapping",
            Self::InvalidClubLeague => "Clubs that are inactive or outside the record's league",
            Self::SelfPlay => "Matches where a club plays against itself",
            Self::CrossInconsistency => "Match participants missing from the league table",
            Self::DuplicateEntry => "Duplicate standings rows within a league",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        write!(f, "{s}")
    }
}

/// A single finding of a validation pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(default)]
    pub details: serde_json::Value,
}

impl ValidationIssue {
    /// Create an issue with the type's default severity
    pub fn new(issue_type: IssueType, message: impl Into<String>) -> Self {
        Self {
            issue_type,
            severity: issue_type.default_severity(),
            message: message.into(),
            record_id: None,
            details: serde_json::Value::Null,
        }
    }

    /// Attach the id of the offending record
    pub fn for_record(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    /// Attach structured details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }

    /// Returns true for error or warning issues, which make a record invalid
    pub fn invalidates(&self) -> bool {
        self.severity >= Severity::Warning
    }
}

/// Qualitative band of a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthBand {
    Excellent,
    Good,
    Fair,
    NeedsAttention,
}

impl fmt::Display for HealthBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::NeedsAttention => "needs-attention",
        };
        write!(f, "{s}")
    }
}

/// Share of valid records in percent
///
/// Keeps the exact ratio; [`HealthScore::value`] and the serialized form are
/// rounded to one decimal while [`HealthScore::band`] uses the exact ratio.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct HealthScore(f64);

impl HealthScore {
    /// Compute the score from valid and total record counts
    ///
    /// An empty dataset scores 100.
    pub fn from_counts(valid: usize, total: usize) -> Self {
        if total == 0 {
            return Self(100.0);
        }
        Self(100.0 * valid.min(total) as f64 / total as f64)
    }

    pub fn value(&self) -> f64 {
        (self.0 * 10.0).round() / 10.0
    }

    pub fn band(&self) -> HealthBand {
        match self.0 {
            s if s >= 90.0 => HealthBand::Excellent,
            s if s >= 80.0 => HealthBand::Good,
            s if s >= 70.0 => HealthBand::Fair,
            _ => HealthBand::NeedsAttention,
        }
    }
}

impl From<f64> for HealthScore {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<HealthScore> for f64 {
    fn from(score: HealthScore) -> Self {
        score.value()
    }
}

impl fmt::Display for HealthScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} ({})", self.value(), self.band())
    }
}
