//! Data quality reporter

use crate::core::context::RunContext;
use crate::core::history::HistoryEntry;
use crate::core::validation::{ValidationReport, ValidationScope};
use crate::domain::records::{MatchDocument, StandingsDocument};
use crate::domain::{HealthScore, IssueType, MatchRefs, MigrateError, Result, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

const REPORT_PREFIX: &str = "quality-";

/// Health score changes smaller than this count as stable
const HEALTH_EPSILON: f64 = 0.05;

/// Migration progress of one record type
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeProgress {
    pub total: usize,
    pub migrated: usize,
    pub remaining: usize,
    pub progress_pct: f64,
}

impl TypeProgress {
    pub fn new(total: usize, migrated: usize) -> Self {
        let migrated = migrated.min(total);
        let progress_pct = if total == 0 {
            100.0
        } else {
            (1000.0 * migrated as f64 / total as f64).round() / 10.0
        };
        Self {
            total,
            migrated,
            remaining: total - migrated,
            progress_pct,
        }
    }

    pub fn of_matches(matches: &[MatchDocument]) -> Self {
        let migrated = matches
            .iter()
            .filter(|m| matches!(m.refs(), Ok(MatchRefs::Clubs { .. })))
            .count();
        Self::new(matches.len(), migrated)
    }

    pub fn of_standings(standings: &[StandingsDocument]) -> Self {
        let migrated = standings.iter().filter(|s| !s.needs_migration()).count();
        Self::new(standings.len(), migrated)
    }
}

/// Issue count of one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummary {
    #[serde(rename = "type")]
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    fn for_severity(severity: Severity) -> Self {
        match severity {
            Severity::Error => Self::High,
            Severity::Warning => Self::Medium,
            Severity::Info => Self::Low,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Stable,
    Declining,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Improving => "improving",
            Self::Stable => "stable",
            Self::Declining => "declining",
        };
        write!(f, "{s}")
    }
}

/// Change against the previous report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    pub previous_generated: DateTime<Utc>,
    pub health_delta: f64,
    pub issue_delta: i64,
    pub direction: TrendDirection,
}

impl Trend {
    pub fn between(previous: &QualityReport, current: &QualityReport) -> Self {
        let health_delta =
            ((current.health_score.value() - previous.health_score.value()) * 10.0).round() / 10.0;
        let issue_delta = current.total_issues as i64 - previous.total_issues as i64;

        let direction = if health_delta > HEALTH_EPSILON {
            TrendDirection::Improving
        } else if health_delta < -HEALTH_EPSILON {
            TrendDirection::Declining
        } else {
            match issue_delta {
                d if d < 0 => TrendDirection::Improving,
                d if d > 0 => TrendDirection::Declining,
                _ => TrendDirection::Stable,
            }
        };

        Self {
            previous_generated: previous.last_generated,
            health_delta,
            issue_delta,
            direction,
        }
    }
}

/// Runs recorded within the report period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub total_runs: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_operation: BTreeMap<String, usize>,
}

impl ActivitySummary {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        let mut summary = Self {
            total_runs: entries.len(),
            ..Self::default()
        };
        for entry in entries {
            *summary.by_status.entry(entry.status.to_string()).or_insert(0) += 1;
            *summary
                .by_operation
                .entry(entry.operation.to_string())
                .or_insert(0) += 1;
        }
        summary
    }
}

/// Persisted data quality report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub last_generated: DateTime<Utc>,
    pub period_days: u32,
    pub matches: TypeProgress,
    pub standings: TypeProgress,
    pub issues: Vec<IssueSummary>,
    pub total_issues: usize,
    pub health_score: HealthScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub activity: ActivitySummary,
}

impl QualityReport {
    /// Assemble a report from its inputs
    pub fn build(
        generated: DateTime<Utc>,
        period_days: u32,
        matches: TypeProgress,
        standings: TypeProgress,
        validation: &ValidationReport,
        activity: ActivitySummary,
    ) -> Self {
        let issues = summarize_issues(validation);
        let recommendations = recommend(&issues, &matches, &standings);
        Self {
            last_generated: generated,
            period_days,
            matches,
            standings,
            total_issues: validation.issues.len(),
            issues,
            health_score: validation.health_score,
            trend: None,
            recommendations,
            activity,
        }
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📈 Data Quality Report\n");
        summary.push_str(&format!("  Generated: {}\n", self.last_generated));
        summary.push_str(&format!("  Health score: {}\n", self.health_score));
        for (label, progress) in [("Matches", &self.matches), ("Standings", &self.standings)] {
            summary.push_str(&format!(
                "  {label}: {}/{} migrated ({:.1}%), {} remaining\n",
                progress.migrated, progress.total, progress.progress_pct, progress.remaining
            ));
        }

        match &self.trend {
            Some(trend) => summary.push_str(&format!(
                "  Trend: {} (health {:+.1}, issues {:+}) since {}\n",
                trend.direction, trend.health_delta, trend.issue_delta, trend.previous_generated
            )),
            None => summary.push_str("  Trend: no previous report in period\n"),
        }

        if !self.issues.is_empty() {
            summary.push_str("\n🔎 Issues:\n");
            for issue in &self.issues {
                summary.push_str(&format!(
                    "  {:<22} {:>6}  {}\n",
                    issue.issue_type.as_str(),
                    issue.count,
                    issue.description
                ));
            }
        }

        if !self.recommendations.is_empty() {
            summary.push_str("\n💡 Recommendations:\n");
            for rec in &self.recommendations {
                summary.push_str(&format!("  [{}] {}\n", rec.priority, rec.message));
            }
        }

        summary.push_str(&format!(
            "\n  Runs in the last {} day(s): {}\n",
            self.period_days, self.activity.total_runs
        ));
        for (status, count) in &self.activity.by_status {
            summary.push_str(&format!("    {status}: {count}\n"));
        }
        summary
    }
}

fn summarize_issues(validation: &ValidationReport) -> Vec<IssueSummary> {
    let mut by_type: BTreeMap<IssueType, (Severity, usize)> = BTreeMap::new();
    for issue in &validation.issues {
        let slot = by_type
            .entry(issue.issue_type)
            .or_insert((issue.severity, 0));
        slot.0 = slot.0.max(issue.severity);
        slot.1 += 1;
    }
    by_type
        .into_iter()
        .map(|(issue_type, (severity, count))| IssueSummary {
            issue_type,
            severity,
            description: issue_type.description().to_string(),
            count,
        })
        .collect()
}

fn advice(issue_type: IssueType) -> &'static str {
    match issue_type {
        IssueType::MixedReference => "Fix records that reference teams and clubs at once",
        IssueType::MissingReference => "Run cleanup to remove matches without participants",
        IssueType::IncompleteReference => "Complete or remove matches with one participant",
        IssueType::NameMismatch => "Re-run the standings migration to sync display names",
        IssueType::OrphanedReference => "Run cleanup to remove orphaned records",
        IssueType::UnmappableTeam => "Add mapping entries for unmapped team names",
        IssueType::InvalidClubLeague => "Activate the clubs or assign them to the league",
        IssueType::SelfPlay => "Correct the team to club mapping causing self-play",
        IssueType::CrossInconsistency => "Migrate standings so every match club has a table row",
        IssueType::DuplicateEntry => "Run cleanup to remove duplicate standings rows",
    }
}

fn recommend(
    issues: &[IssueSummary],
    matches: &TypeProgress,
    standings: &TypeProgress,
) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = issues
        .iter()
        .map(|issue| Recommendation {
            priority: Priority::for_severity(issue.severity),
            issue_type: Some(issue.issue_type),
            count: issue.count,
            message: format!("{} ({} found)", advice(issue.issue_type), issue.count),
        })
        .collect();

    for (label, progress) in [("matches", matches), ("standings", standings)] {
        if progress.remaining > 0 {
            recommendations.push(Recommendation {
                priority: Priority::Low,
                issue_type: None,
                count: progress.remaining,
                message: format!(
                    "Run `clubmigrate migrate --type {label}` for {} remaining record(s)",
                    progress.remaining
                ),
            });
        }
    }

    recommendations.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.count.cmp(&a.count)));
    recommendations
}

/// Generates and stores quality reports
pub struct QualityReporter {
    ctx: RunContext,
    directory: PathBuf,
}

impl QualityReporter {
    pub fn new(ctx: RunContext) -> Self {
        let directory = PathBuf::from(&ctx.report.directory);
        Self { ctx, directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Generate, compare and persist a report covering `period_days`
    ///
    /// # Errors
    ///
    /// Returns a store error if records cannot be read and
    /// [`MigrateError::Io`] if the report cannot be written.
    pub async fn generate(&self, period_days: u32) -> Result<QualityReport> {
        let now = Utc::now();
        let store = self.ctx.store.as_ref();

        let reference = self.ctx.load_reference().await?;
        let validation = self
            .ctx
            .validator(reference)
            .validate_all(&ValidationScope::all())
            .await?;

        let matches = self.ctx.retry.run(|| store.list_matches(None)).await?;
        let standings = self.ctx.retry.run(|| store.list_standings(None)).await?;
        let activity = self.ctx.history.within_period(period_days, now).await?;

        let mut report = QualityReport::build(
            now,
            period_days,
            TypeProgress::of_matches(&matches),
            TypeProgress::of_standings(&standings),
            &validation,
            ActivitySummary::from_entries(&activity),
        );

        if let Some(previous) = self.previous_report(now, period_days).await? {
            report.trend = Some(Trend::between(&previous, &report));
        }

        let path = self.save(&report).await?;
        tracing::info!(
            path = %path.display(),
            health_score = report.health_score.value(),
            issues = report.total_issues,
            trend = report.trend.as_ref().map(|t| t.direction.to_string()).unwrap_or_default(),
            "Quality report generated"
        );
        Ok(report)
    }

    /// Newest stored report generated within `period_days` before `now`
    pub async fn previous_report(
        &self,
        now: DateTime<Utc>,
        period_days: u32,
    ) -> Result<Option<QualityReport>> {
        let since = now - Duration::days(i64::from(period_days));
        let mut newest: Option<QualityReport> = None;

        for report in self.stored_reports().await? {
            if report.last_generated < since || report.last_generated >= now {
                continue;
            }
            if newest
                .as_ref()
                .map_or(true, |n| report.last_generated > n.last_generated)
            {
                newest = Some(report);
            }
        }
        Ok(newest)
    }

    async fn stored_reports(&self) -> Result<Vec<QualityReport>> {
        let mut dir = match tokio::fs::read_dir(&self.directory).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports = Vec::new();
        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().to_string();
            if !name.starts_with(REPORT_PREFIX) || !name.ends_with(".json") {
                continue;
            }
            let parsed = tokio::fs::read_to_string(item.path())
                .await
                .map_err(MigrateError::from)
                .and_then(|raw| serde_json::from_str::<QualityReport>(&raw).map_err(MigrateError::from));
            match parsed {
                Ok(report) => reports.push(report),
                Err(e) => tracing::warn!(file = %name, error = %e, "Skipping unreadable report"),
            }
        }
        Ok(reports)
    }

    async fn save(&self, report: &QualityReport) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(format!(
            "{REPORT_PREFIX}{}.json",
            report.last_generated.format("%Y%m%dT%H%M%S%3fZ")
        ));
        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&path, json).await?;
        Ok(path)
    }
}
