//! Validation results and the report schema

use crate::domain::{HealthScore, IssueType, Severity, ValidationIssue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of one validation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassResult {
    pub issues: Vec<ValidationIssue>,
    pub valid_count: usize,
    pub total_count: usize,
    /// Ids of records carrying an error or warning issue
    pub invalid_ids: BTreeSet<String>,
}

impl PassResult {
    /// Build a pass result from the checked record count and its issues
    pub fn from_issues(total_count: usize, issues: Vec<ValidationIssue>) -> Self {
        let invalid_ids: BTreeSet<String> = issues
            .iter()
            .filter(|i| i.invalidates())
            .filter_map(|i| i.record_id.clone())
            .collect();
        Self {
            valid_count: total_count.saturating_sub(invalid_ids.len()),
            total_count,
            issues,
            invalid_ids,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn errors(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warnings(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn health(&self) -> HealthScore {
        HealthScore::from_counts(self.valid_count, self.total_count)
    }

    /// Issues attached to one record
    pub fn issues_for<'a>(&'a self, record_id: &'a str) -> impl Iterator<Item = &'a ValidationIssue> {
        self.issues
            .iter()
            .filter(move |i| i.record_id.as_deref() == Some(record_id))
    }

    pub fn summary(&self) -> PassSummary {
        PassSummary {
            total: self.total_count,
            valid: self.valid_count,
            errors: self.errors(),
            warnings: self.warnings(),
            info: self.count(Severity::Info),
            health_score: self.health(),
        }
    }
}

/// Per-pass counters in the report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    pub total: usize,
    pub valid: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    pub health_score: HealthScore,
}

/// Merged result of the match, standings and cross passes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub last_run: DateTime<Utc>,
    pub valid: usize,
    pub errors: usize,
    pub warnings: usize,
    pub total: usize,
    pub health_score: HealthScore,
    pub issues: Vec<ValidationIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<PassSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standings: Option<PassSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross: Option<PassSummary>,
}

impl ValidationReport {
    /// Merge pass results
    ///
    /// Records are counted once per collection. Cross issues are raised on
    /// matches, so they make the match invalid.
    pub fn from_passes(
        matches: Option<PassResult>,
        standings: Option<PassResult>,
        cross: Option<PassResult>,
    ) -> Self {
        let mut invalid_matches: BTreeSet<String> = BTreeSet::new();
        let mut total = 0;
        let mut valid = 0;
        let mut issues = Vec::new();

        if let Some(pass) = &matches {
            invalid_matches.extend(pass.invalid_ids.iter().cloned());
            if let Some(cross) = &cross {
                invalid_matches.extend(cross.invalid_ids.iter().cloned());
            }
            total += pass.total_count;
            valid += pass.total_count.saturating_sub(invalid_matches.len());
            issues.extend(pass.issues.iter().cloned());
        }
        if let Some(pass) = &standings {
            total += pass.total_count;
            valid += pass.valid_count;
            issues.extend(pass.issues.iter().cloned());
        }
        if let Some(pass) = &cross {
            issues.extend(pass.issues.iter().cloned());
        }

        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
        let warnings = issues.iter().filter(|i| i.severity == Severity::Warning).count();

        Self {
            last_run: Utc::now(),
            valid,
            errors,
            warnings,
            total,
            health_score: HealthScore::from_counts(valid, total),
            issues,
            matches: matches.as_ref().map(PassResult::summary),
            standings: standings.as_ref().map(PassResult::summary),
            cross: cross.as_ref().map(PassResult::summary),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Issue counts per type
    pub fn counts_by_type(&self) -> BTreeMap<IssueType, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.issue_type).or_insert(0) += 1;
        }
        counts
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📊 Validation Report\n");
        summary.push_str(&format!("  Run at: {}\n", self.last_run));
        summary.push_str(&format!("  Records checked: {}\n", self.total));
        summary.push_str(&format!("  ✅ Valid: {}\n", self.valid));
        summary.push_str(&format!("  ❌ Errors: {}\n", self.errors));
        summary.push_str(&format!("  ⚠️  Warnings: {}\n", self.warnings));
        summary.push_str(&format!("  Health score: {}\n", self.health_score));

        for (label, pass) in [
            ("Matches", &self.matches),
            ("Standings", &self.standings),
            ("Cross-consistency", &self.cross),
        ] {
            if let Some(pass) = pass {
                summary.push_str(&format!(
                    "  {label}: {}/{} valid, {} error(s), {} warning(s), {} info\n",
                    pass.valid, pass.total, pass.errors, pass.warnings, pass.info
                ));
            }
        }

        let counts = self.counts_by_type();
        if !counts.is_empty() {
            summary.push_str("\n🔎 Issues by type:\n");
            for (issue_type, count) in counts {
                summary.push_str(&format!(
                    "  {:<22} {:>6}  ({})\n",
                    issue_type.as_str(),
                    count,
                    issue_type.default_severity()
                ));
            }
        }

        summary
    }
}
