//! Data quality reports
//!
//! Reports combine validation findings, migration progress and run activity
//! and are kept as JSON files so each report can be compared with the
//! previous one.

pub mod reporter;

pub use reporter::{
    ActivitySummary, IssueSummary, Priority, QualityReport, QualityReporter, Recommendation,
    Trend, TrendDirection, TypeProgress,
};
