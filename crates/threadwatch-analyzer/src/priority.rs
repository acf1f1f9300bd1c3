use chrono::{DateTime, Utc};
use threadwatch_types::Issue;

pub const SEVERITY_WEIGHT: f64 = 3.0;
pub const AGE_WEIGHT: f64 = 0.5;
pub const CONFIDENCE_WEIGHT: f64 = 2.0;

/// `severity × 3 + days_outstanding × 0.5 + confidence × 2`
pub fn priority_score(severity: u8, days_outstanding: i64, confidence: f64) -> f64 {
    f64::from(severity) * SEVERITY_WEIGHT
        + days_outstanding as f64 * AGE_WEIGHT
        + confidence * CONFIDENCE_WEIGHT
}

/// Whole days between the originating email and `now`
pub fn days_outstanding(email_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - email_date).num_days()
}

/// Snapshot age and priority on an open issue. Other statuses are left alone.
pub fn score_issue(issue: &mut Issue, now: DateTime<Utc>) {
    if !issue.is_open() {
        return;
    }
    issue.days_outstanding = days_outstanding(issue.email_date, now);
    issue.priority_score = priority_score(issue.severity, issue.days_outstanding, issue.confidence);
}
