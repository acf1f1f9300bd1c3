use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::summary::ThreadSummary;

/// Summary of one batch run, written once at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_threads: usize,
    pub total_emails: usize,
    pub total_issues_found: usize,
    pub total_issues_resolved: usize,
    pub total_api_calls: u64,
    pub total_tokens_used: u64,
    pub estimated_cost_usd: f64,
    /// Threads whose analysis aborted
    pub failed_threads: usize,
    pub execution_time_seconds: f64,
}

impl Default for AnalysisRun {
    fn default() -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            total_threads: 0,
            total_emails: 0,
            total_issues_found: 0,
            total_issues_resolved: 0,
            total_api_calls: 0,
            total_tokens_used: 0,
            estimated_cost_usd: 0.0,
            failed_threads: 0,
            execution_time_seconds: 0.0,
        }
    }
}

/// What a thread looked like once analysis finished
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadAnalysisRecord {
    pub thread_id: String,
    /// First linked project's name, otherwise the thread subject
    pub project_name: String,
    pub subject: String,
    pub total_emails: usize,
    pub participants: Vec<String>,
    pub first_email_date: DateTime<Utc>,
    pub last_email_date: DateTime<Utc>,
    pub final_summary: ThreadSummary,
    pub analyzed_at: DateTime<Utc>,
    /// Emails whose model step failed and contributed nothing
    #[serde(default)]
    pub failed_emails: usize,
}
