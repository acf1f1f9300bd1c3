use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use threadwatch_types::{Issue, IssueStatus, Project};

/// Aggregate view over the store, as shown at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreStatistics {
    pub total_issues: usize,
    pub open_issues: usize,
    pub resolved_issues: usize,
    pub total_threads: usize,
    pub total_projects: usize,
    /// Distinct project names, sorted
    pub projects: Vec<String>,
    /// Mean priority of open issues, rounded to two decimals
    pub avg_priority_open: f64,
    pub issues_by_type: BTreeMap<String, usize>,
    pub total_analysis_runs: usize,
}

impl StoreStatistics {
    pub(crate) fn compute(
        issues: &[Issue],
        projects: &[Project],
        total_threads: usize,
        total_analysis_runs: usize,
    ) -> Self {
        let open: Vec<&Issue> = issues.iter().filter(|i| i.is_open()).collect();
        let resolved = issues
            .iter()
            .filter(|i| i.status == IssueStatus::Resolved)
            .count();

        let avg_priority_open = if open.is_empty() {
            0.0
        } else {
            let mean = open.iter().map(|i| i.priority_score).sum::<f64>() / open.len() as f64;
            (mean * 100.0).round() / 100.0
        };

        let mut issues_by_type = BTreeMap::new();
        for issue in issues {
            *issues_by_type
                .entry(issue.issue_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        let names: BTreeSet<String> = projects.iter().map(|p| p.project_name.clone()).collect();

        Self {
            total_issues: issues.len(),
            open_issues: open.len(),
            resolved_issues: resolved,
            total_threads,
            total_projects: names.len(),
            projects: names.into_iter().collect(),
            avg_priority_open,
            issues_by_type,
            total_analysis_runs,
        }
    }
}
