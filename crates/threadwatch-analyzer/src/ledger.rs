use chrono::{DateTime, Utc};
use threadwatch_types::Issue;

use crate::priority::score_issue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved,
    /// Known id, but the issue is no longer open
    AlreadyClosed,
    UnknownId,
}

/// Issues found in one thread so far, in detection order.
#[derive(Debug, Clone, Default)]
pub struct IssueLedger {
    issues: Vec<Issue>,
}

impl IssueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.issues.iter().filter(|i| i.is_open()).count()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn resolve(&mut self, issue_id: &str, evidence: &str, date: DateTime<Utc>) -> Resolution {
        match self.issues.iter_mut().find(|i| i.issue_id == issue_id) {
            None => Resolution::UnknownId,
            Some(issue) => {
                if issue.resolve(evidence, date) {
                    Resolution::Resolved
                } else {
                    Resolution::AlreadyClosed
                }
            }
        }
    }

    /// Score open issues against `now` and link unlinked issues to `project_id`.
    pub fn finalize(mut self, now: DateTime<Utc>, project_id: Option<&str>) -> Vec<Issue> {
        for issue in &mut self.issues {
            score_issue(issue, now);
            if let Some(id) = project_id {
                if issue.project_id.is_empty() {
                    issue.project_id = id.to_string();
                }
            }
        }
        self.issues
    }
}
