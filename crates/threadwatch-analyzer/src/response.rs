//! Shape the model must reply with. Any field not listed here rejects the reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use threadwatch_types::{IssueType, ProjectMention, ThreadSummary};

use crate::error::ResponseError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisResponse {
    pub new_issues: Vec<NewIssueData>,
    pub resolved_issues: Vec<ResolvedIssueData>,
    pub thread_summary: ThreadSummary,
    pub project_mentions: Vec<ProjectMention>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewIssueData {
    pub issue_type: IssueType,
    /// Whole number in 1..=10; `7.0` is accepted, `7.5` is not
    pub severity: f64,
    pub title: String,
    pub description: String,
    pub evidence_quote: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolvedIssueData {
    pub issue_id: String,
    pub resolution_evidence: String,
    pub confidence: f64,
}

impl AnalysisResponse {
    /// Deserialize and range-check a reply in one go
    pub fn parse(data: Value) -> Result<Self, ResponseError> {
        let response: Self = serde_json::from_value(data)?;
        response.validate()?;
        Ok(response)
    }

    pub fn validate(&self) -> Result<(), ResponseError> {
        for issue in &self.new_issues {
            check_severity(issue.severity)?;
            check_confidence(issue.confidence)?;
        }
        for resolved in &self.resolved_issues {
            check_confidence(resolved.confidence)?;
        }
        Ok(())
    }
}

impl NewIssueData {
    /// Severity after [`AnalysisResponse::validate`] has passed
    pub fn severity_u8(&self) -> u8 {
        self.severity as u8
    }
}

fn check_severity(value: f64) -> Result<(), ResponseError> {
    if value.fract() == 0.0 && (1.0..=10.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range("severity", value))
    }
}

fn check_confidence(value: f64) -> Result<(), ResponseError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(out_of_range("confidence", value))
    }
}

fn out_of_range(field: &'static str, value: impl ToString) -> ResponseError {
    ResponseError::OutOfRange {
        field,
        value: value.to_string(),
    }
}
