use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;
pub const MIN_EVIDENCE_CHARS: usize = 10;
pub const MIN_TITLE_CHARS: usize = 5;
pub const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    /// Someone was asked for something and has not delivered
    UnresolvedAction,
    /// A problem that may grow if nobody acts
    EmergingRisk,
}

impl IssueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedAction => "UNRESOLVED_ACTION",
            Self::EmergingRisk => "EMERGING_RISK",
        }
    }
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueStatus {
    #[default]
    Open,
    Resolved,
    /// Reserved; nothing transitions into it yet
    Monitoring,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IssueValidationError {
    #[error("severity {0} outside {MIN_SEVERITY}..={MAX_SEVERITY}")]
    Severity(u8),

    #[error("confidence {0} outside 0.0..=1.0")]
    Confidence(f64),

    #[error("evidence quote has {0} characters, need at least {MIN_EVIDENCE_CHARS}")]
    EvidenceTooShort(usize),

    #[error("title has {0} characters, need {MIN_TITLE_CHARS}..={MAX_TITLE_CHARS}")]
    Title(usize),
}

/// Everything needed to open an issue; checked by [`Issue::new`].
#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub thread_id: String,
    pub issue_type: IssueType,
    pub severity: u8,
    pub title: String,
    pub description: String,
    pub evidence_quote: String,
    pub confidence: f64,
    pub email_date: DateTime<Utc>,
    pub email_author: String,
    pub email_author_email: String,
    pub subject: String,
    pub participants: Vec<String>,
    pub contact_person: String,
    pub contact_person_email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub issue_id: String,
    pub thread_id: String,
    /// Empty until the thread links a project
    #[serde(default)]
    pub project_id: String,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    pub severity: u8,
    pub title: String,
    pub description: String,
    pub evidence_quote: String,
    pub confidence: f64,
    pub email_date: DateTime<Utc>,
    pub email_author: String,
    pub email_author_email: String,
    pub subject: String,
    pub participants: Vec<String>,
    pub contact_person: String,
    pub contact_person_email: String,
    pub resolution_evidence: Option<String>,
    pub resolution_date: Option<DateTime<Utc>>,
    pub days_outstanding: i64,
    pub priority_score: f64,
}

impl Issue {
    /// Open a new issue, rejecting out-of-range or thin input.
    pub fn new(draft: IssueDraft) -> Result<Self, IssueValidationError> {
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&draft.severity) {
            return Err(IssueValidationError::Severity(draft.severity));
        }
        if !(0.0..=1.0).contains(&draft.confidence) {
            return Err(IssueValidationError::Confidence(draft.confidence));
        }
        let evidence_chars = draft.evidence_quote.chars().count();
        if evidence_chars < MIN_EVIDENCE_CHARS {
            return Err(IssueValidationError::EvidenceTooShort(evidence_chars));
        }
        let title_chars = draft.title.chars().count();
        if !(MIN_TITLE_CHARS..=MAX_TITLE_CHARS).contains(&title_chars) {
            return Err(IssueValidationError::Title(title_chars));
        }

        Ok(Self {
            issue_id: uuid::Uuid::new_v4().to_string(),
            thread_id: draft.thread_id,
            project_id: String::new(),
            issue_type: draft.issue_type,
            status: IssueStatus::Open,
            severity: draft.severity,
            title: draft.title,
            description: draft.description,
            evidence_quote: draft.evidence_quote,
            confidence: draft.confidence,
            email_date: draft.email_date,
            email_author: draft.email_author,
            email_author_email: draft.email_author_email,
            subject: draft.subject,
            participants: draft.participants,
            contact_person: draft.contact_person,
            contact_person_email: draft.contact_person_email,
            resolution_evidence: None,
            resolution_date: None,
            days_outstanding: 0,
            priority_score: 0.0,
        })
    }

    pub fn is_open(&self) -> bool {
        self.status == IssueStatus::Open
    }

    /// Close an open issue. Returns false, changing nothing, for any other status.
    pub fn resolve(&mut self, evidence: impl Into<String>, date: DateTime<Utc>) -> bool {
        if !self.is_open() {
            return false;
        }
        self.status = IssueStatus::Resolved;
        self.resolution_evidence = Some(evidence.into());
        self.resolution_date = Some(date);
        true
    }
}
