use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One message of a thread, as handed over by the parsing collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub to_emails: Vec<String>,
    #[serde(default)]
    pub cc_emails: Vec<String>,
    /// Parsed send time, used for ordering and age
    pub date: DateTime<Utc>,
    /// Date header exactly as written in the source
    #[serde(default)]
    pub date_raw: String,
    pub subject: String,
    pub body: String,
}

impl Email {
    /// The raw header when present, otherwise the parsed instant
    pub fn display_date(&self) -> String {
        if self.date_raw.trim().is_empty() {
            self.date.format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            self.date_raw.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailThread {
    #[serde(default = "new_thread_id")]
    pub thread_id: String,
    pub subject: String,
    #[serde(default)]
    pub project_name: String,
    /// Identity strings, usually `Name <address>`
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default)]
    pub emails: Vec<Email>,
}

fn new_thread_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl EmailThread {
    pub fn new(subject: impl Into<String>, emails: Vec<Email>) -> Self {
        Self {
            thread_id: new_thread_id(),
            subject: subject.into(),
            project_name: String::new(),
            participants: Vec::new(),
            emails,
        }
    }

    /// Emails sorted by send time. Input order is not trusted; ties keep it.
    pub fn chronological(&self) -> Vec<&Email> {
        let mut sorted: Vec<&Email> = self.emails.iter().collect();
        sorted.sort_by_key(|e| e.date);
        sorted
    }

    pub fn first_email_date(&self) -> Option<DateTime<Utc>> {
        self.emails.iter().map(|e| e.date).min()
    }

    pub fn last_email_date(&self) -> Option<DateTime<Utc>> {
        self.emails.iter().map(|e| e.date).max()
    }
}
