use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const AUTO_DETECTED_DESCRIPTION: &str = "Auto-detected from email thread";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub project_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub related_keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        keywords: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            project_id: uuid::Uuid::new_v4().to_string(),
            project_name: name.into(),
            description: description.into(),
            related_keywords: keywords,
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match against the name, then each keyword
    pub fn matches_term(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.project_name.to_lowercase().contains(&term)
            || self
                .related_keywords
                .iter()
                .any(|k| k.to_lowercase().contains(&term))
    }
}

/// A project the model noticed in an email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectMention {
    pub project_name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}
