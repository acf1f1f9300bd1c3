use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use threadwatch_types::AnalyzerConfig;

pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an analyst assisting a portfolio director. You read project email threads one email at a time and report only what needs the director's attention.

Report two kinds of issues:
- UNRESOLVED_ACTION: someone was asked a question or given a task and the thread shows no answer or delivery.
- EMERGING_RISK: a problem, delay, dependency or concern that could hurt the project if nobody acts.

Rules:
1. Only report an issue when the CURRENT email contains evidence for it. The evidence_quote must be copied word for word from the current email body.
2. Never report an issue that is already in the list of open issues. If the current email answers or completes one of them, list it under resolved_issues using its exact id.
3. Severity is an integer from 1 (cosmetic) to 10 (project-threatening). Confidence is a number from 0.0 to 1.0.
4. Titles are short (5 to 200 characters). Evidence quotes are at least 10 characters.
5. Keep thread_summary up to date: it replaces the previous summary entirely.
6. List every project the email refers to under project_mentions, preferring the names of existing projects.

Reply with a single JSON object and nothing else, exactly in this shape:
{
  "new_issues": [
    {"issue_type": "UNRESOLVED_ACTION" | "EMERGING_RISK", "severity": 1-10, "title": "...", "description": "...", "evidence_quote": "...", "confidence": 0.0-1.0}
  ],
  "resolved_issues": [
    {"issue_id": "...", "resolution_evidence": "...", "confidence": 0.0-1.0}
  ],
  "thread_summary": {"key_points": ["..."], "topics_discussed": ["..."], "participants_active": ["..."]},
  "project_mentions": [
    {"project_name": "...", "keywords": ["..."]}
  ]
}
Do not add any other fields."#;

pub const DEFAULT_USER_TEMPLATE: &str = r#"## Project: <project_name>
## Thread: <subject>
## Email <email_number> of <total_emails>

### Open issues from earlier emails
<previous_issues>

### Thread summary so far
<thread_summary>

### Team
<colleagues_context>

### Known projects
<existing_projects>

### Current email
**From:** <from_name> <<from_email>>
**To:** <to_emails>
<cc_line>
**Date:** <email_date>

<email_body>

Analyze the current email and reply with the JSON object described in your instructions."#;

/// Values for the user template, one per `<slot>`
#[derive(Debug, Clone, Default)]
pub struct PromptSlots {
    values: HashMap<&'static str, String>,
}

impl PromptSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, slot: &'static str, value: impl Into<String>) -> Self {
        self.values.insert(slot, value.into());
        self
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.values.get(slot).map(String::as_str)
    }
}

/// System prompt plus user template, built in or read from disk.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub user: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            user: DEFAULT_USER_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    /// Built-in prompts, replaced by any override file named in the config
    pub fn load(config: &AnalyzerConfig) -> Result<Self> {
        let mut templates = Self::default();
        if let Some(path) = &config.system_prompt_path {
            templates.system = read_prompt(path)?;
        }
        if let Some(path) = &config.user_template_path {
            templates.user = read_prompt(path)?;
        }
        Ok(templates)
    }

    pub fn render_user(&self, slots: &PromptSlots) -> String {
        render(&self.user, slots)
    }
}

fn read_prompt(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt file {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// Single-pass substitution of `<slot>` markers.
///
/// Inserted values are never scanned again, so an email body that happens to
/// contain `<email_body>` stays literal. Unknown markers are left untouched.
pub fn render(template: &str, slots: &PromptSlots) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let slot = after
            .find('>')
            .map(|end| &after[..end])
            .filter(|name| is_slot_name(name))
            .and_then(|name| slots.get(name).map(|value| (name, value)));

        match slot {
            Some((name, value)) => {
                out.push_str(value);
                rest = &after[name.len() + 1..];
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_slot_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_render_fills_known_slots() {
        let slots = PromptSlots::new().set("name", "Ana").set("count", "3");
        assert_eq!(render("Hi <name>, you have <count> items", &slots), "Hi Ana, you have 3 items");
    }

    #[test]
    fn test_render_leaves_unknown_markers_and_angle_brackets() {
        let slots = PromptSlots::new().set("from_email", "ana@example.com");
        assert_eq!(
            render("<Ana> <<from_email>> a < b <missing>", &slots),
            "<Ana> <ana@example.com> a < b <missing>"
        );
    }

    #[test]
    fn test_inserted_values_are_not_rescanned() {
        let slots = PromptSlots::new()
            .set("email_body", "literal <subject> marker")
            .set("subject", "Budget");
        assert_eq!(
            render("<subject>: <email_body>", &slots),
            "Budget: literal <subject> marker"
        );
    }

    #[test]
    fn test_default_user_template_uses_every_slot() {
        for slot in [
            "project_name",
            "subject",
            "email_number",
            "total_emails",
            "previous_issues",
            "thread_summary",
            "colleagues_context",
            "existing_projects",
            "from_name",
            "from_email",
            "to_emails",
            "cc_line",
            "email_date",
            "email_body",
        ] {
            assert!(
                DEFAULT_USER_TEMPLATE.contains(&format!("<{slot}>")),
                "missing <{slot}>"
            );
        }
    }

    #[test]
    fn test_load_reads_override_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  Custom system prompt  ").unwrap();

        let config = AnalyzerConfig::new().with_system_prompt_path(file.path());
        let templates = PromptTemplates::load(&config).unwrap();

        assert_eq!(templates.system, "Custom system prompt");
        assert_eq!(templates.user, DEFAULT_USER_TEMPLATE);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let config = AnalyzerConfig::new().with_user_template_path("/nonexistent/prompt.txt");
        let err = PromptTemplates::load(&config).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/prompt.txt"));
    }
}
