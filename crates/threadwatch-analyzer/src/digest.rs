//! Prose renderings of accumulated state for the user prompt.

use threadwatch_types::{Colleague, Issue, Project, ThreadSummary};

pub const NO_PREVIOUS_ISSUES: &str = "None";
pub const ALL_ISSUES_RESOLVED: &str = "None (all previous issues have been resolved)";
pub const NO_SUMMARY: &str = "No summary yet (this is the first email)";
pub const NO_COLLEAGUES: &str = "No colleagues data available.";
pub const NO_PROJECTS: &str = "No existing projects.";

/// Numbered list of OPEN issues with their ids, so the model can refer back.
pub fn open_issues(issues: &[Issue], snippet_chars: usize) -> String {
    if issues.is_empty() {
        return NO_PREVIOUS_ISSUES.to_string();
    }

    let open: Vec<&Issue> = issues.iter().filter(|i| i.is_open()).collect();
    if open.is_empty() {
        return ALL_ISSUES_RESOLVED.to_string();
    }

    open.iter()
        .enumerate()
        .map(|(n, issue)| {
            format!(
                "{}. [{}] {}\n   Type: {}\n   First seen: {}\n   Evidence: \"{}\"",
                n + 1,
                issue.issue_id,
                issue.title,
                issue.issue_type,
                issue.email_date.format("%Y-%m-%d"),
                snippet(&issue.evidence_quote, snippet_chars),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn summary(summary: &ThreadSummary) -> String {
    if summary.is_empty() {
        return NO_SUMMARY.to_string();
    }

    let mut parts = vec![format!(
        "Key Points:\n{}",
        summary
            .key_points
            .iter()
            .map(|p| format!("  - {p}"))
            .collect::<Vec<_>>()
            .join("\n")
    )];
    if !summary.topics_discussed.is_empty() {
        parts.push(format!("Topics: {}", summary.topics_discussed.join(", ")));
    }
    if !summary.participants_active.is_empty() {
        parts.push(format!(
            "Active Participants: {}",
            summary.participants_active.join(", ")
        ));
    }
    parts.join("\n\n")
}

pub fn roster(colleagues: &[Colleague]) -> String {
    if colleagues.is_empty() {
        return NO_COLLEAGUES.to_string();
    }
    let mut lines = vec!["Team Members:".to_string()];
    lines.extend(
        colleagues
            .iter()
            .map(|c| format!("- {} ({}): {}", c.name, c.email, c.role)),
    );
    lines.join("\n")
}

pub fn known_projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return NO_PROJECTS.to_string();
    }
    let mut lines = vec!["Existing Projects in Database:".to_string()];
    lines.extend(projects.iter().map(|p| {
        let keywords = if p.related_keywords.is_empty() {
            "none".to_string()
        } else {
            p.related_keywords.join(", ")
        };
        format!("- {} (keywords: {})", p.project_name, keywords)
    }));
    lines.join("\n")
}

fn snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
