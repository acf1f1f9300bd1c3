//! Reading batch inputs and writing the run report.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

use threadwatch_types::{Colleague, EmailThread};

pub async fn load_threads(path: &Path) -> Result<Vec<EmailThread>> {
    let mut threads: Vec<EmailThread> = read_json(path).await?;
    for thread in &mut threads {
        fill_participants(thread);
    }
    tracing::info!(
        path = %path.display(),
        threads = threads.len(),
        emails = threads.iter().map(|t| t.emails.len()).sum::<usize>(),
        "Loaded threads"
    );
    Ok(threads)
}

pub async fn load_roster(path: &Path) -> Result<Vec<Colleague>> {
    let roster: Vec<Colleague> = read_json(path).await?;
    tracing::info!(path = %path.display(), colleagues = roster.len(), "Loaded roster");
    Ok(roster)
}

/// Pretty JSON, creating parent directories as needed
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

// Threads exported without a participant list get one from their senders.
fn fill_participants(thread: &mut EmailThread) {
    if !thread.participants.is_empty() {
        return;
    }
    for email in &thread.emails {
        let identity = format!("{} <{}>", email.from_name, email.from_email);
        if !thread.participants.contains(&identity) {
            thread.participants.push(identity);
        }
    }
}
