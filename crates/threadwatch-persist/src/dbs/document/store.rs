use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use threadwatch_types::{AnalysisRun, Issue, IssueStatus, Project, ThreadAnalysisRecord};
use tokio::sync::RwLock;

use super::statistics::StoreStatistics;
use crate::error::{PersistError, Result};
use crate::trait_client::PersistenceClient;

/// On-disk layout: one JSON object holding four tables in insertion order.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct Tables {
    issues: Vec<Issue>,
    projects: Vec<Project>,
    threads: Vec<ThreadAnalysisRecord>,
    runs: Vec<AnalysisRun>,
}

/// JSON document store.
///
/// Holds everything in memory; when opened on a path the whole file is
/// rewritten after each write, so a crash loses at most the write in flight.
#[derive(Debug)]
pub struct DocumentStore {
    tables: RwLock<Tables>,
    path: Option<PathBuf>,
}

impl DocumentStore {
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            path: None,
        }
    }

    /// Open a file-backed store, creating it on first write if missing
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Tables::default(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| PersistError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Tables::default(),
            Err(e) => return Err(e.into()),
        };

        tracing::info!(
            path = %path.display(),
            issues = tables.issues.len(),
            projects = tables.projects.len(),
            threads = tables.threads.len(),
            "Opened document store"
        );

        Ok(Self {
            tables: RwLock::new(tables),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Drop every record in all four tables
    pub async fn clear_all(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        *tables = Tables::default();
        self.flush(&tables).await
    }

    // Called with the write guard held so file contents follow write order.
    async fn flush(&self, tables: &Tables) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let bytes = serde_json::to_vec_pretty(tables)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Flushed document store");
        Ok(())
    }
}

fn upsert<T>(rows: &mut Vec<T>, row: T, same: impl Fn(&T) -> bool) {
    match rows.iter_mut().find(|r| same(r)) {
        Some(existing) => *existing = row,
        None => rows.push(row),
    }
}

#[async_trait]
impl PersistenceClient for DocumentStore {
    async fn save_issue(&self, issue: &Issue) -> Result<()> {
        let mut tables = self.tables.write().await;
        upsert(&mut tables.issues, issue.clone(), |i| i.issue_id == issue.issue_id);
        self.flush(&tables).await
    }

    async fn save_project(&self, project: &Project) -> Result<()> {
        let mut tables = self.tables.write().await;
        let mut row = project.clone();
        if tables
            .projects
            .iter()
            .any(|p| p.project_id == project.project_id)
        {
            row.updated_at = Utc::now();
        }
        upsert(&mut tables.projects, row, |p| p.project_id == project.project_id);
        self.flush(&tables).await
    }

    async fn get_all_projects(&self) -> Result<Vec<Project>> {
        Ok(self.tables.read().await.projects.clone())
    }

    async fn search_projects(&self, term: &str) -> Result<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .filter(|p| p.matches_term(term))
            .cloned()
            .collect())
    }

    async fn get_project_by_id(&self, project_id: &str) -> Result<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.project_id == project_id)
            .cloned())
    }

    async fn save_thread_record(&self, record: &ThreadAnalysisRecord) -> Result<()> {
        let mut tables = self.tables.write().await;
        upsert(&mut tables.threads, record.clone(), |t| t.thread_id == record.thread_id);
        self.flush(&tables).await
    }

    async fn save_analysis_run(&self, run: &AnalysisRun) -> Result<()> {
        let mut tables = self.tables.write().await;
        upsert(&mut tables.runs, run.clone(), |r| r.run_id == run.run_id);
        self.flush(&tables).await
    }

    async fn get_all_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.tables.read().await.issues.clone())
    }

    async fn get_open_issues(&self) -> Result<Vec<Issue>> {
        let tables = self.tables.read().await;
        let mut open: Vec<Issue> = tables.issues.iter().filter(|i| i.is_open()).cloned().collect();
        open.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        Ok(open)
    }

    async fn get_resolved_issues(&self) -> Result<Vec<Issue>> {
        let tables = self.tables.read().await;
        Ok(tables
            .issues
            .iter()
            .filter(|i| i.status == IssueStatus::Resolved)
            .cloned()
            .collect())
    }

    async fn get_issues_by_project(&self, project_id: &str) -> Result<Vec<Issue>> {
        let tables = self.tables.read().await;
        Ok(tables
            .issues
            .iter()
            .filter(|i| i.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_all_thread_records(&self) -> Result<Vec<ThreadAnalysisRecord>> {
        Ok(self.tables.read().await.threads.clone())
    }

    async fn get_latest_analysis_run(&self) -> Result<Option<AnalysisRun>> {
        let tables = self.tables.read().await;
        Ok(tables.runs.iter().max_by_key(|r| r.timestamp).cloned())
    }

    async fn get_statistics(&self) -> Result<StoreStatistics> {
        let tables = self.tables.read().await;
        Ok(StoreStatistics::compute(
            &tables.issues,
            &tables.projects,
            tables.threads.len(),
            tables.runs.len(),
        ))
    }
}
