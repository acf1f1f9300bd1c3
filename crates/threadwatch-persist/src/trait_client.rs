use async_trait::async_trait;
use threadwatch_types::{AnalysisRun, Issue, Project, ThreadAnalysisRecord};

use crate::dbs::document::StoreStatistics;
use crate::error::Result;

/// Trait for persistence operations
///
/// Every save is an upsert keyed by the record's id, so repeating a save is harmless.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn save_issue(&self, issue: &Issue) -> Result<()>;

    /// Upsert; an existing project gets a fresh `updated_at`
    async fn save_project(&self, project: &Project) -> Result<()>;

    async fn get_all_projects(&self) -> Result<Vec<Project>>;

    /// Projects whose name or any keyword contains `term`, ignoring case
    async fn search_projects(&self, term: &str) -> Result<Vec<Project>>;

    async fn get_project_by_id(&self, project_id: &str) -> Result<Option<Project>>;

    async fn save_thread_record(&self, record: &ThreadAnalysisRecord) -> Result<()>;

    async fn save_analysis_run(&self, run: &AnalysisRun) -> Result<()>;

    async fn get_all_issues(&self) -> Result<Vec<Issue>>;

    /// Open issues, highest priority first
    async fn get_open_issues(&self) -> Result<Vec<Issue>>;

    async fn get_resolved_issues(&self) -> Result<Vec<Issue>>;

    async fn get_issues_by_project(&self, project_id: &str) -> Result<Vec<Issue>>;

    async fn get_all_thread_records(&self) -> Result<Vec<ThreadAnalysisRecord>>;

    async fn get_latest_analysis_run(&self) -> Result<Option<AnalysisRun>>;

    async fn get_statistics(&self) -> Result<StoreStatistics>;
}
