pub mod colleague;
pub mod config;
pub mod email;
pub mod issue;
pub mod project;
pub mod run;
pub mod summary;

pub use colleague::Colleague;
pub use config::AnalyzerConfig;
pub use email::{Email, EmailThread};
pub use issue::{Issue, IssueDraft, IssueStatus, IssueType, IssueValidationError};
pub use project::{Project, ProjectMention};
pub use run::{AnalysisRun, ThreadAnalysisRecord};
pub use summary::ThreadSummary;
