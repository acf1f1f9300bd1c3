pub mod analyzer;
pub mod builder;
pub mod contact;
pub mod digest;
pub mod entity;
pub mod error;
pub mod evidence;
pub mod ledger;
pub mod priority;
pub mod response;
pub mod runner;
pub mod templates;

pub use analyzer::{ThreadAnalyzer, ThreadOutcome};
pub use builder::ThreadAnalyzerBuilder;
pub use entity::EntityResolver;
pub use error::{EmailStepError, ResponseError};
pub use evidence::EvidenceValidator;
pub use ledger::IssueLedger;
pub use priority::priority_score;
pub use response::AnalysisResponse;
pub use runner::{PortfolioRunner, RunReport};
pub use templates::PromptTemplates;

// Re-export the domain model so callers need only this crate
pub use threadwatch_types::{
    AnalysisRun, AnalyzerConfig, Colleague, Email, EmailThread, Issue, IssueStatus, IssueType,
    Project, ProjectMention, ThreadAnalysisRecord, ThreadSummary,
};
