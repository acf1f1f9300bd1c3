use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use threadwatch_llm::GatewayStats;
use threadwatch_types::{AnalysisRun, EmailThread, Issue, IssueStatus, Project, ThreadAnalysisRecord};

use crate::analyzer::{ThreadAnalyzer, ThreadOutcome};

/// Output of a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run: AnalysisRun,
    /// Highest priority first
    pub open_issues: Vec<Issue>,
    pub resolved_issues: Vec<Issue>,
    pub projects: Vec<Project>,
    pub thread_records: Vec<ThreadAnalysisRecord>,
    pub gateway_stats: GatewayStats,
}

/// Runs the analyzer over a batch of threads and persists what it finds.
#[derive(Debug)]
pub struct PortfolioRunner {
    analyzer: ThreadAnalyzer,
}

impl PortfolioRunner {
    pub fn new(analyzer: ThreadAnalyzer) -> Self {
        Self { analyzer }
    }

    pub fn analyzer(&self) -> &ThreadAnalyzer {
        &self.analyzer
    }

    /// Analyze every thread in order. A thread that fails is logged and
    /// counted; the run carries on with the next one.
    pub async fn run(&self, threads: &[EmailThread]) -> Result<RunReport> {
        let started = Instant::now();
        let mut run = AnalysisRun {
            total_threads: threads.len(),
            total_emails: threads.iter().map(|t| t.emails.len()).sum(),
            ..AnalysisRun::default()
        };

        let mut issues: Vec<Issue> = Vec::new();
        let mut projects: Vec<Project> = Vec::new();
        let mut thread_records = Vec::with_capacity(threads.len());

        for (index, thread) in threads.iter().enumerate() {
            tracing::info!(
                thread = index + 1,
                total = threads.len(),
                subject = %thread.subject,
                "Starting thread"
            );

            match self.process_thread(thread).await {
                Ok(outcome) => {
                    for project in outcome.projects {
                        if !projects.iter().any(|p| p.project_id == project.project_id) {
                            projects.push(project);
                        }
                    }
                    issues.extend(outcome.issues);
                    thread_records.push(outcome.record);
                }
                Err(e) => {
                    run.failed_threads += 1;
                    tracing::error!(
                        thread_id = %thread.thread_id,
                        error = %format!("{e:#}"),
                        "Thread failed"
                    );
                }
            }
        }

        let gateway_stats = self.analyzer.gateway().stats().await;

        let (mut open_issues, other): (Vec<Issue>, Vec<Issue>) =
            issues.into_iter().partition(|i| i.is_open());
        open_issues.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));
        let resolved_issues: Vec<Issue> = other
            .into_iter()
            .filter(|i| i.status == IssueStatus::Resolved)
            .collect();

        run.total_issues_found = open_issues.len() + resolved_issues.len();
        run.total_issues_resolved = resolved_issues.len();
        run.total_api_calls = gateway_stats.total_requests;
        run.total_tokens_used = gateway_stats.total_tokens;
        run.estimated_cost_usd = gateway_stats.estimated_cost_usd;
        run.execution_time_seconds = started.elapsed().as_secs_f64();

        self.analyzer
            .store()
            .save_analysis_run(&run)
            .await
            .context("Failed to save analysis run")?;

        tracing::info!(
            threads = run.total_threads,
            failed_threads = run.failed_threads,
            issues = run.total_issues_found,
            resolved = run.total_issues_resolved,
            api_calls = run.total_api_calls,
            tokens = run.total_tokens_used,
            cost_usd = run.estimated_cost_usd,
            "Analysis run complete"
        );

        Ok(RunReport {
            run,
            open_issues,
            resolved_issues,
            projects,
            thread_records,
            gateway_stats,
        })
    }

    async fn process_thread(&self, thread: &EmailThread) -> Result<ThreadOutcome> {
        let outcome = self.analyzer.analyze_thread(thread).await;
        let store = self.analyzer.store();

        for project in &outcome.projects {
            store
                .save_project(project)
                .await
                .with_context(|| format!("Failed to save project {}", project.project_name))?;
        }
        store
            .save_thread_record(&outcome.record)
            .await
            .with_context(|| format!("Failed to save record for thread {}", thread.thread_id))?;
        for issue in &outcome.issues {
            store
                .save_issue(issue)
                .await
                .with_context(|| format!("Failed to save issue {}", issue.issue_id))?;
        }

        Ok(outcome)
    }
}
