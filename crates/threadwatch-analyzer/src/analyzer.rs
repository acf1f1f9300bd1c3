use chrono::{DateTime, Utc};
use std::sync::Arc;
use threadwatch_llm::ModelGateway;
use threadwatch_persist::PersistenceClient;
use threadwatch_types::{
    AnalyzerConfig, Colleague, Email, EmailThread, Issue, IssueDraft, IssueStatus, Project,
    ThreadAnalysisRecord, ThreadSummary,
};

use crate::builder::ThreadAnalyzerBuilder;
use crate::contact::contact_for;
use crate::digest;
use crate::entity::EntityResolver;
use crate::error::EmailStepError;
use crate::evidence::EvidenceValidator;
use crate::ledger::{IssueLedger, Resolution};
use crate::response::{AnalysisResponse, NewIssueData, ResolvedIssueData};
use crate::templates::{PromptSlots, PromptTemplates};

/// Everything one thread produced
#[derive(Debug, Clone)]
pub struct ThreadOutcome {
    /// Open and resolved, in detection order
    pub issues: Vec<Issue>,
    pub record: ThreadAnalysisRecord,
    /// Projects linked while reading the thread, first-seen order
    pub projects: Vec<Project>,
}

impl ThreadOutcome {
    pub fn open_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_open())
    }

    pub fn resolved_issues(&self) -> impl Iterator<Item = &Issue> {
        self.issues
            .iter()
            .filter(|i| i.status == IssueStatus::Resolved)
    }
}

// Per-thread state, owned by the email loop and reset for every thread.
#[derive(Debug, Default)]
struct ThreadState {
    ledger: IssueLedger,
    summary: ThreadSummary,
    projects: Vec<Project>,
    failed_emails: usize,
}

// What one email contributes, gathered before anything is applied.
#[derive(Debug)]
struct EmailFindings {
    issues: Vec<Issue>,
    resolutions: Vec<ResolvedIssueData>,
    projects: Vec<Project>,
    summary: ThreadSummary,
}

/// Reads a thread one email at a time, carrying open issues and a running
/// summary from each model call into the next.
pub struct ThreadAnalyzer {
    gateway: Arc<ModelGateway>,
    store: Arc<dyn PersistenceClient>,
    resolver: EntityResolver,
    validator: EvidenceValidator,
    templates: PromptTemplates,
    colleagues: Vec<Colleague>,
    config: AnalyzerConfig,
}

impl ThreadAnalyzer {
    pub fn builder() -> ThreadAnalyzerBuilder {
        ThreadAnalyzerBuilder::new()
    }

    pub(crate) fn from_parts(
        gateway: Arc<ModelGateway>,
        store: Arc<dyn PersistenceClient>,
        templates: PromptTemplates,
        colleagues: Vec<Colleague>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            resolver: EntityResolver::new(Arc::clone(&store)),
            validator: EvidenceValidator::new(config.evidence_overlap_threshold),
            gateway,
            store,
            templates,
            colleagues,
            config,
        }
    }

    pub fn gateway(&self) -> &Arc<ModelGateway> {
        &self.gateway
    }

    pub fn store(&self) -> &Arc<dyn PersistenceClient> {
        &self.store
    }

    pub async fn analyze_thread(&self, thread: &EmailThread) -> ThreadOutcome {
        self.analyze_thread_at(thread, Utc::now()).await
    }

    /// Analyze with ages measured against `now`.
    ///
    /// One model call per email, oldest first. An email whose step fails is
    /// logged and skipped; the thread always completes.
    pub async fn analyze_thread_at(&self, thread: &EmailThread, now: DateTime<Utc>) -> ThreadOutcome {
        let emails = thread.chronological();
        let total = emails.len();
        tracing::info!(
            thread_id = %thread.thread_id,
            subject = %thread.subject,
            emails = total,
            "Analyzing thread"
        );

        let mut state = ThreadState::default();

        for (index, email) in emails.into_iter().enumerate() {
            let number = index + 1;
            tracing::debug!(number, total, from = %email.from_name, "Processing email");

            match self.analyze_email(thread, email, number, total, &state).await {
                Ok(findings) => Self::apply(&mut state, findings, email),
                Err(e) => {
                    state.failed_emails += 1;
                    tracing::error!(
                        thread_id = %thread.thread_id,
                        number,
                        error = %e,
                        "Email analysis failed, continuing with previous state"
                    );
                }
            }
        }

        let linked_project = state.projects.first();
        let record = ThreadAnalysisRecord {
            thread_id: thread.thread_id.clone(),
            project_name: linked_project
                .map(|p| p.project_name.clone())
                .unwrap_or_else(|| thread.subject.clone()),
            subject: thread.subject.clone(),
            total_emails: total,
            participants: thread.participants.clone(),
            first_email_date: thread.first_email_date().unwrap_or(now),
            last_email_date: thread.last_email_date().unwrap_or(now),
            final_summary: state.summary,
            analyzed_at: now,
            failed_emails: state.failed_emails,
        };

        let project_id = linked_project.map(|p| p.project_id.clone());
        let issues = state.ledger.finalize(now, project_id.as_deref());

        let outcome = ThreadOutcome {
            issues,
            record,
            projects: state.projects,
        };
        tracing::info!(
            thread_id = %thread.thread_id,
            projects = outcome.projects.len(),
            issues = outcome.issues.len(),
            open = outcome.open_issues().count(),
            resolved = outcome.resolved_issues().count(),
            failed_emails = outcome.record.failed_emails,
            "Thread analysis complete"
        );
        outcome
    }

    async fn analyze_email(
        &self,
        thread: &EmailThread,
        email: &Email,
        number: usize,
        total: usize,
        state: &ThreadState,
    ) -> Result<EmailFindings, EmailStepError> {
        let known_projects = self.store.get_all_projects().await?;
        let user_prompt = self.user_prompt(thread, email, number, total, state, &known_projects);

        let reply = self
            .gateway
            .invoke_json(&self.templates.system, &user_prompt)
            .await?;
        let response = AnalysisResponse::parse(reply.data)?;

        let issues = response
            .new_issues
            .iter()
            .filter(|data| self.is_grounded(data, email))
            .filter_map(|data| Self::build_issue(data, email, thread))
            .collect();

        let mut projects = Vec::with_capacity(response.project_mentions.len());
        for mention in &response.project_mentions {
            projects.push(self.resolver.resolve(mention).await?);
        }

        Ok(EmailFindings {
            issues,
            resolutions: response.resolved_issues,
            projects,
            summary: response.thread_summary,
        })
    }

    fn apply(state: &mut ThreadState, findings: EmailFindings, email: &Email) {
        for project in findings.projects {
            if !state
                .projects
                .iter()
                .any(|p| p.project_id == project.project_id)
            {
                tracing::info!(project = %project.project_name, "Project linked to thread");
                state.projects.push(project);
            }
        }

        for issue in findings.issues {
            tracing::info!(
                issue_id = %issue.issue_id,
                title = %issue.title,
                severity = issue.severity,
                "New issue detected"
            );
            state.ledger.push(issue);
        }

        for resolved in findings.resolutions {
            match state
                .ledger
                .resolve(&resolved.issue_id, &resolved.resolution_evidence, email.date)
            {
                Resolution::Resolved => {
                    tracing::info!(issue_id = %resolved.issue_id, "Issue resolved")
                }
                Resolution::AlreadyClosed | Resolution::UnknownId => {
                    tracing::debug!(issue_id = %resolved.issue_id, "Ignoring resolution for unknown or closed issue")
                }
            }
        }

        state.summary = findings.summary;
    }

    fn is_grounded(&self, data: &NewIssueData, email: &Email) -> bool {
        let grounded = self.validator.is_grounded(&data.evidence_quote, &email.body);
        if !grounded {
            tracing::warn!(
                rejected = true,
                title = %data.title,
                "Rejected issue: evidence not found in email"
            );
        }
        grounded
    }

    fn build_issue(data: &NewIssueData, email: &Email, thread: &EmailThread) -> Option<Issue> {
        let (contact_person, contact_person_email) =
            contact_for(data.issue_type, email, &thread.participants);

        let draft = IssueDraft {
            thread_id: thread.thread_id.clone(),
            issue_type: data.issue_type,
            severity: data.severity_u8(),
            title: data.title.clone(),
            description: data.description.clone(),
            evidence_quote: data.evidence_quote.clone(),
            confidence: data.confidence,
            email_date: email.date,
            email_author: email.from_name.clone(),
            email_author_email: email.from_email.clone(),
            subject: thread.subject.clone(),
            participants: thread.participants.clone(),
            contact_person,
            contact_person_email,
        };

        match Issue::new(draft) {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::warn!(rejected = true, title = %data.title, reason = %e, "Rejected issue");
                None
            }
        }
    }

    fn user_prompt(
        &self,
        thread: &EmailThread,
        email: &Email,
        number: usize,
        total: usize,
        state: &ThreadState,
        known_projects: &[Project],
    ) -> String {
        let project_name = if thread.project_name.trim().is_empty() {
            &thread.subject
        } else {
            &thread.project_name
        };
        let cc_line = if email.cc_emails.is_empty() {
            String::new()
        } else {
            format!("**Cc:** {}", email.cc_emails.join(", "))
        };

        let slots = PromptSlots::new()
            .set("project_name", project_name.as_str())
            .set("subject", thread.subject.as_str())
            .set("email_number", number.to_string())
            .set("total_emails", total.to_string())
            .set(
                "previous_issues",
                digest::open_issues(state.ledger.issues(), self.config.evidence_snippet_chars),
            )
            .set("thread_summary", digest::summary(&state.summary))
            .set("colleagues_context", digest::roster(&self.colleagues))
            .set("existing_projects", digest::known_projects(known_projects))
            .set("from_name", email.from_name.as_str())
            .set("from_email", email.from_email.as_str())
            .set("to_emails", email.to_emails.join(", "))
            .set("cc_line", cc_line)
            .set("email_date", email.display_date())
            .set("email_body", email.body.as_str());

        self.templates.render_user(&slots)
    }
}

impl std::fmt::Debug for ThreadAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadAnalyzer")
            .field("gateway", &self.gateway)
            .field("colleagues", &self.colleagues.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
