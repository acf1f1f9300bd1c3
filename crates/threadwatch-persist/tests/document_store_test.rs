use chrono::{TimeZone, Utc};
use threadwatch_persist::{DocumentStore, DocumentStoreBuilder, PersistError, PersistenceClient};
use threadwatch_types::{
    AnalysisRun, Issue, IssueDraft, IssueType, Project, ThreadAnalysisRecord, ThreadSummary,
};

fn issue(title: &str, issue_type: IssueType, priority: f64) -> Issue {
    let mut issue = Issue::new(IssueDraft {
        thread_id: "thread-1".into(),
        issue_type,
        severity: 5,
        title: title.into(),
        description: "description".into(),
        evidence_quote: "evidence that is long enough".into(),
        confidence: 0.8,
        email_date: Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap(),
        email_author: "Ana Lima".into(),
        email_author_email: "ana.lima@example.com".into(),
        subject: "Subject".into(),
        participants: vec![],
        contact_person: "Ana Lima".into(),
        contact_person_email: "ana.lima@example.com".into(),
    })
    .unwrap();
    issue.priority_score = priority;
    issue
}

fn record(thread_id: &str) -> ThreadAnalysisRecord {
    let date = Utc.with_ymd_and_hms(2025, 2, 1, 10, 0, 0).unwrap();
    ThreadAnalysisRecord {
        thread_id: thread_id.into(),
        project_name: "Phoenix".into(),
        subject: "Phoenix rollout".into(),
        total_emails: 2,
        participants: vec![],
        first_email_date: date,
        last_email_date: date,
        final_summary: ThreadSummary::default(),
        analyzed_at: date,
        failed_emails: 0,
    }
}

#[tokio::test]
async fn test_save_issue_is_an_upsert() {
    let store = DocumentStore::in_memory();
    let mut first = issue("Vendor contract unsigned", IssueType::UnresolvedAction, 20.0);

    store.save_issue(&first).await.unwrap();
    first.resolve("Signed on Friday", Utc::now());
    store.save_issue(&first).await.unwrap();

    let all = store.get_all_issues().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_open());
    assert_eq!(store.get_resolved_issues().await.unwrap().len(), 1);
    assert!(store.get_open_issues().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_issues_sorted_by_priority() {
    let store = DocumentStore::in_memory();
    for (title, priority) in [("Low priority item", 10.0), ("High priority item", 30.5), ("Mid priority item", 18.0)] {
        store
            .save_issue(&issue(title, IssueType::EmergingRisk, priority))
            .await
            .unwrap();
    }

    let open = store.get_open_issues().await.unwrap();
    let titles: Vec<&str> = open.iter().map(|i| i.title.as_str()).collect();

    assert_eq!(titles, vec!["High priority item", "Mid priority item", "Low priority item"]);
}

#[tokio::test]
async fn test_search_projects_matches_name_and_keywords() {
    let store = DocumentStore::in_memory();
    let phoenix = Project::new("Phoenix Migration", "", vec!["cloud".into()]);
    let billing = Project::new("Billing Revamp", "", vec!["invoices".into()]);
    store.save_project(&phoenix).await.unwrap();
    store.save_project(&billing).await.unwrap();

    let by_name = store.search_projects("PHOENIX").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].project_id, phoenix.project_id);

    let by_keyword = store.search_projects("invoice").await.unwrap();
    assert_eq!(by_keyword[0].project_id, billing.project_id);

    assert!(store.search_projects("payroll").await.unwrap().is_empty());
    assert_eq!(
        store.get_project_by_id(&billing.project_id).await.unwrap(),
        Some(billing)
    );
}

#[tokio::test]
async fn test_save_project_refreshes_updated_at() {
    let store = DocumentStore::in_memory();
    let mut project = Project::new("Phoenix", "", vec![]);
    let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    project.created_at = created;
    project.updated_at = created;

    store.save_project(&project).await.unwrap();
    let stored = store.get_project_by_id(&project.project_id).await.unwrap().unwrap();
    assert_eq!(stored.updated_at, created);

    store.save_project(&project).await.unwrap();
    let stored = store.get_project_by_id(&project.project_id).await.unwrap().unwrap();
    assert_eq!(stored.created_at, created);
    assert!(stored.updated_at > created);
    assert_eq!(store.get_all_projects().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_statistics() {
    let store = DocumentStore::in_memory();
    store
        .save_issue(&issue("First open issue", IssueType::UnresolvedAction, 20.0))
        .await
        .unwrap();
    store
        .save_issue(&issue("Second open issue", IssueType::EmergingRisk, 25.0))
        .await
        .unwrap();
    let mut resolved = issue("Resolved issue here", IssueType::UnresolvedAction, 0.0);
    resolved.resolve("done and dusted", Utc::now());
    store.save_issue(&resolved).await.unwrap();
    store.save_project(&Project::new("Phoenix", "", vec![])).await.unwrap();
    store.save_project(&Project::new("Atlas", "", vec![])).await.unwrap();
    store.save_thread_record(&record("thread-1")).await.unwrap();
    store.save_thread_record(&record("thread-1")).await.unwrap();
    store.save_analysis_run(&AnalysisRun::default()).await.unwrap();

    let stats = store.get_statistics().await.unwrap();

    assert_eq!(stats.total_issues, 3);
    assert_eq!(stats.open_issues, 2);
    assert_eq!(stats.resolved_issues, 1);
    assert_eq!(stats.total_threads, 1);
    assert_eq!(stats.projects, vec!["Atlas".to_string(), "Phoenix".to_string()]);
    assert_eq!(stats.avg_priority_open, 22.5);
    assert_eq!(stats.issues_by_type["UNRESOLVED_ACTION"], 2);
    assert_eq!(stats.issues_by_type["EMERGING_RISK"], 1);
    assert_eq!(stats.total_analysis_runs, 1);
}

#[tokio::test]
async fn test_file_backed_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("portfolio.json");

    let store = DocumentStore::open(&path).await.unwrap();
    let saved = issue("Persisted issue title", IssueType::EmergingRisk, 12.0);
    store.save_issue(&saved).await.unwrap();
    store.save_thread_record(&record("thread-9")).await.unwrap();
    let run = AnalysisRun::default();
    store.save_analysis_run(&run).await.unwrap();
    drop(store);

    let reopened = DocumentStore::open(&path).await.unwrap();
    assert_eq!(reopened.get_all_issues().await.unwrap(), vec![saved]);
    assert_eq!(reopened.get_all_thread_records().await.unwrap()[0].thread_id, "thread-9");
    assert_eq!(
        reopened.get_latest_analysis_run().await.unwrap().map(|r| r.run_id),
        Some(run.run_id)
    );
}

#[tokio::test]
async fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = DocumentStore::open(&path).await.unwrap_err();

    assert!(matches!(err, PersistError::Corrupt { .. }));
}

#[tokio::test]
async fn test_builder_reset_clears_existing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("portfolio.json");
    let store = DocumentStore::open(&path).await.unwrap();
    store.save_project(&Project::new("Phoenix", "", vec![])).await.unwrap();
    drop(store);

    let kept = DocumentStoreBuilder::new().path(&path).build().await.unwrap();
    assert_eq!(kept.get_all_projects().await.unwrap().len(), 1);
    drop(kept);

    let reset = DocumentStoreBuilder::new().path(&path).reset(true).build().await.unwrap();
    assert!(reset.get_all_projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_issues_by_project() {
    let store = DocumentStore::in_memory();
    let mut linked = issue("Linked issue title", IssueType::EmergingRisk, 1.0);
    linked.project_id = "p-1".into();
    store.save_issue(&linked).await.unwrap();
    store
        .save_issue(&issue("Unlinked issue title", IssueType::EmergingRisk, 1.0))
        .await
        .unwrap();

    let found = store.get_issues_by_project("p-1").await.unwrap();
    assert_eq!(found, vec![linked]);
}
