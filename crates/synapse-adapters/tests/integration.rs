//! Integration tests for the synapse-adapters crate.
//!
//! These tests exercise the connectors through the [`Connector`] trait in
//! their offline states: no test touches a real service.

use std::sync::Arc;

use synapse_adapters::{
    AdapterError, Connector, ConnectionState, Endpoint, GitHubConnector, JiraConnector,
    NotionConnector, SlackConnector,
};
use synapse_kernel::{Params, ServiceId, StatusState};

async fn unconfigured() -> Vec<Arc<dyn Connector>> {
    vec![
        Arc::new(GitHubConnector::connect(None, Endpoint::new("https://api.github.com", 5)).await),
        Arc::new(
            NotionConnector::connect(None, None, Endpoint::new("https://api.notion.com/v1", 5))
                .await,
        ),
        Arc::new(JiraConnector::connect(None, 5).await),
        Arc::new(SlackConnector::connect(None, Endpoint::new("https://slack.com/api", 5)).await),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
//  Connection state
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn connectors_without_credentials_are_unconfigured() {
    for connector in unconfigured().await {
        assert_eq!(connector.state(), &ConnectionState::Unconfigured);
        assert!(!connector.is_connected());
        assert_eq!(connector.operations().service(), connector.service());
    }
}

#[tokio::test]
async fn offline_status_names_the_missing_credential() {
    for connector in unconfigured().await {
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        let first_var = connector.service().credential_vars()[0];
        assert!(
            report.message.contains(first_var),
            "{} report should mention {first_var}: {}",
            connector.service(),
            report.message
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Operation tables
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn every_table_has_status_and_unique_names() {
    for connector in unconfigured().await {
        let names: Vec<_> = connector.operations().names().collect();
        assert!(names.contains(&"status"));
        let mut sorted = names.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), names.len(), "duplicate operation in {}", connector.service());
    }
}

#[tokio::test]
async fn every_listed_operation_is_handled() {
    for connector in unconfigured().await {
        for name in connector.operations().names() {
            let result = connector.execute(name, Params::new()).await;
            assert!(
                !matches!(result, Err(AdapterError::UnknownOperation { .. })),
                "{}::{name} is listed but not handled",
                connector.service()
            );
        }
    }
}

#[tokio::test]
async fn status_operation_reports_offline_state() {
    for connector in unconfigured().await {
        let outcome = connector.execute("status", Params::new()).await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.get("status").and_then(|v| v.as_str()), Some("not_initialized"));
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Execution without credentials
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn requests_without_credentials_are_refused() {
    let cases: Vec<(ServiceId, &str, Params)> = vec![
        (ServiceId::GitHub, "list_repos", Params::new()),
        (ServiceId::Notion, "get_page", Params::new().with("page_id", "abc")),
        (ServiceId::Jira, "list_projects", Params::new()),
        (ServiceId::Slack, "list_users", Params::new()),
    ];
    let connectors = unconfigured().await;
    for (service, operation, params) in cases {
        let connector = connectors
            .iter()
            .find(|c| c.service() == service)
            .unwrap();
        let err = connector.execute(operation, params).await.unwrap_err();
        assert!(
            matches!(err, AdapterError::AuthRequired { .. }),
            "{service}::{operation} gave {err}"
        );
    }
}

#[tokio::test]
async fn missing_required_parameter_is_invalid_params() {
    let endpoint = Endpoint::new("http://127.0.0.1:9", 2);
    let github = GitHubConnector::connect(Some("ghp_x".into()), endpoint).await;
    let err = github
        .execute("create_issue", Params::new().with("repo", "a/b"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("title"));
}
