//! Integration tests for the synapse-agent crate.
//!
//! Mock connectors with call-count spies stand in for the real services so
//! that dispatch, formatting and status aggregation can be observed without
//! any network access.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use synapse_adapters::{
    AdapterError, ConnectionState, Connector, GitHubConnector, JiraConnector, NotionConnector,
    OperationTable, SlackConnector,
};
use synapse_agent::{
    AgentConfig, CommandRouter, ConnectorRegistry, Credentials, Dispatcher, aggregate_status,
    format_outcome,
};
use synapse_intent::IntentParser;
use synapse_kernel::{
    Command, FailureKind, Outcome, Params, ServiceId, StatusReport, StatusState,
};

// ═══════════════════════════════════════════════════════════════════════
//  Mock connector
// ═══════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy)]
enum Behavior {
    /// Echo the received params back as data.
    Echo,
    /// Fail with a very long downstream error.
    Fail,
    /// Panic inside `execute`.
    Panic,
    /// Fail the status probe.
    StatusFail,
    /// Panic inside the status probe.
    StatusPanic,
}

struct MockConnector {
    service: ServiceId,
    state: ConnectionState,
    behavior: Behavior,
    calls: Arc<AtomicUsize>,
}

impl MockConnector {
    fn new(service: ServiceId, state: ConnectionState, behavior: Behavior) -> Self {
        Self {
            service,
            state,
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn shared(
        service: ServiceId,
        state: ConnectionState,
        behavior: Behavior,
    ) -> Arc<dyn Connector> {
        Arc::new(Self::new(service, state, behavior))
    }

    fn spy(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

fn table_for(service: ServiceId) -> &'static OperationTable {
    match service {
        ServiceId::GitHub => GitHubConnector::table(),
        ServiceId::Notion => NotionConnector::table(),
        ServiceId::Jira => JiraConnector::table(),
        ServiceId::Slack => SlackConnector::table(),
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn service(&self) -> ServiceId {
        self.service
    }

    fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn operations(&self) -> &'static OperationTable {
        table_for(self.service)
    }

    async fn status(&self) -> synapse_adapters::Result<StatusReport> {
        if let Some(report) = self.state.offline_report(self.service) {
            return Ok(report);
        }
        match self.behavior {
            Behavior::StatusFail => Err(AdapterError::Timeout {
                seconds: 30,
                reason: "probe timed out".into(),
            }),
            Behavior::StatusPanic => panic!("status probe exploded"),
            _ => Ok(StatusReport::connected("mock connected")),
        }
    }

    async fn execute(&self, operation: &str, params: Params) -> synapse_adapters::Result<Outcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Fail => Err(AdapterError::Api {
                service: self.service.display_name().into(),
                status: 500,
                message: "x".repeat(1000),
            }),
            Behavior::Panic => panic!("connector exploded"),
            _ => Ok(Outcome::ok(format!("ran {operation}"))
                .with("params", serde_json::to_value(&params).unwrap_or_default())),
        }
    }
}

fn router_with(connectors: Vec<Arc<dyn Connector>>) -> CommandRouter {
    let registry = connectors
        .into_iter()
        .fold(ConnectorRegistry::new(), ConnectorRegistry::with);
    CommandRouter::new(IntentParser::new().unwrap(), Arc::new(registry))
}

// ═══════════════════════════════════════════════════════════════════════
//  Dispatch short-circuits
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn unconfigured_connector_is_never_invoked() {
    let github =
        MockConnector::new(ServiceId::GitHub, ConnectionState::Unconfigured, Behavior::Echo);
    let spy = github.spy();
    let router = router_with(vec![Arc::new(github)]);

    let outcome = router
        .handle_outcome("create a new repo called my-test-repo")
        .await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some(FailureKind::NotConfigured));
    assert_eq!(spy.load(Ordering::SeqCst), 0);

    let text = router.handle("create a new repo called my-test-repo").await;
    assert!(text.starts_with("❌"));
    assert!(text.contains("GITHUB_TOKEN"));
    assert_eq!(spy.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failed_connector_reports_reason_without_invocation() {
    let slack = MockConnector::new(
        ServiceId::Slack,
        ConnectionState::Failed {
            reason: "invalid_auth".into(),
        },
        Behavior::Echo,
    );
    let spy = slack.spy();
    let router = router_with(vec![Arc::new(slack)]);

    let outcome = router.handle_outcome("list slack channels").await;
    assert_eq!(outcome.error, Some(FailureKind::NotConfigured));
    assert!(outcome.message.contains("invalid_auth"));
    assert_eq!(spy.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_operation_is_reported_not_asserted() {
    let github = MockConnector::new(ServiceId::GitHub, ConnectionState::Connected, Behavior::Echo);
    let spy = github.spy();
    let registry = ConnectorRegistry::new().with(Arc::new(github));
    let dispatcher = Dispatcher::new(Arc::new(registry));

    let outcome = dispatcher
        .dispatch(Command::new(ServiceId::GitHub, "teleport_repo", Params::new()))
        .await;
    assert_eq!(outcome.error, Some(FailureKind::UnknownOperation));
    assert_eq!(outcome.message, "Unknown GitHub operation: teleport_repo");
    assert_eq!(spy.load(Ordering::SeqCst), 0);
}

// ═══════════════════════════════════════════════════════════════════════
//  Dispatch to a connected connector
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn defaults_are_applied_before_invocation() {
    let github = MockConnector::new(ServiceId::GitHub, ConnectionState::Connected, Behavior::Echo);
    let spy = github.spy();
    let router = router_with(vec![Arc::new(github)]);

    let outcome = router.handle_outcome("list issues in repo owner/test").await;
    assert!(outcome.success, "{}", outcome.message);
    assert_eq!(outcome.message, "ran list_issues");
    assert_eq!(
        outcome.get("params"),
        Some(&json!({"repo": "owner/test", "state": "open", "per_page": 10}))
    );
    assert_eq!(spy.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn downstream_errors_are_truncated() {
    let jira = MockConnector::new(ServiceId::Jira, ConnectionState::Connected, Behavior::Fail);
    let router = router_with(vec![Arc::new(jira)]);

    let outcome = router.handle_outcome("list jira projects").await;
    assert!(!outcome.success);
    match outcome.error {
        Some(FailureKind::DownstreamFailure(detail)) => {
            assert!(detail.starts_with("Jira API returned 500"));
            assert!(detail.chars().count() <= 301);
            assert!(detail.ends_with('…'));
        }
        other => panic!("expected downstream failure, got {other:?}"),
    }
}

#[tokio::test]
async fn connector_panic_becomes_downstream_failure() {
    let notion = MockConnector::new(ServiceId::Notion, ConnectionState::Connected, Behavior::Panic);
    let spy = notion.spy();
    let router = router_with(vec![Arc::new(notion)]);

    let outcome = router.handle_outcome("search notion for roadmap").await;
    assert!(matches!(outcome.error, Some(FailureKind::DownstreamFailure(_))));
    assert!(outcome.message.contains("connector exploded"));

    // The router is still usable after a panic.
    let again = router.handle_outcome("search notion for roadmap").await;
    assert!(!again.success);
    assert_eq!(spy.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let github = MockConnector::new(ServiceId::GitHub, ConnectionState::Connected, Behavior::Echo);
    let spy = github.spy();
    let router = router_with(vec![Arc::new(github)]);

    let requests = (0..16).map(|i| {
        let router = &router;
        async move { router.handle_outcome(&format!("list issues in repo owner/r{i}")).await }
    });
    let outcomes = join_all(requests).await;
    assert!(outcomes.iter().all(|o| o.success));
    assert_eq!(spy.load(Ordering::SeqCst), 16);
}

// ═══════════════════════════════════════════════════════════════════════
//  Formatting
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn every_pipeline_result_formats_to_text() {
    let router = router_with(vec![
        MockConnector::shared(ServiceId::GitHub, ConnectionState::Connected, Behavior::Echo),
        MockConnector::shared(ServiceId::Jira, ConnectionState::Connected, Behavior::Fail),
        MockConnector::shared(ServiceId::Slack, ConnectionState::Unconfigured, Behavior::Echo),
    ]);
    for input in [
        "please do something vague",
        "",
        "list my repositories",
        "list jira projects",
        "send \"hi\" to #general on slack",
        "search notion for plans",
    ] {
        let text = router.handle(input).await;
        assert!(!text.trim().is_empty(), "empty output for {input:?}");
    }
}

#[test]
fn formatter_is_total_over_odd_outcomes() {
    let outcomes = [
        Outcome::ok(""),
        Outcome::failure(FailureKind::UnknownOperation, ""),
        Outcome::downstream(""),
        Outcome::ok("x").with("repositories", json!([null, 3, "s", {}])),
        Outcome::ok("x").with("channels", json!({"not": "a list"})),
        Outcome::ok("x").with("page_url", 42),
    ];
    for outcome in &outcomes {
        assert!(!format_outcome(outcome).trim().is_empty());
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Status aggregation
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn one_failing_probe_does_not_affect_others() {
    let registry = ConnectorRegistry::new()
        .with(MockConnector::shared(ServiceId::GitHub, ConnectionState::Connected, Behavior::Echo))
        .with(MockConnector::shared(
            ServiceId::Notion,
            ConnectionState::Connected,
            Behavior::StatusFail,
        ))
        .with(MockConnector::shared(ServiceId::Jira, ConnectionState::Connected, Behavior::Echo))
        .with(MockConnector::shared(ServiceId::Slack, ConnectionState::Connected, Behavior::Echo));

    let report = aggregate_status(&registry).await;
    assert_eq!(report.len(), 4);
    let errors: Vec<_> = report
        .iter()
        .filter(|(_, r)| r.status == StatusState::Error)
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(*errors[0].0, ServiceId::Notion);
    assert_eq!(report[&ServiceId::GitHub].status, StatusState::Connected);
}

#[tokio::test]
async fn panicking_probe_is_isolated() {
    let registry = ConnectorRegistry::new()
        .with(MockConnector::shared(
            ServiceId::Slack,
            ConnectionState::Connected,
            Behavior::StatusPanic,
        ))
        .with(MockConnector::shared(
            ServiceId::GitHub,
            ConnectionState::Unconfigured,
            Behavior::Echo,
        ));

    let report = aggregate_status(&registry).await;
    assert_eq!(report.len(), 4);
    assert_eq!(report[&ServiceId::Slack].status, StatusState::Error);
    assert_eq!(report[&ServiceId::GitHub].status, StatusState::NotInitialized);
    assert_eq!(report[&ServiceId::Jira].status, StatusState::NotInitialized);
    assert_eq!(report[&ServiceId::Notion].status, StatusState::NotInitialized);
}

// ═══════════════════════════════════════════════════════════════════════
//  Parser and operation tables agree
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn every_parser_operation_exists_in_its_table() {
    let parser = IntentParser::new().unwrap();
    for (service, operation) in parser.table().operations() {
        assert!(
            table_for(service).contains(operation),
            "parser emits {service}::{operation} but the connector does not declare it"
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Configuration end to end
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn router_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[services]
enabled = ["github", "jira"]
priority = ["github", "jira"]
http_timeout_secs = 5
"#
    )
    .unwrap();

    let config = AgentConfig::load(file.path()).unwrap();
    assert_eq!(config.services.http_timeout_secs, 5);

    let router = CommandRouter::from_config(&config, Credentials::default())
        .await
        .unwrap();
    let health = router.health().await;
    assert_eq!(health.len(), 4);
    assert_eq!(health[&ServiceId::GitHub].status, StatusState::NotInitialized);
    assert!(health[&ServiceId::GitHub].message.contains("GITHUB_TOKEN"));
    assert!(health[&ServiceId::Slack].message.contains("not enabled"));

    let outcome = router.handle_outcome("list slack channels").await;
    assert_eq!(outcome.error, Some(FailureKind::NotConfigured));
}

#[test]
fn malformed_config_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[services]\nhttp_timeout_secs = \"soon\"").unwrap();
    let err = AgentConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("invalid config"));
}
