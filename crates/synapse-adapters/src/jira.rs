//! Jira Cloud REST v3 connector.
//!
//! Authenticates with HTTP basic auth (account email and API token) against
//! the site configured in `JIRA_SERVER`.  Descriptions and comments are sent
//! as Atlassian Document Format paragraphs.

use std::fmt;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{Value, json};
use synapse_kernel::{Outcome, Params, ServiceId, StatusReport};
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::http::{self, Endpoint};
use crate::operations::{DefaultValue, OperationSpec, OperationTable, optional_text, require_text};
use crate::state::ConnectionState;
use crate::traits::Connector;

const ISSUE_KEY: &[&str] = &["issue_key"];

/// Fields requested for issue listings.
const LIST_FIELDS: &str = "summary,status,assignee,priority,created";

static OPERATIONS: OperationTable = OperationTable::new(
    ServiceId::Jira,
    &[
        OperationSpec {
            name: "list_projects",
            summary: "List visible projects",
            required: &[],
            defaults: &[],
        },
        OperationSpec {
            name: "get_project",
            summary: "Fetch a project",
            required: &["project_key"],
            defaults: &[],
        },
        OperationSpec {
            name: "create_issue",
            summary: "Create an issue in a project",
            required: &["project_key", "summary"],
            defaults: &[
                ("description", DefaultValue::Text("")),
                ("issue_type", DefaultValue::Text("Task")),
            ],
        },
        OperationSpec {
            name: "get_issue",
            summary: "Fetch an issue",
            required: ISSUE_KEY,
            defaults: &[],
        },
        OperationSpec {
            name: "update_issue",
            summary: "Edit an issue or move it to another status",
            required: ISSUE_KEY,
            defaults: &[],
        },
        OperationSpec {
            name: "delete_issue",
            summary: "Delete an issue",
            required: ISSUE_KEY,
            defaults: &[],
        },
        OperationSpec {
            name: "list_issues",
            summary: "List recent issues, optionally by project and status",
            required: &[],
            defaults: &[("max_results", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "assign_issue",
            summary: "Assign an issue to a user",
            required: &["issue_key", "assignee"],
            defaults: &[],
        },
        OperationSpec {
            name: "add_comment",
            summary: "Comment on an issue",
            required: &["issue_key", "comment"],
            defaults: &[],
        },
        OperationSpec {
            name: "search_issues",
            summary: "Search issues by JQL or free text",
            required: &[],
            defaults: &[("max_results", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "status",
            summary: "Connection status",
            required: &[],
            defaults: &[],
        },
    ],
);

/// Site and account used to reach Jira.
#[derive(Clone, PartialEq, Eq)]
pub struct JiraCredentials {
    pub server: String,
    pub email: String,
    pub token: String,
}

impl JiraCredentials {
    /// Read `JIRA_SERVER`, `JIRA_EMAIL` and `JIRA_TOKEN`.  All three must
    /// be set and non-empty.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            server: var("JIRA_SERVER")?,
            email: var("JIRA_EMAIL")?,
            token: var("JIRA_TOKEN")?,
        })
    }
}

impl fmt::Debug for JiraCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraCredentials")
            .field("server", &self.server)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Jira connector.
pub struct JiraConnector {
    state: ConnectionState,
    credentials: Option<JiraCredentials>,
    endpoint: Endpoint,
    client: Option<reqwest::Client>,
}

impl JiraConnector {
    /// Build the connector and run the handshake when credentials are
    /// present.
    pub async fn connect(credentials: Option<JiraCredentials>, timeout_secs: u64) -> Self {
        let server = credentials
            .as_ref()
            .map(|c| c.server.as_str())
            .unwrap_or_default();
        let endpoint = Endpoint::new(server, timeout_secs);
        let mut connector = Self {
            state: ConnectionState::initial(credentials.is_some()),
            credentials,
            client: endpoint
                .client()
                .inspect_err(|e| warn!(error = %e, "Jira HTTP client unavailable"))
                .ok(),
            endpoint,
        };
        if connector.credentials.is_none() {
            debug!("Jira credentials not set, Jira connector left unconfigured");
            return connector;
        }

        let handshake = match connector.request(Method::GET, "/rest/api/3/myself") {
            Ok(request) => connector.send(request, "handshake").await,
            Err(e) => Err(e),
        }
            .map(|_| ());
        match &handshake {
            Ok(()) => info!(server = %connector.endpoint.base_url, "Jira connected"),
            Err(e) => warn!(error = %e, "Jira handshake failed"),
        }
        connector.state = connector.state.clone().complete(handshake);
        connector
    }

    /// Build from `JIRA_SERVER`, `JIRA_EMAIL` and `JIRA_TOKEN`.
    pub async fn from_env(timeout_secs: u64) -> Self {
        Self::connect(JiraCredentials::from_env(), timeout_secs).await
    }

    /// The static operation catalog.
    pub fn table() -> &'static OperationTable {
        &OPERATIONS
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder> {
        let Some(client) = &self.client else {
            return Err(AdapterError::NotConnected {
                service: "Jira".into(),
            });
        };
        let builder = client
            .request(method, self.endpoint.url(path))
            .header("Accept", "application/json");
        Ok(match &self.credentials {
            Some(c) => builder.basic_auth(&c.email, Some(&c.token)),
            None => builder,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        if self.credentials.is_none() {
            return Err(AdapterError::AuthRequired {
                service: "Jira".into(),
                credential: "JIRA_SERVER, JIRA_EMAIL and JIRA_TOKEN".into(),
            });
        }
        http::send_json(request, ServiceId::Jira, operation, self.endpoint.timeout_secs).await
    }

    fn browse_url(&self, key: &str) -> String {
        self.endpoint.url(&format!("/browse/{key}"))
    }

    fn issue_key(params: &Params, operation: &str) -> Result<String> {
        Ok(require_text(params, operation, "issue_key")?.to_ascii_uppercase())
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    async fn list_projects(&self) -> Result<Outcome> {
        let list = self
            .send(self.request(Method::GET, "/rest/api/3/project")?, "list_projects")
            .await?;
        let projects: Vec<Value> = list
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|p| {
                        json!({
                            "key": str_field(p, "key"),
                            "name": str_field(p, "name"),
                            "type": str_field(p, "projectTypeKey"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Outcome::ok(format!("Found {} projects", projects.len())).with("projects", projects))
    }

    async fn get_project(&self, params: &Params) -> Result<Outcome> {
        let key = require_text(params, "get_project", "project_key")?.to_ascii_uppercase();
        let project = self
            .send(
                self.request(Method::GET, &format!("/rest/api/3/project/{key}"))?,
                "get_project",
            )
            .await?;
        let name = str_field(&project, "name");
        let lead = project
            .pointer("/lead/displayName")
            .and_then(Value::as_str)
            .unwrap_or("nobody");
        Ok(Outcome::ok(format!("📁 {key}: {name} (lead: {lead})"))
            .with("key", key)
            .with("name", name)
            .with("lead", lead))
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    async fn create_issue(&self, params: &Params) -> Result<Outcome> {
        let project = require_text(params, "create_issue", "project_key")?.to_ascii_uppercase();
        let summary = require_text(params, "create_issue", "summary")?;
        let mut fields = json!({
            "project": { "key": project },
            "summary": summary,
            "issuetype": { "name": optional_text(params, "issue_type").unwrap_or_else(|| "Task".into()) },
        });
        if let Some(description) = optional_text(params, "description") {
            fields["description"] = adf_document(&description);
        }
        if let Some(priority) = optional_text(params, "priority") {
            fields["priority"] = json!({ "name": capitalize(&priority) });
        }
        let created = self
            .send(
                self.request(Method::POST, "/rest/api/3/issue")?
                    .json(&json!({ "fields": fields })),
                "create_issue",
            )
            .await?;
        let key = str_field(&created, "key");
        Ok(Outcome::ok(format!("✅ Issue {key} created: {summary}"))
            .with("key", key.clone())
            .with("issue_url", self.browse_url(&key)))
    }

    async fn get_issue(&self, params: &Params) -> Result<Outcome> {
        let key = Self::issue_key(params, "get_issue")?;
        let issue = self
            .send(
                self.request(Method::GET, &format!("/rest/api/3/issue/{key}"))?,
                "get_issue",
            )
            .await?;
        let shaped = shape_issue(&issue);
        Ok(Outcome::ok(format!(
            "🎫 {key}: {} [{}]",
            shaped["summary"].as_str().unwrap_or_default(),
            shaped["status"].as_str().unwrap_or_default()
        ))
        .with("issue", shaped)
        .with("issue_url", self.browse_url(&key)))
    }

    async fn update_issue(&self, params: &Params) -> Result<Outcome> {
        let key = Self::issue_key(params, "update_issue")?;
        let mut fields = serde_json::Map::new();
        if let Some(summary) = optional_text(params, "summary") {
            fields.insert("summary".into(), Value::String(summary));
        }
        if let Some(description) = optional_text(params, "description") {
            fields.insert("description".into(), adf_document(&description));
        }
        let status = optional_text(params, "status");
        if fields.is_empty() && status.is_none() {
            return Err(AdapterError::InvalidParams {
                operation: "update_issue".into(),
                reason: "nothing to update: give a summary, description or status".into(),
            });
        }

        let mut changes = Vec::new();
        if !fields.is_empty() {
            self.send(
                self.request(Method::PUT, &format!("/rest/api/3/issue/{key}"))?
                    .json(&json!({ "fields": fields })),
                "update_issue",
            )
            .await?;
            changes.push("fields updated".to_owned());
        }
        if let Some(status) = status {
            self.transition(&key, &status).await?;
            changes.push(format!("moved to {status}"));
        }
        Ok(Outcome::ok(format!("✅ {key}: {}", changes.join(", ")))
            .with("issue_url", self.browse_url(&key)))
    }

    async fn transition(&self, key: &str, status: &str) -> Result<()> {
        let available = self
            .send(
                self.request(Method::GET, &format!("/rest/api/3/issue/{key}/transitions"))?,
                "update_issue",
            )
            .await?;
        let id = find_transition(&available, status).ok_or_else(|| {
            AdapterError::InvalidParams {
                operation: "update_issue".into(),
                reason: format!("no transition to '{status}' is available for {key}"),
            }
        })?;
        self.send(
            self.request(Method::POST, &format!("/rest/api/3/issue/{key}/transitions"))?
                .json(&json!({ "transition": { "id": id } })),
            "update_issue",
        )
        .await?;
        Ok(())
    }

    async fn delete_issue(&self, params: &Params) -> Result<Outcome> {
        let key = Self::issue_key(params, "delete_issue")?;
        self.send(
            self.request(Method::DELETE, &format!("/rest/api/3/issue/{key}"))?,
            "delete_issue",
        )
        .await?;
        Ok(Outcome::ok(format!("🗑️ Issue {key} deleted.")))
    }

    async fn list_issues(&self, params: &Params) -> Result<Outcome> {
        let jql = build_jql(
            optional_text(params, "project_key").as_deref(),
            optional_text(params, "status").as_deref(),
        );
        self.run_search(&jql, params, "list_issues").await
    }

    async fn search_issues(&self, params: &Params) -> Result<Outcome> {
        let jql = match (optional_text(params, "jql"), optional_text(params, "query")) {
            (Some(jql), _) => jql,
            (None, Some(query)) => text_jql(&query),
            (None, None) => {
                return Err(AdapterError::InvalidParams {
                    operation: "search_issues".into(),
                    reason: "give either `jql` or `query`".into(),
                });
            }
        };
        self.run_search(&jql, params, "search_issues").await
    }

    async fn run_search(&self, jql: &str, params: &Params, operation: &str) -> Result<Outcome> {
        let max_results = params.get_int("max_results").unwrap_or(10);
        debug!(jql, max_results, "Jira search");
        let found = self
            .send(
                self.request(Method::GET, "/rest/api/3/search/jql")?.query(&[
                    ("jql", jql.to_owned()),
                    ("maxResults", max_results.to_string()),
                    ("fields", LIST_FIELDS.to_owned()),
                ]),
                operation,
            )
            .await?;
        let issues: Vec<Value> = found
            .get("issues")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(shape_issue).collect())
            .unwrap_or_default();
        Ok(Outcome::ok(format!("Found {} issues", issues.len()))
            .with("issues", issues)
            .with("jql", jql))
    }

    async fn assign_issue(&self, params: &Params) -> Result<Outcome> {
        let key = Self::issue_key(params, "assign_issue")?;
        let assignee = require_text(params, "assign_issue", "assignee")?;
        let users = self
            .send(
                self.request(Method::GET, "/rest/api/3/user/search")?
                    .query(&[("query", assignee.as_str())]),
                "assign_issue",
            )
            .await?;
        let user = users
            .as_array()
            .and_then(|u| u.first())
            .ok_or_else(|| AdapterError::InvalidParams {
                operation: "assign_issue".into(),
                reason: format!("no Jira user matches '{assignee}'"),
            })?;
        let account_id = str_field(user, "accountId");
        let display = user
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or(&assignee)
            .to_owned();
        self.send(
            self.request(Method::PUT, &format!("/rest/api/3/issue/{key}/assignee"))?
                .json(&json!({ "accountId": account_id })),
            "assign_issue",
        )
        .await?;
        Ok(Outcome::ok(format!("✅ {key} assigned to {display}."))
            .with("issue_url", self.browse_url(&key)))
    }

    async fn add_comment(&self, params: &Params) -> Result<Outcome> {
        let key = Self::issue_key(params, "add_comment")?;
        let comment = require_text(params, "add_comment", "comment")?;
        let created = self
            .send(
                self.request(Method::POST, &format!("/rest/api/3/issue/{key}/comment"))?
                    .json(&json!({ "body": adf_document(&comment) })),
                "add_comment",
            )
            .await?;
        Ok(Outcome::ok(format!("💬 Comment added to {key}."))
            .with("comment_id", str_field(&created, "id"))
            .with("issue_url", self.browse_url(&key)))
    }

    async fn status_outcome(&self) -> Result<Outcome> {
        let report = self.status().await?;
        Ok(Outcome::ok(report.message).with("status", report.status.as_str()))
    }
}

#[async_trait]
impl Connector for JiraConnector {
    fn service(&self) -> ServiceId {
        ServiceId::Jira
    }

    fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn operations(&self) -> &'static OperationTable {
        &OPERATIONS
    }

    async fn status(&self) -> Result<StatusReport> {
        if let Some(report) = self.state.offline_report(ServiceId::Jira) {
            return Ok(report);
        }
        let me = self
            .send(self.request(Method::GET, "/rest/api/3/myself")?, "status")
            .await?;
        let name = me
            .get("displayName")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        Ok(StatusReport::connected(format!(
            "Connected to Jira at {} as {name}",
            self.endpoint.base_url
        )))
    }

    async fn execute(&self, operation: &str, params: Params) -> Result<Outcome> {
        debug!(operation, "executing Jira operation");
        match operation {
            "list_projects" => self.list_projects().await,
            "get_project" => self.get_project(&params).await,
            "create_issue" => self.create_issue(&params).await,
            "get_issue" => self.get_issue(&params).await,
            "update_issue" => self.update_issue(&params).await,
            "delete_issue" => self.delete_issue(&params).await,
            "list_issues" => self.list_issues(&params).await,
            "assign_issue" => self.assign_issue(&params).await,
            "add_comment" => self.add_comment(&params).await,
            "search_issues" => self.search_issues(&params).await,
            "status" => self.status_outcome().await,
            _ => Err(AdapterError::UnknownOperation {
                service: "Jira".into(),
                operation: operation.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

/// Quote a value for use in JQL.
pub fn jql_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// JQL for an issue listing filtered by project and status.
pub fn build_jql(project_key: Option<&str>, status: Option<&str>) -> String {
    let mut clauses = Vec::new();
    if let Some(project) = project_key {
        clauses.push(format!("project = {}", jql_quote(&project.to_ascii_uppercase())));
    }
    if let Some(status) = status {
        clauses.push(format!("status = {}", jql_quote(status)));
    }
    if clauses.is_empty() {
        "ORDER BY created DESC".to_owned()
    } else {
        format!("{} ORDER BY created DESC", clauses.join(" AND "))
    }
}

/// JQL for a free-text search.
pub fn text_jql(query: &str) -> String {
    format!("text ~ {} ORDER BY created DESC", jql_quote(query))
}

/// Uppercase the first letter: Jira priority names are `High`, `Low`, ...
pub fn capitalize(word: &str) -> String {
    let mut chars = word.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Wrap plain text into an Atlassian Document Format document, one
/// paragraph per line.
pub fn adf_document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": line }],
            })
        })
        .collect();
    json!({ "type": "doc", "version": 1, "content": paragraphs })
}

/// Find the transition leading to `status`, matching either the transition
/// name or its target status name, case-insensitively.
pub fn find_transition(available: &Value, status: &str) -> Option<String> {
    available
        .get("transitions")
        .and_then(Value::as_array)?
        .iter()
        .find(|t| {
            let name = t.get("name").and_then(Value::as_str).unwrap_or_default();
            let target = t.pointer("/to/name").and_then(Value::as_str).unwrap_or_default();
            name.eq_ignore_ascii_case(status) || target.eq_ignore_ascii_case(status)
        })
        .and_then(|t| t.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Reduce an issue to key, summary, status, assignee, priority and created.
pub fn shape_issue(issue: &Value) -> Value {
    let field = |path: &str| {
        issue
            .pointer(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let assignee = field("/fields/assignee/displayName");
    json!({
        "key": str_field(issue, "key"),
        "summary": field("/fields/summary"),
        "status": field("/fields/status/name"),
        "assignee": if assignee.is_empty() { "Unassigned".to_owned() } else { assignee },
        "priority": field("/fields/priority/name"),
        "created": field("/fields/created"),
    })
}

#[cfg(test)]
mod tests {
    use synapse_kernel::StatusState;

    use super::*;

    #[test]
    fn jql_from_filters() {
        assert_eq!(build_jql(None, None), "ORDER BY created DESC");
        assert_eq!(
            build_jql(Some("proj"), Some("In Progress")),
            r#"project = "PROJ" AND status = "In Progress" ORDER BY created DESC"#
        );
        assert_eq!(
            build_jql(None, Some("Done")),
            r#"status = "Done" ORDER BY created DESC"#
        );
    }

    #[test]
    fn text_search_escapes_quotes() {
        assert_eq!(
            text_jql(r#"login "bug""#),
            r#"text ~ "login \"bug\"" ORDER BY created DESC"#
        );
    }

    #[test]
    fn priority_names_are_capitalized() {
        assert_eq!(capitalize("high"), "High");
        assert_eq!(capitalize("HIGHEST"), "Highest");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn adf_has_one_paragraph_per_line() {
        let doc = adf_document("first\n\nsecond");
        assert_eq!(doc["type"], "doc");
        assert_eq!(doc["content"].as_array().unwrap().len(), 2);
        assert_eq!(doc["content"][1]["content"][0]["text"], "second");
    }

    #[test]
    fn transition_matches_name_or_target() {
        let available = json!({"transitions": [
            {"id": "11", "name": "Start work", "to": {"name": "In Progress"}},
            {"id": "31", "name": "Done", "to": {"name": "Done"}}
        ]});
        assert_eq!(find_transition(&available, "in progress").as_deref(), Some("11"));
        assert_eq!(find_transition(&available, "START WORK").as_deref(), Some("11"));
        assert_eq!(find_transition(&available, "done").as_deref(), Some("31"));
        assert!(find_transition(&available, "In Review").is_none());
        assert!(find_transition(&json!({}), "Done").is_none());
    }

    #[test]
    fn issue_shape_defaults_assignee() {
        let issue = json!({
            "key": "PROJ-1",
            "fields": {"summary": "Fix login", "status": {"name": "To Do"}, "assignee": null}
        });
        let shaped = shape_issue(&issue);
        assert_eq!(shaped["key"], "PROJ-1");
        assert_eq!(shaped["status"], "To Do");
        assert_eq!(shaped["assignee"], "Unassigned");
    }

    #[test]
    fn credentials_debug_hides_token() {
        let creds = JiraCredentials {
            server: "https://acme.atlassian.net".into(),
            email: "a@acme.io".into(),
            token: "sekrit".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(!rendered.contains("sekrit"));
        assert!(rendered.contains("acme.atlassian.net"));
    }

    #[tokio::test]
    async fn unconfigured_without_credentials() {
        let connector = JiraConnector::connect(None, 5).await;
        assert_eq!(connector.state(), &ConnectionState::Unconfigured);
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        assert!(report.message.contains("JIRA_TOKEN"));
    }

    #[tokio::test]
    async fn unreachable_server_fails_handshake() {
        let creds = JiraCredentials {
            server: "http://127.0.0.1:9".into(),
            email: "a@b.c".into(),
            token: "t".into(),
        };
        let connector = JiraConnector::connect(Some(creds), 2).await;
        assert!(matches!(connector.state(), ConnectionState::Failed { .. }));
    }
}
