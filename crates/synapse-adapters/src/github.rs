//! GitHub REST API v3 connector.
//!
//! Covers repositories, branches, commits, pull requests, issues and file
//! contents.  Authenticates with a bearer token; the handshake is
//! `GET /user`, whose `login` is remembered so that bare repository names
//! can be qualified with the authenticated owner.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use serde_json::{Value, json};
use synapse_kernel::{Outcome, Params, ServiceId, StatusReport};
use tracing::{debug, info, warn};

use crate::error::{AdapterError, Result};
use crate::http::{self, Endpoint};
use crate::operations::{
    DefaultValue, OperationSpec, OperationTable, optional_text, require_int, require_text,
};
use crate::state::ConnectionState;
use crate::traits::Connector;

/// Default GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const REPO: &[&str] = &["repo"];

static OPERATIONS: OperationTable = OperationTable::new(
    ServiceId::GitHub,
    &[
        OperationSpec {
            name: "create_repo",
            summary: "Create a repository for the authenticated user",
            required: &["name"],
            defaults: &[
                ("description", DefaultValue::Text("")),
                ("private", DefaultValue::Flag(false)),
                ("auto_init", DefaultValue::Flag(true)),
            ],
        },
        OperationSpec {
            name: "delete_repo",
            summary: "Delete a repository",
            required: REPO,
            defaults: &[],
        },
        OperationSpec {
            name: "list_repos",
            summary: "List the authenticated user's repositories",
            required: &[],
            defaults: &[
                ("sort", DefaultValue::Text("updated")),
                ("per_page", DefaultValue::Integer(10)),
            ],
        },
        OperationSpec {
            name: "fork_repo",
            summary: "Fork a repository",
            required: REPO,
            defaults: &[],
        },
        OperationSpec {
            name: "star_repo",
            summary: "Star a repository",
            required: REPO,
            defaults: &[],
        },
        OperationSpec {
            name: "unstar_repo",
            summary: "Remove a star from a repository",
            required: REPO,
            defaults: &[],
        },
        OperationSpec {
            name: "push_commit",
            summary: "Create or update a file in one commit",
            required: &["repo", "file_path"],
            defaults: &[
                ("branch", DefaultValue::Text("main")),
                ("message", DefaultValue::Text("Update via Synapse")),
                ("content", DefaultValue::Text("# New file\n\nCreated via Synapse")),
            ],
        },
        OperationSpec {
            name: "get_commits",
            summary: "List recent commits",
            required: REPO,
            defaults: &[("per_page", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "create_pr",
            summary: "Open a pull request",
            required: &["repo", "title", "head"],
            defaults: &[
                ("body", DefaultValue::Text("")),
                ("base", DefaultValue::Text("main")),
            ],
        },
        OperationSpec {
            name: "merge_pr",
            summary: "Merge a pull request",
            required: &["repo", "pr_number"],
            defaults: &[
                ("merge_method", DefaultValue::Text("merge")),
                ("commit_message", DefaultValue::Text("")),
            ],
        },
        OperationSpec {
            name: "close_pr",
            summary: "Close a pull request without merging",
            required: &["repo", "pr_number"],
            defaults: &[],
        },
        OperationSpec {
            name: "list_prs",
            summary: "List pull requests",
            required: REPO,
            defaults: &[
                ("state", DefaultValue::Text("open")),
                ("per_page", DefaultValue::Integer(10)),
            ],
        },
        OperationSpec {
            name: "list_issues",
            summary: "List issues",
            required: REPO,
            defaults: &[
                ("state", DefaultValue::Text("open")),
                ("per_page", DefaultValue::Integer(10)),
            ],
        },
        OperationSpec {
            name: "create_issue",
            summary: "Open an issue",
            required: &["repo", "title"],
            defaults: &[("body", DefaultValue::Text(""))],
        },
        OperationSpec {
            name: "close_issue",
            summary: "Close an issue",
            required: &["repo", "issue_number"],
            defaults: &[],
        },
        OperationSpec {
            name: "open_issue",
            summary: "Reopen an issue",
            required: &["repo", "issue_number"],
            defaults: &[],
        },
        OperationSpec {
            name: "comment_issue",
            summary: "Comment on an issue",
            required: &["repo", "issue_number", "comment"],
            defaults: &[],
        },
        OperationSpec {
            name: "read_file",
            summary: "Read a file's contents",
            required: &["repo", "file_path"],
            defaults: &[("branch", DefaultValue::Text("main"))],
        },
        OperationSpec {
            name: "get_file_info",
            summary: "Show a file's metadata",
            required: &["repo", "file_path"],
            defaults: &[("branch", DefaultValue::Text("main"))],
        },
        OperationSpec {
            name: "create_branch",
            summary: "Create a branch from another branch",
            required: &["repo", "branch_name"],
            defaults: &[("source_branch", DefaultValue::Text("main"))],
        },
        OperationSpec {
            name: "delete_branch",
            summary: "Delete a branch",
            required: &["repo", "branch_name"],
            defaults: &[],
        },
        OperationSpec {
            name: "status",
            summary: "Connection status",
            required: &[],
            defaults: &[],
        },
    ],
);

/// GitHub connector.
pub struct GitHubConnector {
    state: ConnectionState,
    token: Option<String>,
    /// Login of the authenticated user, learned during the handshake.
    login: Option<String>,
    endpoint: Endpoint,
    client: Option<reqwest::Client>,
}

impl GitHubConnector {
    /// Build the connector and run the handshake when a token is present.
    pub async fn connect(token: Option<String>, endpoint: Endpoint) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let mut connector = Self {
            state: ConnectionState::initial(token.is_some()),
            token,
            login: None,
            client: endpoint
                .client()
                .inspect_err(|e| warn!(error = %e, "GitHub HTTP client unavailable"))
                .ok(),
            endpoint,
        };
        if connector.token.is_none() {
            debug!("GITHUB_TOKEN not set, GitHub connector left unconfigured");
            return connector;
        }

        let user = match connector.request(Method::GET, "/user") {
            Ok(request) => connector.send(request, "handshake").await,
            Err(e) => Err(e),
        };
        let handshake = user.map(|user| {
            connector.login = user.get("login").and_then(Value::as_str).map(str::to_owned);
        });
        match &handshake {
            Ok(()) => info!(login = connector.login.as_deref().unwrap_or("?"), "GitHub connected"),
            Err(e) => warn!(error = %e, "GitHub handshake failed"),
        }
        connector.state = connector.state.clone().complete(handshake);
        connector
    }

    /// Build from `GITHUB_TOKEN`.
    pub async fn from_env(endpoint: Endpoint) -> Self {
        Self::connect(std::env::var("GITHUB_TOKEN").ok(), endpoint).await
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
                service: "GitHub".into(),
            });
        };
        let builder = client
            .request(method, self.endpoint.url(path))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        Ok(match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        if self.token.is_none() {
            return Err(AdapterError::AuthRequired {
                service: "GitHub".into(),
                credential: "GITHUB_TOKEN".into(),
            });
        }
        http::send_json(request, ServiceId::GitHub, operation, self.endpoint.timeout_secs).await
    }

    fn repo(&self, params: &Params, operation: &str) -> Result<String> {
        let repo = require_text(params, operation, "repo")?;
        Ok(qualify_repo(self.login.as_deref(), &repo))
    }

    // -----------------------------------------------------------------------
    // Repositories
    // -----------------------------------------------------------------------

    async fn create_repo(&self, params: &Params) -> Result<Outcome> {
        let name = require_text(params, "create_repo", "name")?;
        let body = json!({
            "name": name,
            "description": optional_text(params, "description").unwrap_or_default(),
            "private": params.get_bool("private").unwrap_or(false),
            "auto_init": params.get_bool("auto_init").unwrap_or(true),
        });
        let repo = self
            .send(self.request(Method::POST, "/user/repos")?.json(&body), "create_repo")
            .await?;
        Ok(Outcome::ok(format!("✅ Repository '{name}' created successfully!"))
            .with("full_name", str_field(&repo, "full_name"))
            .with("repo_url", str_field(&repo, "html_url")))
    }

    async fn delete_repo(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "delete_repo")?;
        self.send(self.request(Method::DELETE, &format!("/repos/{repo}"))?, "delete_repo")
            .await?;
        Ok(Outcome::ok(format!("🗑️ Repository '{repo}' deleted.")))
    }

    async fn list_repos(&self, params: &Params) -> Result<Outcome> {
        let sort = optional_text(params, "sort").unwrap_or_else(|| "updated".into());
        let per_page = params.get_int("per_page").unwrap_or(10);
        let request = self
            .request(Method::GET, "/user/repos")?
            .query(&[("sort", sort), ("per_page", per_page.to_string())]);
        let repos = self.send(request, "list_repos").await?;
        let repositories = shape_repos(&repos);
        Ok(
            Outcome::ok(format!("Found {} repositories", repositories.len()))
                .with("repositories", repositories),
        )
    }

    async fn fork_repo(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "fork_repo")?;
        let fork = self
            .send(self.request(Method::POST, &format!("/repos/{repo}/forks"))?, "fork_repo")
            .await?;
        Ok(Outcome::ok(format!("✅ Forked '{repo}' successfully!"))
            .with("fork_url", str_field(&fork, "html_url")))
    }

    async fn set_star(&self, params: &Params, starred: bool) -> Result<Outcome> {
        let (operation, method) = if starred {
            ("star_repo", Method::PUT)
        } else {
            ("unstar_repo", Method::DELETE)
        };
        let repo = self.repo(params, operation)?;
        let request = self
            .request(method, &format!("/user/starred/{repo}"))?
            .header("Content-Length", "0");
        self.send(request, operation).await?;
        let message = if starred {
            format!("⭐ Starred '{repo}'!")
        } else {
            format!("☆ Unstarred '{repo}'.")
        };
        Ok(Outcome::ok(message).with("repo_url", repo_html_url(&repo)))
    }

    // -----------------------------------------------------------------------
    // Commits and branches
    // -----------------------------------------------------------------------

    async fn push_commit(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "push_commit")?;
        let file_path = require_text(params, "push_commit", "file_path")?;
        let branch = optional_text(params, "branch").unwrap_or_else(|| "main".into());
        let message =
            optional_text(params, "message").unwrap_or_else(|| "Update via Synapse".into());
        let content = params.get_str("content").unwrap_or_default();

        self.ensure_branch(&repo, &branch).await?;

        let existing = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/contents/{file_path}"))?
                    .query(&[("ref", branch.as_str())]),
                "push_commit",
            )
            .await;
        let existing_sha = match existing {
            Ok(file) => file.get("sha").and_then(Value::as_str).map(str::to_owned),
            Err(AdapterError::Api { status: 404, .. }) => None,
            Err(e) => return Err(e),
        };

        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
            "branch": branch,
        });
        if let Some(sha) = existing_sha {
            body["sha"] = Value::String(sha);
        }

        let result = self
            .send(
                self.request(Method::PUT, &format!("/repos/{repo}/contents/{file_path}"))?
                    .json(&body),
                "push_commit",
            )
            .await?;
        let commit = result.get("commit").cloned().unwrap_or(Value::Null);
        Ok(Outcome::ok(format!("✅ Pushed commit to '{repo}/{branch}'!"))
            .with("commit_sha", str_field(&commit, "sha"))
            .with("commit_url", str_field(&commit, "html_url"))
            .with(
                "file_url",
                result
                    .get("content")
                    .map(|c| str_field(c, "html_url"))
                    .unwrap_or_default(),
            ))
    }

    /// Create `branch` from the repository's default branch if it does not
    /// exist yet.
    async fn ensure_branch(&self, repo: &str, branch: &str) -> Result<()> {
        let probe = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/branches/{branch}"))?,
                "push_commit",
            )
            .await;
        match probe {
            Ok(_) => return Ok(()),
            Err(AdapterError::Api { status: 404, .. }) => {}
            Err(e) => return Err(e),
        }

        let info = self
            .send(self.request(Method::GET, &format!("/repos/{repo}"))?, "push_commit")
            .await?;
        let default_branch = info
            .get("default_branch")
            .and_then(Value::as_str)
            .unwrap_or("main");
        let sha = self.branch_head(repo, default_branch, "push_commit").await?;
        self.create_ref(repo, branch, &sha, "push_commit").await?;
        debug!(repo, branch, from = default_branch, "created missing branch");
        Ok(())
    }

    async fn branch_head(&self, repo: &str, branch: &str, operation: &str) -> Result<String> {
        let reference = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/git/ref/heads/{branch}"))?,
                operation,
            )
            .await?;
        reference
            .pointer("/object/sha")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| AdapterError::RequestFailed {
                operation: operation.to_owned(),
                reason: format!("branch '{branch}' has no head commit"),
            })
    }

    async fn create_ref(&self, repo: &str, branch: &str, sha: &str, operation: &str) -> Result<()> {
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        self.send(
            self.request(Method::POST, &format!("/repos/{repo}/git/refs"))?.json(&body),
            operation,
        )
        .await?;
        Ok(())
    }

    async fn get_commits(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "get_commits")?;
        let per_page = params.get_int("per_page").unwrap_or(10);
        let mut query = vec![("per_page", per_page.to_string())];
        if let Some(branch) = optional_text(params, "branch") {
            query.push(("sha", branch));
        }
        let list = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/commits"))?.query(&query),
                "get_commits",
            )
            .await?;
        let commits = shape_commits(&list);
        Ok(Outcome::ok(format!("Found {} commits in {repo}", commits.len()))
            .with("commits", commits))
    }

    async fn create_branch(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "create_branch")?;
        let branch = require_text(params, "create_branch", "branch_name")?;
        let source = optional_text(params, "source_branch").unwrap_or_else(|| "main".into());
        let sha = self.branch_head(&repo, &source, "create_branch").await?;
        self.create_ref(&repo, &branch, &sha, "create_branch").await?;
        Ok(
            Outcome::ok(format!("✅ Branch '{branch}' created from '{source}'!"))
                .with("repo_url", format!("{}/tree/{branch}", repo_html_url(&repo))),
        )
    }

    async fn delete_branch(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "delete_branch")?;
        let branch = require_text(params, "delete_branch", "branch_name")?;
        self.send(
            self.request(Method::DELETE, &format!("/repos/{repo}/git/refs/heads/{branch}"))?,
            "delete_branch",
        )
        .await?;
        Ok(Outcome::ok(format!("🗑️ Branch '{branch}' deleted from '{repo}'.")))
    }

    // -----------------------------------------------------------------------
    // Pull requests
    // -----------------------------------------------------------------------

    async fn create_pr(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "create_pr")?;
        let title = require_text(params, "create_pr", "title")?;
        let body = json!({
            "title": title,
            "head": require_text(params, "create_pr", "head")?,
            "base": optional_text(params, "base").unwrap_or_else(|| "main".into()),
            "body": optional_text(params, "body").unwrap_or_default(),
        });
        let pr = self
            .send(
                self.request(Method::POST, &format!("/repos/{repo}/pulls"))?.json(&body),
                "create_pr",
            )
            .await?;
        let number = pr.get("number").and_then(Value::as_i64).unwrap_or_default();
        Ok(Outcome::ok(format!("✅ Pull request #{number} '{title}' created!"))
            .with("number", number)
            .with("pr_url", str_field(&pr, "html_url")))
    }

    async fn merge_pr(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "merge_pr")?;
        let number = require_int(params, "merge_pr", "pr_number")?;
        let mut body = json!({
            "merge_method": optional_text(params, "merge_method").unwrap_or_else(|| "merge".into()),
        });
        if let Some(message) = optional_text(params, "commit_message") {
            body["commit_message"] = Value::String(message);
        }
        let merged = self
            .send(
                self.request(Method::PUT, &format!("/repos/{repo}/pulls/{number}/merge"))?
                    .json(&body),
                "merge_pr",
            )
            .await?;
        Ok(Outcome::ok(format!("✅ Pull request #{number} merged!"))
            .with("commit_sha", str_field(&merged, "sha"))
            .with("pr_url", format!("{}/pull/{number}", repo_html_url(&repo))))
    }

    async fn close_pr(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "close_pr")?;
        let number = require_int(params, "close_pr", "pr_number")?;
        let pr = self
            .send(
                self.request(Method::PATCH, &format!("/repos/{repo}/pulls/{number}"))?
                    .json(&json!({ "state": "closed" })),
                "close_pr",
            )
            .await?;
        Ok(Outcome::ok(format!("✅ Pull request #{number} closed."))
            .with("pr_url", str_field(&pr, "html_url")))
    }

    async fn list_prs(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "list_prs")?;
        let list = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/pulls"))?
                    .query(&list_query(params)),
                "list_prs",
            )
            .await?;
        let pull_requests = shape_issues(&list, false);
        Ok(
            Outcome::ok(format!("Found {} pull requests in {repo}", pull_requests.len()))
                .with("pull_requests", pull_requests),
        )
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    async fn list_issues(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "list_issues")?;
        let list = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/issues"))?
                    .query(&list_query(params)),
                "list_issues",
            )
            .await?;
        let issues = shape_issues(&list, true);
        Ok(Outcome::ok(format!("Found {} issues in {repo}", issues.len())).with("issues", issues))
    }

    async fn create_issue(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "create_issue")?;
        let title = require_text(params, "create_issue", "title")?;
        let mut body = json!({
            "title": title,
            "body": optional_text(params, "body").unwrap_or_default(),
        });
        let labels = split_labels(params.get_str("labels").unwrap_or_default());
        if !labels.is_empty() {
            body["labels"] = json!(labels);
        }
        let issue = self
            .send(
                self.request(Method::POST, &format!("/repos/{repo}/issues"))?.json(&body),
                "create_issue",
            )
            .await?;
        let number = issue.get("number").and_then(Value::as_i64).unwrap_or_default();
        Ok(Outcome::ok(format!("✅ Issue #{number} '{title}' created!"))
            .with("number", number)
            .with("issue_url", str_field(&issue, "html_url")))
    }

    async fn set_issue_state(&self, params: &Params, open: bool) -> Result<Outcome> {
        let operation = if open { "open_issue" } else { "close_issue" };
        let repo = self.repo(params, operation)?;
        let number = require_int(params, operation, "issue_number")?;
        let state = if open { "open" } else { "closed" };
        let issue = self
            .send(
                self.request(Method::PATCH, &format!("/repos/{repo}/issues/{number}"))?
                    .json(&json!({ "state": state })),
                operation,
            )
            .await?;
        let verb = if open { "reopened" } else { "closed" };
        Ok(Outcome::ok(format!("✅ Issue #{number} {verb}."))
            .with("issue_url", str_field(&issue, "html_url")))
    }

    async fn comment_issue(&self, params: &Params) -> Result<Outcome> {
        let repo = self.repo(params, "comment_issue")?;
        let number = require_int(params, "comment_issue", "issue_number")?;
        let comment = require_text(params, "comment_issue", "comment")?;
        let created = self
            .send(
                self.request(Method::POST, &format!("/repos/{repo}/issues/{number}/comments"))?
                    .json(&json!({ "body": comment })),
                "comment_issue",
            )
            .await?;
        Ok(Outcome::ok(format!("💬 Commented on issue #{number}."))
            .with("issue_url", str_field(&created, "html_url")))
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    async fn fetch_file(&self, params: &Params, operation: &str) -> Result<(String, Value)> {
        let repo = self.repo(params, operation)?;
        let file_path = require_text(params, operation, "file_path")?;
        let branch = optional_text(params, "branch").unwrap_or_else(|| "main".into());
        let file = self
            .send(
                self.request(Method::GET, &format!("/repos/{repo}/contents/{file_path}"))?
                    .query(&[("ref", branch.as_str())]),
                operation,
            )
            .await?;
        if file.is_array() {
            return Err(AdapterError::InvalidParams {
                operation: operation.to_owned(),
                reason: format!("'{file_path}' is a directory"),
            });
        }
        Ok((file_path, file))
    }

    async fn read_file(&self, params: &Params) -> Result<Outcome> {
        let (file_path, file) = self.fetch_file(params, "read_file").await?;
        let content = decode_content(str_field(&file, "content").as_str());
        let size = file.get("size").and_then(Value::as_i64).unwrap_or_default();
        Ok(Outcome::ok(format!("📄 {file_path} ({size} bytes)\n\n{content}"))
            .with("file_path", file_path)
            .with("content", content)
            .with("sha", str_field(&file, "sha"))
            .with("size", size)
            .with("file_url", str_field(&file, "html_url")))
    }

    async fn get_file_info(&self, params: &Params) -> Result<Outcome> {
        let (file_path, file) = self.fetch_file(params, "get_file_info").await?;
        let size = file.get("size").and_then(Value::as_i64).unwrap_or_default();
        let kind = str_field(&file, "type");
        Ok(Outcome::ok(format!("📄 {file_path}: {kind}, {size} bytes"))
            .with("file_path", file_path)
            .with("sha", str_field(&file, "sha"))
            .with("size", size)
            .with("type", kind)
            .with("file_url", str_field(&file, "html_url")))
    }

    async fn status_outcome(&self) -> Result<Outcome> {
        let report = self.status().await?;
        Ok(Outcome::ok(report.message).with("status", report.status.as_str()))
    }
}

#[async_trait]
impl Connector for GitHubConnector {
    fn service(&self) -> ServiceId {
        ServiceId::GitHub
    }

    fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn operations(&self) -> &'static OperationTable {
        &OPERATIONS
    }

    async fn status(&self) -> Result<StatusReport> {
        if let Some(report) = self.state.offline_report(ServiceId::GitHub) {
            return Ok(report);
        }
        let user = self.send(self.request(Method::GET, "/user")?, "status").await?;
        let login = user.get("login").and_then(Value::as_str).unwrap_or("unknown");
        Ok(StatusReport::connected(format!("Connected to GitHub as {login}")))
    }

    async fn execute(&self, operation: &str, params: Params) -> Result<Outcome> {
        debug!(operation, "executing GitHub operation");
        match operation {
            "create_repo" => self.create_repo(&params).await,
            "delete_repo" => self.delete_repo(&params).await,
            "list_repos" => self.list_repos(&params).await,
            "fork_repo" => self.fork_repo(&params).await,
            "star_repo" => self.set_star(&params, true).await,
            "unstar_repo" => self.set_star(&params, false).await,
            "push_commit" => self.push_commit(&params).await,
            "get_commits" => self.get_commits(&params).await,
            "create_pr" => self.create_pr(&params).await,
            "merge_pr" => self.merge_pr(&params).await,
            "close_pr" => self.close_pr(&params).await,
            "list_prs" => self.list_prs(&params).await,
            "list_issues" => self.list_issues(&params).await,
            "create_issue" => self.create_issue(&params).await,
            "close_issue" => self.set_issue_state(&params, false).await,
            "open_issue" => self.set_issue_state(&params, true).await,
            "comment_issue" => self.comment_issue(&params).await,
            "read_file" => self.read_file(&params).await,
            "get_file_info" => self.get_file_info(&params).await,
            "create_branch" => self.create_branch(&params).await,
            "delete_branch" => self.delete_branch(&params).await,
            "status" => self.status_outcome().await,
            _ => Err(AdapterError::UnknownOperation {
                service: "GitHub".into(),
                operation: operation.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Qualify a bare repository name with the authenticated owner.
///
/// Full `https://github.com/owner/name` URLs and `.git` suffixes are
/// reduced to `owner/name`.
pub fn qualify_repo(login: Option<&str>, repo: &str) -> String {
    let repo = repo.trim();
    let repo = repo
        .strip_prefix("https://github.com/")
        .or_else(|| repo.strip_prefix("http://github.com/"))
        .or_else(|| repo.strip_prefix("github.com/"))
        .unwrap_or(repo);
    let repo = repo.trim_end_matches('/');
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    match login {
        Some(owner) if !repo.contains('/') => format!("{owner}/{repo}"),
        _ => repo.to_owned(),
    }
}

fn repo_html_url(full_name: &str) -> String {
    format!("https://github.com/{full_name}")
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn list_query(params: &Params) -> Vec<(&'static str, String)> {
    vec![
        ("state", optional_text(params, "state").unwrap_or_else(|| "open".into())),
        ("per_page", params.get_int("per_page").unwrap_or(10).to_string()),
    ]
}

/// Split a comma separated label list.
pub fn split_labels(labels: &str) -> Vec<String> {
    labels
        .split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Decode the base64 `content` field of a contents response.
pub fn decode_content(encoded: &str) -> String {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64.decode(compact) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(_) => String::new(),
    }
}

/// Reduce a repository listing to the fields the formatter renders.
pub fn shape_repos(list: &Value) -> Vec<Value> {
    list.as_array()
        .map(|repos| {
            repos
                .iter()
                .map(|r| {
                    json!({
                        "name": str_field(r, "name"),
                        "full_name": str_field(r, "full_name"),
                        "stars": r.get("stargazers_count").and_then(Value::as_i64).unwrap_or(0),
                        "private": r.get("private").and_then(Value::as_bool).unwrap_or(false),
                        "url": str_field(r, "html_url"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce an issue or pull request listing.  The issues endpoint also
/// returns pull requests; `skip_pulls` drops them.
pub fn shape_issues(list: &Value, skip_pulls: bool) -> Vec<Value> {
    list.as_array()
        .map(|items| {
            items
                .iter()
                .filter(|i| !(skip_pulls && i.get("pull_request").is_some()))
                .map(|i| {
                    json!({
                        "number": i.get("number").and_then(Value::as_i64).unwrap_or(0),
                        "title": str_field(i, "title"),
                        "state": str_field(i, "state"),
                        "user": i.pointer("/user/login").and_then(Value::as_str).unwrap_or_default(),
                        "url": str_field(i, "html_url"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a commit listing to short SHAs and first message lines.
pub fn shape_commits(list: &Value) -> Vec<Value> {
    list.as_array()
        .map(|commits| {
            commits
                .iter()
                .map(|c| {
                    let sha = str_field(c, "sha");
                    let message = c
                        .pointer("/commit/message")
                        .and_then(Value::as_str)
                        .and_then(|m| m.lines().next())
                        .unwrap_or_default();
                    json!({
                        "sha": sha.chars().take(7).collect::<String>(),
                        "text": message,
                        "author": c.pointer("/commit/author/name").and_then(Value::as_str).unwrap_or_default(),
                        "created": c.pointer("/commit/author/date").and_then(Value::as_str).unwrap_or_default(),
                        "url": str_field(c, "html_url"),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use synapse_kernel::StatusState;

    use super::*;

    #[test]
    fn qualify_bare_names_with_login() {
        assert_eq!(qualify_repo(Some("octocat"), "hello"), "octocat/hello");
        assert_eq!(qualify_repo(Some("octocat"), "rust-lang/rust"), "rust-lang/rust");
        assert_eq!(qualify_repo(None, "hello"), "hello");
    }

    #[test]
    fn qualify_strips_urls_and_git_suffix() {
        assert_eq!(
            qualify_repo(None, "https://github.com/owner/test.git"),
            "owner/test"
        );
        assert_eq!(qualify_repo(Some("me"), "github.com/owner/test/"), "owner/test");
    }

    #[test]
    fn labels_are_split_and_trimmed() {
        assert_eq!(split_labels("bug, help wanted,,"), vec!["bug", "help wanted"]);
        assert!(split_labels("").is_empty());
    }

    #[test]
    fn content_decoding_tolerates_line_breaks() {
        assert_eq!(decode_content("SGVs\nbG8=\n"), "Hello");
        assert_eq!(decode_content("not base64!"), "");
    }

    #[test]
    fn issue_listing_skips_pull_requests() {
        let list = json!([
            {"number": 1, "title": "Bug", "state": "open", "user": {"login": "a"}, "html_url": "u1"},
            {"number": 2, "title": "PR", "state": "open", "pull_request": {}, "html_url": "u2"},
        ]);
        let issues = shape_issues(&list, true);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0]["number"], 1);
        assert_eq!(issues[0]["user"], "a");
        assert_eq!(shape_issues(&list, false).len(), 2);
    }

    #[test]
    fn repo_and_commit_shapes() {
        let repos = shape_repos(&json!([{"name": "x", "full_name": "o/x", "stargazers_count": 3}]));
        assert_eq!(repos[0]["stars"], 3);
        assert_eq!(repos[0]["private"], false);

        let commits = shape_commits(&json!([{
            "sha": "0123456789abcdef",
            "commit": {"message": "Fix bug\n\nDetails", "author": {"name": "A", "date": "2024-01-01"}}
        }]));
        assert_eq!(commits[0]["sha"], "0123456");
        assert_eq!(commits[0]["text"], "Fix bug");
        assert!(shape_repos(&json!({"message": "oops"})).is_empty());
    }

    #[test]
    fn table_covers_catalog() {
        let table = GitHubConnector::table();
        assert_eq!(table.len(), 22);
        let spec = table.get("push_commit").unwrap();
        assert_eq!(spec.required, &["repo", "file_path"]);
        let mut params = Params::new().with("repo", "a/b").with("file_path", "README.md");
        spec.apply_defaults(&mut params);
        assert_eq!(params.get_str("branch"), Some("main"));
        assert_eq!(params.get_str("content"), Some("# New file\n\nCreated via Synapse"));
    }

    #[tokio::test]
    async fn missing_token_leaves_connector_unconfigured() {
        let connector =
            GitHubConnector::connect(Some("  ".into()), Endpoint::new(DEFAULT_API_URL, 5)).await;
        assert_eq!(connector.state(), &ConnectionState::Unconfigured);
        assert!(!connector.is_connected());

        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        assert!(report.message.contains("GITHUB_TOKEN"));
    }

    #[tokio::test]
    async fn failed_handshake_is_terminal() {
        let endpoint = Endpoint::new("http://127.0.0.1:9", 2);
        let connector = GitHubConnector::connect(Some("ghp_test".into()), endpoint).await;
        assert!(matches!(connector.state(), ConnectionState::Failed { .. }));
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::Disconnected);
    }

    #[tokio::test]
    async fn unknown_operation_is_rejected() {
        let connector = GitHubConnector::connect(None, Endpoint::new(DEFAULT_API_URL, 5)).await;
        let err = connector
            .execute("teleport_repo", Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::UnknownOperation { .. }));
    }

    #[tokio::test]
    async fn missing_http_client_is_not_connected() {
        let connector = GitHubConnector {
            state: ConnectionState::Connecting,
            token: Some("ghp_test".into()),
            login: None,
            endpoint: Endpoint::new(DEFAULT_API_URL, 5),
            client: None,
        };
        let err = connector
            .execute("list_repos", Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotConnected { ref service } if service == "GitHub"));
    }
}
