//! Slack Web API connector.
//!
//! Every Web API method answers HTTP 200 and signals failure through an
//! `ok: false` payload; [`check_ok`] turns those into
//! [`AdapterError::Api`].  Channels may be named (`#general`, `general`)
//! or given by ID; names are resolved through `conversations.list`.

use std::path::Path;

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

/// Default Slack Web API base URL.
pub const DEFAULT_API_URL: &str = "https://slack.com/api";

const CHANNEL_TS: &[&str] = &["channel", "ts"];

static OPERATIONS: OperationTable = OperationTable::new(
    ServiceId::Slack,
    &[
        OperationSpec {
            name: "list_channels",
            summary: "List channels",
            required: &[],
            defaults: &[("limit", DefaultValue::Integer(100))],
        },
        OperationSpec {
            name: "create_channel",
            summary: "Create a channel",
            required: &["name"],
            defaults: &[("is_private", DefaultValue::Flag(false))],
        },
        OperationSpec {
            name: "join_channel",
            summary: "Join a channel",
            required: &[],
            defaults: &[],
        },
        OperationSpec {
            name: "send_message",
            summary: "Post a message, optionally in a thread",
            required: &["channel", "text"],
            defaults: &[],
        },
        OperationSpec {
            name: "list_messages",
            summary: "Show recent messages in a channel",
            required: &["channel"],
            defaults: &[("limit", DefaultValue::Integer(10))],
        },
        OperationSpec {
            name: "update_message",
            summary: "Edit a message",
            required: CHANNEL_TS,
            defaults: &[],
        },
        OperationSpec {
            name: "delete_message",
            summary: "Delete a message",
            required: CHANNEL_TS,
            defaults: &[],
        },
        OperationSpec {
            name: "list_users",
            summary: "List workspace members",
            required: &[],
            defaults: &[("limit", DefaultValue::Integer(100))],
        },
        OperationSpec {
            name: "get_user_info",
            summary: "Look up a user by ID or email",
            required: &[],
            defaults: &[],
        },
        OperationSpec {
            name: "upload_file",
            summary: "Upload a file or snippet to a channel",
            required: &["channel"],
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

/// Slack connector.
pub struct SlackConnector {
    state: ConnectionState,
    token: Option<String>,
    endpoint: Endpoint,
    client: Option<reqwest::Client>,
}

impl SlackConnector {
    /// Build the connector and run `auth.test` when a token is present.
    pub async fn connect(token: Option<String>, endpoint: Endpoint) -> Self {
        let token = token.filter(|t| !t.trim().is_empty());
        let mut connector = Self {
            state: ConnectionState::initial(token.is_some()),
            token,
            client: endpoint
                .client()
                .inspect_err(|e| warn!(error = %e, "Slack HTTP client unavailable"))
                .ok(),
            endpoint,
        };
        if connector.token.is_none() {
            debug!("SLACK_TOKEN not set, Slack connector left unconfigured");
            return connector;
        }

        let handshake = connector.call(Method::POST, "auth.test", "handshake").await;
        match &handshake {
            Ok(auth) => info!(
                team = auth.get("team").and_then(serde_json::Value::as_str).unwrap_or("?"),
                "Slack connected"
            ),
            Err(e) => warn!(error = %e, "Slack handshake failed"),
        }
        connector.state = connector.state.clone().complete(handshake.map(|_| ()));
        connector
    }

    /// Build from `SLACK_TOKEN`.
    pub async fn from_env(endpoint: Endpoint) -> Self {
        Self::connect(std::env::var("SLACK_TOKEN").ok(), endpoint).await
    }

    /// The static operation catalog.
    pub fn table() -> &'static OperationTable {
        &OPERATIONS
    }

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: Method, api_method: &str) -> Result<reqwest::RequestBuilder> {
        let Some(client) = &self.client else {
            return Err(AdapterError::NotConnected {
                service: "Slack".into(),
            });
        };
        let builder = client
            .request(method, self.endpoint.url(&format!("/{api_method}")));
        Ok(match &self.token {
            Some(token) => builder.header("Authorization", format!("Bearer {token}")),
            None => builder,
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, operation: &str) -> Result<Value> {
        if self.token.is_none() {
            return Err(AdapterError::AuthRequired {
                service: "Slack".into(),
                credential: "SLACK_TOKEN".into(),
            });
        }
        let value =
            http::send_json(request, ServiceId::Slack, operation, self.endpoint.timeout_secs)
                .await?;
        check_ok(value)
    }

    async fn call(&self, method: Method, api_method: &str, operation: &str) -> Result<Value> {
        self.send(self.request(method, api_method)?, operation).await
    }

    async fn post(&self, api_method: &str, body: &Value, operation: &str) -> Result<Value> {
        self.send(self.request(Method::POST, api_method)?.json(body), operation)
            .await
    }

    async fn get<T: serde::Serialize + ?Sized>(
        &self,
        api_method: &str,
        query: &T,
        operation: &str,
    ) -> Result<Value> {
        self.send(self.request(Method::GET, api_method)?.query(query), operation)
            .await
    }

    /// Resolve a channel name or `#name` to its ID.  IDs pass through.
    async fn resolve_channel(&self, channel: &str, operation: &str) -> Result<String> {
        let name = channel.trim().trim_start_matches('#');
        if is_channel_id(name) {
            return Ok(name.to_owned());
        }
        let list = self
            .get(
                "conversations.list",
                &[
                    ("limit", "1000"),
                    ("exclude_archived", "true"),
                    ("types", "public_channel,private_channel"),
                ],
                operation,
            )
            .await?;
        find_channel_id(&list, name).ok_or_else(|| AdapterError::InvalidParams {
            operation: operation.to_owned(),
            reason: format!("channel '#{name}' not found"),
        })
    }

    async fn channel_param(&self, params: &Params, operation: &str) -> Result<String> {
        let channel = require_text(params, operation, "channel")?;
        self.resolve_channel(&channel, operation).await
    }

    // -----------------------------------------------------------------------
    // Channels
    // -----------------------------------------------------------------------

    async fn list_channels(&self, params: &Params) -> Result<Outcome> {
        let limit = params.get_int("limit").unwrap_or(100).to_string();
        let list = self
            .get(
                "conversations.list",
                &[
                    ("limit", limit.as_str()),
                    ("exclude_archived", "true"),
                    ("types", "public_channel,private_channel"),
                ],
                "list_channels",
            )
            .await?;
        let channels = shape_channels(&list);
        Ok(Outcome::ok(format!("Found {} channels", channels.len())).with("channels", channels))
    }

    async fn create_channel(&self, params: &Params) -> Result<Outcome> {
        let name = require_text(params, "create_channel", "name")?;
        let name = name.trim_start_matches('#').to_lowercase();
        let created = self
            .post(
                "conversations.create",
                &json!({ "name": name, "is_private": params.get_bool("is_private").unwrap_or(false) }),
                "create_channel",
            )
            .await?;
        Ok(Outcome::ok(format!("✅ Channel #{name} created!"))
            .with("channel_id", created.pointer("/channel/id").cloned().unwrap_or(Value::Null)))
    }

    async fn join_channel(&self, params: &Params) -> Result<Outcome> {
        let channel = optional_text(params, "channel_id")
            .or_else(|| optional_text(params, "channel_name"))
            .or_else(|| optional_text(params, "channel"))
            .ok_or_else(|| AdapterError::missing("join_channel", "channel_name"))?;
        let channel_id = self.resolve_channel(&channel, "join_channel").await?;
        let joined = self
            .post("conversations.join", &json!({ "channel": channel_id }), "join_channel")
            .await?;
        let name = joined
            .pointer("/channel/name")
            .and_then(Value::as_str)
            .unwrap_or(channel.trim_start_matches('#'))
            .to_owned();
        Ok(Outcome::ok(format!("✅ Joined #{name}.")).with("channel_id", channel_id))
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    async fn send_message(&self, params: &Params) -> Result<Outcome> {
        let channel_id = self.channel_param(params, "send_message").await?;
        let text = require_text(params, "send_message", "text")?;
        let mut body = json!({ "channel": channel_id, "text": text });
        if let Some(thread_ts) = optional_text(params, "thread_ts") {
            body["thread_ts"] = Value::String(thread_ts);
        }
        let posted = self.post("chat.postMessage", &body, "send_message").await?;
        let ts = posted.get("ts").and_then(Value::as_str).unwrap_or_default().to_owned();

        let mut outcome = Outcome::ok("✅ Message sent!")
            .with("channel", channel_id.clone())
            .with("ts", ts.clone());
        // Permalink lookup failures are not fatal.
        match self
            .get(
                "chat.getPermalink",
                &[("channel", channel_id.as_str()), ("message_ts", ts.as_str())],
                "send_message",
            )
            .await
        {
            Ok(link) => {
                if let Some(permalink) = link.get("permalink").and_then(Value::as_str) {
                    outcome = outcome.with("permalink", permalink);
                }
            }
            Err(e) => debug!(error = %e, "permalink lookup failed"),
        }
        Ok(outcome)
    }

    async fn list_messages(&self, params: &Params) -> Result<Outcome> {
        let channel_id = self.channel_param(params, "list_messages").await?;
        let limit = params.get_int("limit").unwrap_or(10).to_string();
        let history = self
            .get(
                "conversations.history",
                &[("channel", channel_id.as_str()), ("limit", limit.as_str())],
                "list_messages",
            )
            .await?;
        let messages = shape_messages(&history);
        Ok(Outcome::ok(format!("Found {} messages", messages.len())).with("messages", messages))
    }

    async fn update_message(&self, params: &Params) -> Result<Outcome> {
        let channel_id = self.channel_param(params, "update_message").await?;
        let ts = require_text(params, "update_message", "ts")?;
        let text = require_text(params, "update_message", "text")?;
        self.post(
            "chat.update",
            &json!({ "channel": channel_id, "ts": ts, "text": text }),
            "update_message",
        )
        .await?;
        Ok(Outcome::ok("✅ Message updated!").with("ts", ts))
    }

    async fn delete_message(&self, params: &Params) -> Result<Outcome> {
        let channel_id = self.channel_param(params, "delete_message").await?;
        let ts = require_text(params, "delete_message", "ts")?;
        self.post(
            "chat.delete",
            &json!({ "channel": channel_id, "ts": ts }),
            "delete_message",
        )
        .await?;
        Ok(Outcome::ok("🗑️ Message deleted.").with("ts", ts))
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    async fn list_users(&self, params: &Params) -> Result<Outcome> {
        let limit = params.get_int("limit").unwrap_or(100).to_string();
        let list = self
            .get("users.list", &[("limit", limit.as_str())], "list_users")
            .await?;
        let users: Vec<Value> = list
            .get("members")
            .and_then(Value::as_array)
            .map(|members| {
                members
                    .iter()
                    .filter(|m| !m.get("deleted").and_then(Value::as_bool).unwrap_or(false))
                    .map(shape_user)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Outcome::ok(format!("Found {} users", users.len())).with("users", users))
    }

    async fn get_user_info(&self, params: &Params) -> Result<Outcome> {
        let found = match (optional_text(params, "user_id"), optional_text(params, "email")) {
            (Some(user_id), _) => {
                self.get("users.info", &[("user", user_id.as_str())], "get_user_info")
                    .await?
            }
            (None, Some(email)) => {
                self.get("users.lookupByEmail", &[("email", email.as_str())], "get_user_info")
                    .await?
            }
            (None, None) => return Err(AdapterError::missing("get_user_info", "user_id")),
        };
        let user = shape_user(found.get("user").unwrap_or(&Value::Null));
        let name = user["name"].as_str().unwrap_or_default().to_owned();
        Ok(Outcome::ok(format!("👤 {name}")).with("user", user))
    }

    // -----------------------------------------------------------------------
    // Files
    // -----------------------------------------------------------------------

    async fn upload_file(&self, params: &Params) -> Result<Outcome> {
        let channel_id = self.channel_param(params, "upload_file").await?;
        let (filename, bytes) = match optional_text(params, "file_path") {
            Some(path) => {
                let bytes = tokio::fs::read(&path).await.map_err(|e| {
                    AdapterError::InvalidParams {
                        operation: "upload_file".into(),
                        reason: format!("cannot read '{path}': {e}"),
                    }
                })?;
                let name = Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "upload".into());
                (name, bytes)
            }
            None => {
                let content = require_text(params, "upload_file", "content")?;
                ("snippet.txt".to_owned(), content.into_bytes())
            }
        };
        let title = optional_text(params, "title").unwrap_or_else(|| filename.clone());

        let ticket = self
            .get(
                "files.getUploadURLExternal",
                &[
                    ("filename", filename.clone()),
                    ("length", bytes.len().to_string()),
                ],
                "upload_file",
            )
            .await?;
        let upload_url = ticket
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| AdapterError::RequestFailed {
                operation: "upload_file".into(),
                reason: "Slack did not return an upload URL".into(),
            })?;
        let file_id = ticket
            .get("file_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();

        let Some(client) = &self.client else {
            return Err(AdapterError::NotConnected {
                service: "Slack".into(),
            });
        };
        let response = client
            .post(upload_url)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                operation: "upload_file".into(),
                reason: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(AdapterError::Api {
                service: "Slack".into(),
                status: response.status().as_u16(),
                message: "file upload rejected".into(),
            });
        }

        let mut complete = json!({
            "files": [{ "id": file_id, "title": title }],
            "channel_id": channel_id,
        });
        if let Some(comment) = optional_text(params, "comment") {
            complete["initial_comment"] = Value::String(comment);
        }
        let completed = self
            .post("files.completeUploadExternal", &complete, "upload_file")
            .await?;
        let file_url = completed
            .pointer("/files/0/permalink")
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(Outcome::ok(format!("✅ Uploaded '{title}'!"))
            .with("file_id", file_id)
            .with("file_url", file_url))
    }

    async fn status_outcome(&self) -> Result<Outcome> {
        let report = self.status().await?;
        Ok(Outcome::ok(report.message).with("status", report.status.as_str()))
    }
}

#[async_trait]
impl Connector for SlackConnector {
    fn service(&self) -> ServiceId {
        ServiceId::Slack
    }

    fn state(&self) -> &ConnectionState {
        &self.state
    }

    fn operations(&self) -> &'static OperationTable {
        &OPERATIONS
    }

    async fn status(&self) -> Result<StatusReport> {
        if let Some(report) = self.state.offline_report(ServiceId::Slack) {
            return Ok(report);
        }
        let auth = self.call(Method::POST, "auth.test", "status").await?;
        let team = auth.get("team").and_then(serde_json::Value::as_str).unwrap_or("workspace");
        let user = auth.get("user").and_then(Value::as_str).unwrap_or("bot");
        Ok(StatusReport::connected(format!(
            "Connected to Slack workspace {team} as {user}"
        )))
    }

    async fn execute(&self, operation: &str, params: Params) -> Result<Outcome> {
        debug!(operation, "executing Slack operation");
        match operation {
            "list_channels" => self.list_channels(&params).await,
            "create_channel" => self.create_channel(&params).await,
            "join_channel" => self.join_channel(&params).await,
            "send_message" => self.send_message(&params).await,
            "list_messages" => self.list_messages(&params).await,
            "update_message" => self.update_message(&params).await,
            "delete_message" => self.delete_message(&params).await,
            "list_users" => self.list_users(&params).await,
            "get_user_info" => self.get_user_info(&params).await,
            "upload_file" => self.upload_file(&params).await,
            "status" => self.status_outcome().await,
            _ => Err(AdapterError::UnknownOperation {
                service: "Slack".into(),
                operation: operation.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Turn an `ok: false` Web API payload into an error.
pub fn check_ok(value: Value) -> Result<Value> {
    if value.get("ok").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("unknown_error")
            .to_owned();
        return Err(AdapterError::Api {
            service: "Slack".into(),
            status: 200,
            message,
        });
    }
    Ok(value)
}

/// Whether `s` looks like a conversation ID (`C…`, `G…` or `D…`).
pub fn is_channel_id(s: &str) -> bool {
    s.len() >= 9
        && s.starts_with(['C', 'G', 'D'])
        && s.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Find a channel's ID by name in a `conversations.list` payload.
pub fn find_channel_id(list: &Value, name: &str) -> Option<String> {
    list.get("channels")
        .and_then(Value::as_array)?
        .iter()
        .find(|c| {
            c.get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
        .and_then(|c| c.get("id"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Reduce a channel listing to name, id, privacy and member count.
pub fn shape_channels(list: &Value) -> Vec<Value> {
    list.get("channels")
        .and_then(Value::as_array)
        .map(|channels| {
            channels
                .iter()
                .map(|c| {
                    json!({
                        "name": format!("#{}", c.get("name").and_then(Value::as_str).unwrap_or_default()),
                        "id": c.get("id").and_then(Value::as_str).unwrap_or_default(),
                        "private": c.get("is_private").and_then(Value::as_bool).unwrap_or(false),
                        "members": c.get("num_members").and_then(Value::as_i64).unwrap_or(0),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a `conversations.history` payload.
pub fn shape_messages(history: &Value) -> Vec<Value> {
    history
        .get("messages")
        .and_then(Value::as_array)
        .map(|messages| {
            messages
                .iter()
                .map(|m| {
                    json!({
                        "text": m.get("text").and_then(Value::as_str).unwrap_or_default(),
                        "user": m.get("user").and_then(Value::as_str).unwrap_or_default(),
                        "ts": m.get("ts").and_then(Value::as_str).unwrap_or_default(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Reduce a user object to display name, id, email and title.
pub fn shape_user(user: &Value) -> Value {
    let profile = |key: &str| {
        user.pointer(&format!("/profile/{key}"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned()
    };
    let real_name = profile("real_name");
    let name = if real_name.is_empty() {
        user.get("name").and_then(Value::as_str).unwrap_or_default().to_owned()
    } else {
        real_name
    };
    json!({
        "name": name,
        "id": user.get("id").and_then(Value::as_str).unwrap_or_default(),
        "email": profile("email"),
        "title": profile("title"),
        "is_bot": user.get("is_bot").and_then(Value::as_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use synapse_kernel::StatusState;

    use super::*;

    #[test]
    fn ok_false_becomes_api_error() {
        let err = check_ok(json!({"ok": false, "error": "not_in_channel"})).unwrap_err();
        match err {
            AdapterError::Api { message, .. } => assert_eq!(message, "not_in_channel"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_ok(json!({"ok": true, "ts": "1.2"})).is_ok());
    }

    #[test]
    fn channel_ids_are_recognized() {
        assert!(is_channel_id("C01ABCDEF23"));
        assert!(is_channel_id("G0123456789"));
        assert!(!is_channel_id("general"));
        assert!(!is_channel_id("C01"));
        assert!(!is_channel_id("Cgeneral12"));
    }

    #[test]
    fn channel_lookup_by_name() {
        let list = json!({"ok": true, "channels": [
            {"id": "C111111111", "name": "general", "num_members": 12},
            {"id": "C222222222", "name": "dev-team", "is_private": true}
        ]});
        assert_eq!(find_channel_id(&list, "Dev-Team").as_deref(), Some("C222222222"));
        assert!(find_channel_id(&list, "random").is_none());

        let shaped = shape_channels(&list);
        assert_eq!(shaped[0]["name"], "#general");
        assert_eq!(shaped[0]["members"], 12);
        assert_eq!(shaped[1]["private"], true);
    }

    #[test]
    fn user_prefers_real_name() {
        let user = json!({"id": "U1", "name": "jdoe", "profile": {"real_name": "Jane Doe", "email": "j@x.io"}});
        let shaped = shape_user(&user);
        assert_eq!(shaped["name"], "Jane Doe");
        assert_eq!(shaped["email"], "j@x.io");

        let bare = shape_user(&json!({"id": "U2", "name": "bot"}));
        assert_eq!(bare["name"], "bot");
    }

    #[test]
    fn message_history_shape() {
        let history = json!({"messages": [{"text": "hi", "user": "U1", "ts": "17.1"}]});
        let messages = shape_messages(&history);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["ts"], "17.1");
    }

    #[tokio::test]
    async fn unconfigured_without_token() {
        let connector = SlackConnector::connect(None, Endpoint::new(DEFAULT_API_URL, 5)).await;
        assert!(!connector.is_connected());
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        assert!(report.message.contains("SLACK_TOKEN"));
    }

    #[tokio::test]
    async fn unreachable_api_fails_handshake() {
        let endpoint = Endpoint::new("http://127.0.0.1:9", 2);
        let connector = SlackConnector::connect(Some("xoxb-test".into()), endpoint).await;
        assert!(matches!(connector.state(), ConnectionState::Failed { .. }));
        let report = connector.status().await.unwrap();
        assert_eq!(report.status, StatusState::Disconnected);
    }
}
