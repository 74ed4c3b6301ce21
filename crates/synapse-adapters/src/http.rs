//! Shared HTTP plumbing for connectors.
//!
//! All connectors send JSON requests through [`send_json`], which maps
//! transport failures, non-success statuses, and empty bodies onto
//! [`AdapterError`] or [`Value`] consistently.

use std::time::Duration;

use serde_json::{Value, json};
use synapse_kernel::ServiceId;
use tracing::warn;

use crate::error::{AdapterError, Result};

/// User agent sent with every request.
const USER_AGENT: &str = concat!("Synapse/", env!("CARGO_PKG_VERSION"));

/// Where a connector sends its requests, and how long it waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Endpoint {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout_secs,
        }
    }

    /// Build a full API URL from a path segment.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// An HTTP client honouring this endpoint's timeout.
    pub(crate) fn client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| AdapterError::RequestFailed {
                operation: "build_client".into(),
                reason: e.to_string(),
            })
    }
}

/// Send `request` and parse the JSON response.
///
/// `204 No Content` and empty bodies yield `{}`.  A non-success status is
/// turned into [`AdapterError::Api`] with the most specific message the
/// body offers.
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
    service: ServiceId,
    operation: &str,
    timeout_secs: u64,
) -> Result<Value> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            AdapterError::Timeout {
                seconds: timeout_secs,
                reason: format!("{} request `{operation}` timed out", service.display_name()),
            }
        } else {
            AdapterError::RequestFailed {
                operation: operation.to_owned(),
                reason: e.to_string(),
            }
        }
    })?;

    let status = response.status();

    let rate_remaining = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(remaining) = rate_remaining
        && remaining < 10
    {
        warn!(service = %service, remaining, operation, "API rate limit is low");
    }

    if status == reqwest::StatusCode::NO_CONTENT {
        return Ok(json!({}));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AdapterError::RequestFailed {
            operation: operation.to_owned(),
            reason: format!("failed to read response body: {e}"),
        })?;

    if !status.is_success() {
        return Err(AdapterError::Api {
            service: service.display_name().to_owned(),
            status: status.as_u16(),
            message: error_message(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(&body)?)
}

/// Extract a human-readable error from a response body.
///
/// Understands the error shapes of the supported services: `message`
/// (GitHub, Notion), `error` (Slack), `errorMessages` and `errors` (Jira).
/// Falls back to the raw body.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            "empty response".to_owned()
        } else {
            trimmed.to_owned()
        };
    };

    if let Some(message) = value.get("message").and_then(Value::as_str) {
        return message.to_owned();
    }
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return error.to_owned();
    }
    if let Some(first) = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .and_then(Value::as_str)
    {
        return first.to_owned();
    }
    if let Some(errors) = value.get("errors").and_then(Value::as_object)
        && let Some((field, detail)) = errors.iter().next()
    {
        return format!("{field}: {}", detail.as_str().unwrap_or("invalid"));
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let endpoint = Endpoint::new("https://api.github.com/", 30);
        assert_eq!(endpoint.url("/user"), "https://api.github.com/user");
    }

    #[test]
    fn error_message_github_shape() {
        assert_eq!(error_message(r#"{"message":"Not Found"}"#), "Not Found");
    }

    #[test]
    fn error_message_slack_shape() {
        assert_eq!(
            error_message(r#"{"ok":false,"error":"channel_not_found"}"#),
            "channel_not_found"
        );
    }

    #[test]
    fn error_message_jira_shapes() {
        assert_eq!(
            error_message(r#"{"errorMessages":["Issue does not exist"],"errors":{}}"#),
            "Issue does not exist"
        );
        assert_eq!(
            error_message(r#"{"errorMessages":[],"errors":{"summary":"Field is required"}}"#),
            "summary: Field is required"
        );
    }

    #[test]
    fn error_message_plain_text() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
        assert_eq!(error_message(""), "empty response");
    }

    #[test]
    fn endpoint_builds_a_client() {
        let endpoint = Endpoint::new("https://api.example.com/", 3);
        assert_eq!(endpoint.url("/user"), "https://api.example.com/user");
        assert!(endpoint.client().is_ok());
    }

    #[tokio::test]
    async fn unreachable_host_is_request_failure() {
        let endpoint = Endpoint::new("http://127.0.0.1:9", 2);
        let client = endpoint.client().unwrap();
        let err = send_json(client.get(endpoint.url("/")), ServiceId::GitHub, "ping", 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AdapterError::RequestFailed { .. } | AdapterError::Timeout { .. }
        ));
    }
}
