//! The uniform result envelope and status reports.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Maximum number of characters kept from a downstream error detail.
pub const DETAIL_LIMIT: usize = 300;

// ---------------------------------------------------------------------------
// FailureKind
// ---------------------------------------------------------------------------

/// Structured cause of a failed [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureKind {
    /// The service was never registered or is not connected.
    NotConfigured,
    /// No parser rule produced a complete command.
    ParseFailure,
    /// The parser produced an operation the connector does not declare.
    UnknownOperation,
    /// The connector or its downstream service reported an error.
    DownstreamFailure(String),
}

impl FailureKind {
    /// Wrap a downstream error detail, truncated to [`DETAIL_LIMIT`] chars.
    pub fn downstream(detail: impl AsRef<str>) -> Self {
        Self::DownstreamFailure(truncate_detail(detail.as_ref()))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConfigured => f.write_str("Service is not configured."),
            Self::ParseFailure => f.write_str("Could not understand the command."),
            Self::UnknownOperation => f.write_str("Unknown operation."),
            Self::DownstreamFailure(detail) => write!(f, "Service error: {detail}"),
        }
    }
}

/// Truncate `detail` to at most [`DETAIL_LIMIT`] characters on a char
/// boundary, appending an ellipsis when anything was cut.
pub fn truncate_detail(detail: &str) -> String {
    let detail = detail.trim();
    match detail.char_indices().nth(DETAIL_LIMIT) {
        Some((cut, _)) => format!("{}…", &detail[..cut]),
        None => detail.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Uniform output of connectors and of the dispatcher.
///
/// `message` is confirmation text on success and error text on failure.
/// `data` holds operation-specific fields and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, Value>,
}

impl Outcome {
    /// A successful outcome with a confirmation message.
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            data: Map::new(),
        }
    }

    /// A failed outcome.
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            error: Some(kind),
            data: Map::new(),
        }
    }

    pub fn parse_failure(reason: impl Into<String>) -> Self {
        Self::failure(FailureKind::ParseFailure, reason)
    }

    pub fn not_configured(guidance: impl Into<String>) -> Self {
        Self::failure(FailureKind::NotConfigured, guidance)
    }

    pub fn unknown_operation(service: impl fmt::Display, operation: &str) -> Self {
        Self::failure(
            FailureKind::UnknownOperation,
            format!("Unknown {service} operation: {operation}"),
        )
    }

    /// A downstream failure whose message and detail are both the truncated
    /// error text.
    pub fn downstream(detail: impl AsRef<str>) -> Self {
        let kind = FailureKind::downstream(detail);
        let message = match &kind {
            FailureKind::DownstreamFailure(d) => d.clone(),
            other => other.to_string(),
        };
        Self::failure(kind, message)
    }

    /// Attach a data field.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }
}

// ---------------------------------------------------------------------------
// Status reports
// ---------------------------------------------------------------------------

/// Connectivity of one service as seen by a status probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Connected,
    Disconnected,
    Error,
    NotInitialized,
}

impl StatusState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Error => "error",
            Self::NotInitialized => "not_initialized",
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the health report: `{status, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: StatusState,
    pub message: String,
}

impl StatusReport {
    pub fn new(status: StatusState, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn connected(message: impl Into<String>) -> Self {
        Self::new(StatusState::Connected, message)
    }

    pub fn disconnected(message: impl Into<String>) -> Self {
        Self::new(StatusState::Disconnected, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(StatusState::Error, message)
    }

    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(StatusState::NotInitialized, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_outcome_has_no_error() {
        let outcome = Outcome::ok("done").with("repo_url", "https://example.com");
        assert!(outcome.success);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.get("repo_url").unwrap(), "https://example.com");
    }

    #[test]
    fn truncate_keeps_short_detail() {
        assert_eq!(truncate_detail("  boom  "), "boom");
    }

    #[test]
    fn truncate_cuts_on_char_boundary() {
        let long = "é".repeat(DETAIL_LIMIT + 50);
        let cut = truncate_detail(&long);
        assert_eq!(cut.chars().count(), DETAIL_LIMIT + 1);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn downstream_outcome_message_matches_detail() {
        let outcome = Outcome::downstream("HTTP 404: Not Found");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "HTTP 404: Not Found");
        assert_eq!(
            outcome.error,
            Some(FailureKind::DownstreamFailure("HTTP 404: Not Found".into()))
        );
    }

    #[test]
    fn failure_kind_serializes_tagged() {
        let json = serde_json::to_value(FailureKind::downstream("x")).unwrap();
        assert_eq!(json["kind"], "downstream_failure");
        assert_eq!(json["detail"], "x");
        let json = serde_json::to_value(FailureKind::NotConfigured).unwrap();
        assert_eq!(json["kind"], "not_configured");
    }

    #[test]
    fn status_report_serializes_snake_case() {
        let json = serde_json::to_value(StatusReport::not_initialized("Set X")).unwrap();
        assert_eq!(json["status"], "not_initialized");
        assert_eq!(json["message"], "Set X");
    }
}
