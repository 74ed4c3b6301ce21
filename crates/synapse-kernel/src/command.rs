//! Structured commands.
//!
//! A [`Command`] is what the intent parser produces from free-form text and
//! what the dispatcher consumes.  Its constructors enforce that an operation
//! is never present without a service, and that an unresolved command always
//! carries a reason.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::service::ServiceId;

// ---------------------------------------------------------------------------
// Parameter values
// ---------------------------------------------------------------------------

/// A single extracted parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Integer(i64),
    Text(String),
}

impl ParamValue {
    /// Convert to a JSON value for request bodies.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Flag(b) => serde_json::Value::Bool(*b),
            Self::Integer(n) => serde_json::Value::from(*n),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(b) => write!(f, "{b}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

// ---------------------------------------------------------------------------
// Params
// ---------------------------------------------------------------------------

/// Named parameters for an operation.  Absent parameters are simply missing
/// from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, ParamValue>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.0.remove(key)
    }

    /// Text value for `key`.  Integers and flags are not coerced.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ParamValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Integer value for `key`.  Numeric text is accepted.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key)? {
            ParamValue::Integer(n) => Some(*n),
            ParamValue::Text(s) => s.trim().parse().ok(),
            ParamValue::Flag(_) => None,
        }
    }

    /// Boolean value for `key`.  `"true"`/`"false"` text is accepted.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key)? {
            ParamValue::Flag(b) => Some(*b),
            ParamValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            ParamValue::Integer(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// The parser's output and the dispatcher's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<ServiceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    operation: Option<String>,
    params: Params,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Command {
    /// A fully resolved command.
    pub fn new(service: ServiceId, operation: impl Into<String>, params: Params) -> Self {
        Self {
            service: Some(service),
            operation: Some(operation.into()),
            params,
            error: None,
        }
    }

    /// A command that could not be resolved to any operation.
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self {
            service: None,
            operation: None,
            params: Params::new(),
            error: Some(reason.into()),
        }
    }

    pub fn service(&self) -> Option<ServiceId> {
        self.service
    }

    pub fn operation(&self) -> Option<&str> {
        self.operation.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The explanatory reason carried by an unresolved command.
    pub fn failure(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_resolved(&self) -> bool {
        self.operation.is_some()
    }

    /// Split a resolved command into its parts, or return the failure reason.
    pub fn into_parts(self) -> std::result::Result<(ServiceId, String, Params), String> {
        match (self.service, self.operation) {
            (Some(service), Some(operation)) => Ok((service, operation, self.params)),
            _ => Err(self
                .error
                .unwrap_or_else(|| "command has no operation".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_command_exposes_parts() {
        let cmd = Command::new(
            ServiceId::GitHub,
            "create_repo",
            Params::new().with("name", "demo"),
        );
        assert!(cmd.is_resolved());
        assert_eq!(cmd.service(), Some(ServiceId::GitHub));
        assert_eq!(cmd.operation(), Some("create_repo"));
        assert_eq!(cmd.params().get_str("name"), Some("demo"));
        assert!(cmd.failure().is_none());
    }

    #[test]
    fn unresolved_command_has_reason_and_nothing_else() {
        let cmd = Command::unresolved("Could not understand the command.");
        assert!(!cmd.is_resolved());
        assert!(cmd.service().is_none());
        assert!(cmd.operation().is_none());
        assert!(cmd.params().is_empty());
        assert_eq!(
            cmd.into_parts().unwrap_err(),
            "Could not understand the command."
        );
    }

    #[test]
    fn get_int_accepts_numeric_text() {
        let params = Params::new().with("a", 7i64).with("b", "42").with("c", "x");
        assert_eq!(params.get_int("a"), Some(7));
        assert_eq!(params.get_int("b"), Some(42));
        assert_eq!(params.get_int("c"), None);
        assert_eq!(params.get_int("missing"), None);
    }

    #[test]
    fn get_bool_accepts_flag_and_text() {
        let params = Params::new().with("a", true).with("b", "false").with("c", 1i64);
        assert_eq!(params.get_bool("a"), Some(true));
        assert_eq!(params.get_bool("b"), Some(false));
        assert_eq!(params.get_bool("c"), None);
    }

    #[test]
    fn get_str_does_not_coerce() {
        let params = Params::new().with("n", 3i64);
        assert_eq!(params.get_str("n"), None);
    }

    #[test]
    fn serializes_without_unset_fields() {
        let cmd = Command::new(
            ServiceId::GitHub,
            "list_issues",
            Params::new().with("repo", "owner/test").with("state", "open"),
        );
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["service"], "github");
        assert_eq!(json["operation"], "list_issues");
        assert_eq!(json["params"]["repo"], "owner/test");
        assert!(json.get("error").is_none());

        let json = serde_json::to_value(Command::unresolved("nope")).unwrap();
        assert!(json.get("service").is_none());
        assert_eq!(json["error"], "nope");
    }

    #[test]
    fn param_value_to_json() {
        assert_eq!(ParamValue::from(5i64).to_json(), serde_json::json!(5));
        assert_eq!(ParamValue::from(true).to_json(), serde_json::json!(true));
        assert_eq!(ParamValue::from("x").to_json(), serde_json::json!("x"));
    }
}
