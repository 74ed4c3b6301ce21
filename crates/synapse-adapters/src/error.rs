//! Connector error types.
//!
//! Connectors surface every failure through [`AdapterError`].  The dispatcher
//! converts these into a downstream-failure outcome, so the `Display` text
//! is what the user ultimately sees.

/// Error type for Synapse connectors.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The operation is not part of the connector's table.
    #[error("unknown operation `{operation}` for {service}")]
    UnknownOperation { service: String, operation: String },

    /// A required parameter is missing or malformed.
    #[error("invalid parameters for `{operation}`: {reason}")]
    InvalidParams { operation: String, reason: String },

    /// The connector has no HTTP client to send requests with.
    #[error("{service} is not connected")]
    NotConnected { service: String },

    /// The connector requires credentials that were not supplied.
    #[error("authentication required for {service}: set {credential}")]
    AuthRequired { service: String, credential: String },

    /// The HTTP request could not be sent or its body could not be read.
    #[error("request failed for `{operation}`: {reason}")]
    RequestFailed { operation: String, reason: String },

    /// The service answered with a non-success status or an error payload.
    #[error("{service} API returned {status}: {message}")]
    Api {
        service: String,
        status: u16,
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("timeout after {seconds}s: {reason}")]
    Timeout { seconds: u64, reason: String },

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AdapterError {
    /// Shorthand for a missing required parameter.
    pub fn missing(operation: &str, param: &str) -> Self {
        Self::InvalidParams {
            operation: operation.to_owned(),
            reason: format!("missing required parameter `{param}`"),
        }
    }
}

/// Convenience alias used throughout the adapters crate.
pub type Result<T> = std::result::Result<T, AdapterError>;
