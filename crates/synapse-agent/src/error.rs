//! Agent error types.
//!
//! Only startup can fail: loading configuration and compiling the parser.
//! Per-request failures are reported as [`Outcome`](synapse_kernel::Outcome)
//! values instead.

use std::path::PathBuf;

/// Error type for the routing core.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The configuration file exists but could not be read.
    #[error("failed to read config {}: {reason}", path.display())]
    ConfigRead { path: PathBuf, reason: String },

    /// The configuration file is not valid TOML for [`AgentConfig`](crate::AgentConfig).
    #[error("invalid config {}: {reason}", path.display())]
    ConfigParse { path: PathBuf, reason: String },

    /// The intent parser could not be built.
    #[error(transparent)]
    Intent(#[from] synapse_intent::IntentError),
}

/// Convenience alias used throughout the agent crate.
pub type Result<T> = std::result::Result<T, AgentError>;
