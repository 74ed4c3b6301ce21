//! Kernel error types.

/// Error type for the Synapse kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A regex pattern in a rule set failed to compile.
    #[error("invalid regex pattern `{pattern}` in rule `{rule}`: {reason}")]
    InvalidPattern {
        rule: String,
        pattern: String,
        reason: String,
    },

    /// Building a vocabulary automaton failed.
    #[error("router build error: {reason}")]
    RouterBuildError { reason: String },

    /// A service identifier string did not name a known service.
    #[error("unknown service: {name}")]
    UnknownService { name: String },
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;
