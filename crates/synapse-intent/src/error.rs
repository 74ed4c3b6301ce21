//! Intent parser error types.

/// Error type for the intent parser.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// A rule set failed to compile.
    #[error("rule set error: {0}")]
    Rules(#[from] synapse_kernel::KernelError),
}

/// Convenience alias used throughout the intent crate.
pub type Result<T> = std::result::Result<T, IntentError>;
