//! Intent parsing for Synapse.
//!
//! [`parser::IntentParser`] turns free-form text into a
//! [`synapse_kernel::Command`] using the rule sets in [`rules`], one per
//! service, evaluated in a configurable family order.

pub mod error;
pub mod parser;
pub mod rules;

pub use error::{IntentError, Result};
pub use parser::{DEFAULT_PRIORITY, IntentParser, UNRESOLVED_MESSAGE};
