//! Synapse routing core.
//!
//! Ties the intent parser and the service connectors together:
//!
//! ```text
//! text ─> IntentParser ─> Command ─> Dispatcher ─> Connector ─> Outcome ─> formatter ─> text
//! ```
//!
//! [`CommandRouter`] is the single inbound boundary; [`aggregate_status`]
//! produces the health report off the request path.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formatter;
pub mod registry;
pub mod router;
pub mod status;

pub use config::{AgentConfig, ApiConfig, JiraConfig, ServicesConfig};
pub use dispatcher::Dispatcher;
pub use error::{AgentError, Result};
pub use formatter::format_outcome;
pub use registry::{ConnectorRegistry, Credentials};
pub use router::CommandRouter;
pub use status::{HealthReport, aggregate_status};
