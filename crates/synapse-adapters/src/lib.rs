//! Service connectors for Synapse.
//!
//! Every connector implements the [`Connector`] trait: a fixed
//! [`OperationTable`], a [`ConnectionState`] settled once at startup, a
//! `status` probe, and `execute`, which maps an operation name and its
//! parameters onto the service's HTTP API.

pub mod error;
pub mod github;
pub mod http;
pub mod jira;
pub mod notion;
pub mod operations;
pub mod slack;
pub mod state;
pub mod traits;

pub use error::{AdapterError, Result};
pub use github::GitHubConnector;
pub use http::Endpoint;
pub use jira::{JiraConnector, JiraCredentials};
pub use notion::NotionConnector;
pub use operations::{DefaultValue, OperationSpec, OperationTable};
pub use slack::SlackConnector;
pub use state::ConnectionState;
pub use traits::Connector;
