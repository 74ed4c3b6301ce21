//! The connector contract.
//!
//! Every service connector (GitHub, Notion, Jira, Slack) implements the
//! [`Connector`] trait, giving the dispatcher and status aggregator one
//! uniform view over services that are otherwise unrelated.

use async_trait::async_trait;
use synapse_kernel::{Outcome, Params, ServiceId, StatusReport};

use crate::error::Result;
use crate::operations::OperationTable;
use crate::state::ConnectionState;

/// A connection to one external service.
///
/// The connection state is settled when the connector is built and is only
/// read afterwards, so a connector can be shared across concurrent requests
/// behind an `Arc` without locking.
#[async_trait]
pub trait Connector: Send + Sync {
    /// The service this connector talks to.
    fn service(&self) -> ServiceId;

    /// The connection state settled at startup.
    fn state(&self) -> &ConnectionState;

    /// Whether operations may be executed.
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// The closed catalog of operations this connector accepts.
    fn operations(&self) -> &'static OperationTable;

    /// Probe the service.
    ///
    /// Connectors that are not connected answer from their state alone,
    /// without touching the network.
    async fn status(&self) -> Result<StatusReport>;

    /// Execute `operation` with `params`.
    ///
    /// Callers are expected to have applied the operation's defaults
    /// already.  Unknown operations yield
    /// [`AdapterError::UnknownOperation`](crate::AdapterError::UnknownOperation).
    async fn execute(&self, operation: &str, params: Params) -> Result<Outcome>;
}
