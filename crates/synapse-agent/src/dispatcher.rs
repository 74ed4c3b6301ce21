//! Command dispatch.
//!
//! [`Dispatcher::dispatch`] turns a [`Command`] into an [`Outcome`] and never
//! fails: every problem found on the way is reported as a failure kind.
//!
//! 1. unresolved command → `ParseFailure`
//! 2. no connector registered → `NotConfigured`
//! 3. connector not connected → `NotConfigured`, with credential guidance
//! 4. operation not in the table → `UnknownOperation`
//! 5. defaults applied, connector invoked; an error or a panic →
//!    `DownstreamFailure`
//! 6. the connector's outcome is returned unchanged

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use synapse_adapters::ConnectionState;
use synapse_kernel::{Command, Outcome, ServiceId};
use tracing::{info, warn};

use crate::registry::ConnectorRegistry;

/// Routes commands to registered connectors.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ConnectorRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ConnectorRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    /// Dispatch `command`.
    pub async fn dispatch(&self, command: Command) -> Outcome {
        let (service, operation, mut params) = match command.into_parts() {
            Ok(parts) => parts,
            Err(reason) => {
                warn!(reason = %reason, "dispatch skipped: unresolved command");
                return Outcome::parse_failure(reason);
            }
        };

        let Some(connector) = self.registry.get(service) else {
            warn!(service = %service, operation, "dispatch skipped: no connector registered");
            return Outcome::not_configured(format!(
                "{} is not enabled. Add \"{service}\" to [services] enabled in the configuration.",
                service.display_name()
            ));
        };

        if !connector.is_connected() {
            warn!(
                service = %service,
                operation,
                state = connector.state().label(),
                "dispatch skipped: connector not connected"
            );
            return Outcome::not_configured(not_connected_guidance(service, connector.state()));
        }

        let Some(spec) = connector.operations().get(&operation) else {
            warn!(service = %service, operation, "dispatch skipped: unknown operation");
            return Outcome::unknown_operation(service.display_name(), &operation);
        };
        spec.apply_defaults(&mut params);

        let started = Instant::now();
        let result = AssertUnwindSafe(connector.execute(&operation, params))
            .catch_unwind()
            .await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(Ok(outcome)) => {
                info!(
                    service = %service,
                    operation,
                    elapsed_ms,
                    success = outcome.success,
                    "dispatched"
                );
                outcome
            }
            Ok(Err(e)) => {
                warn!(service = %service, operation, elapsed_ms, error = %e, "connector failed");
                Outcome::downstream(e.to_string())
            }
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                warn!(
                    service = %service,
                    operation,
                    elapsed_ms,
                    panic = %detail,
                    "connector panicked"
                );
                let name = service.display_name();
                Outcome::downstream(format!("{name} connector crashed: {detail}"))
            }
        }
    }
}

/// Guidance for a connector that is registered but not connected.
fn not_connected_guidance(service: ServiceId, state: &ConnectionState) -> String {
    let name = service.display_name();
    match state {
        ConnectionState::Failed { reason } => format!(
            "{name} is not connected: {reason}. Check the {} environment variable(s).",
            service.credential_vars().join(", ")
        ),
        _ => format!("{name} is not connected. {}", service.credential_hint()),
    }
}

fn panic_detail(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guidance_names_the_credential() {
        assert_eq!(
            not_connected_guidance(ServiceId::GitHub, &ConnectionState::Unconfigured),
            "GitHub is not connected. Set the GITHUB_TOKEN environment variable."
        );
        let failed = ConnectionState::Failed {
            reason: "401 Bad credentials".into(),
        };
        let guidance = not_connected_guidance(ServiceId::Slack, &failed);
        assert!(guidance.contains("401 Bad credentials"));
        assert!(guidance.contains("SLACK_TOKEN"));
    }

    #[test]
    fn panic_payloads_are_rendered() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_detail(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_detail(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_detail(payload.as_ref()), "unknown panic");
    }

    #[tokio::test]
    async fn unresolved_command_is_parse_failure() {
        let dispatcher = Dispatcher::new(Arc::new(ConnectorRegistry::new()));
        let outcome = dispatcher
            .dispatch(Command::unresolved("Could not understand the command."))
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.error, Some(synapse_kernel::FailureKind::ParseFailure));
    }
}
