//! Health report across all services.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use futures::future::join_all;
use synapse_kernel::{ServiceId, StatusReport};
use tracing::warn;

use crate::registry::ConnectorRegistry;

/// Status of every known service, keyed by service.  Serializes as
/// `{"github": {"status": ..., "message": ...}, ...}`.
pub type HealthReport = BTreeMap<ServiceId, StatusReport>;

/// Probe every registered connector concurrently.
///
/// A probe that errors or panics yields an `error` report for its service
/// only.  Services without a connector report `not_initialized` without
/// any network call.  The result always has one entry per known service.
pub async fn aggregate_status(registry: &ConnectorRegistry) -> HealthReport {
    let probes = ServiceId::ALL.into_iter().map(|service| async move {
        let Some(connector) = registry.get(service) else {
            return (
                service,
                StatusReport::not_initialized(format!(
                    "{} is not enabled.",
                    service.display_name()
                )),
            );
        };
        let report = match AssertUnwindSafe(connector.status()).catch_unwind().await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                warn!(service = %service, error = %e, "status probe failed");
                StatusReport::error(e.to_string())
            }
            Err(_) => {
                warn!(service = %service, "status probe panicked");
                StatusReport::error(format!("{} status probe crashed", service.display_name()))
            }
        };
        (service, report)
    });
    join_all(probes).await.into_iter().collect()
}
