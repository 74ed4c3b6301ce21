//! Connection lifecycle.
//!
//! ```text
//! Unconfigured                       (no credentials)
//! Connecting ──handshake ok──> Connected
//!            └─handshake err─> Failed { reason }
//! ```
//!
//! The state is settled once when the connector is built and never changes
//! afterwards.  There is no background reconnect.

use serde::Serialize;
use synapse_kernel::{ServiceId, StatusReport};

/// Per-connector connection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Unconfigured,
    Connecting,
    Connected,
    Failed { reason: String },
}

impl ConnectionState {
    /// Starting state given whether credentials are present.
    pub fn initial(credentials_present: bool) -> Self {
        if credentials_present {
            Self::Connecting
        } else {
            Self::Unconfigured
        }
    }

    /// Settle a `Connecting` state with the handshake result.  Any other
    /// state is returned unchanged.
    #[must_use]
    pub fn complete<E: std::fmt::Display>(self, handshake: Result<(), E>) -> Self {
        match (self, handshake) {
            (Self::Connecting, Ok(())) => Self::Connected,
            (Self::Connecting, Err(e)) => Self::Failed {
                reason: e.to_string(),
            },
            (other, _) => other,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Failed { .. } => "failed",
        }
    }

    /// Status report for any state other than `Connected`, which needs a
    /// live probe.
    pub fn offline_report(&self, service: ServiceId) -> Option<StatusReport> {
        match self {
            Self::Connected => None,
            Self::Unconfigured => Some(StatusReport::not_initialized(format!(
                "{} credentials missing. {}",
                service.display_name(),
                service.credential_hint()
            ))),
            Self::Connecting => Some(StatusReport::disconnected(format!(
                "{} handshake has not completed",
                service.display_name()
            ))),
            Self::Failed { reason } => Some(StatusReport::disconnected(format!(
                "{} connection failed: {reason}",
                service.display_name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use synapse_kernel::StatusState;

    use super::*;

    #[test]
    fn initial_state_follows_credentials() {
        assert_eq!(ConnectionState::initial(false), ConnectionState::Unconfigured);
        assert_eq!(ConnectionState::initial(true), ConnectionState::Connecting);
    }

    #[test]
    fn connecting_settles_on_handshake() {
        let ok = ConnectionState::Connecting.complete::<String>(Ok(()));
        assert!(ok.is_connected());

        let failed = ConnectionState::Connecting.complete(Err("401 Bad credentials"));
        assert_eq!(
            failed,
            ConnectionState::Failed {
                reason: "401 Bad credentials".into()
            }
        );
    }

    #[test]
    fn unconfigured_never_becomes_connected() {
        let state = ConnectionState::Unconfigured.complete::<String>(Ok(()));
        assert_eq!(state, ConnectionState::Unconfigured);
    }

    #[test]
    fn failed_is_terminal() {
        let failed = ConnectionState::Failed {
            reason: "boom".into(),
        };
        assert_eq!(failed.clone().complete::<String>(Ok(())), failed);
    }

    #[test]
    fn offline_reports() {
        let report = ConnectionState::Unconfigured
            .offline_report(ServiceId::Slack)
            .unwrap();
        assert_eq!(report.status, StatusState::NotInitialized);
        assert!(report.message.contains("SLACK_TOKEN"));

        let report = ConnectionState::Failed {
            reason: "timeout".into(),
        }
        .offline_report(ServiceId::Jira)
        .unwrap();
        assert_eq!(report.status, StatusState::Disconnected);
        assert!(report.message.contains("timeout"));

        assert!(ConnectionState::Connected.offline_report(ServiceId::GitHub).is_none());
    }
}
