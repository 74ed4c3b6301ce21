//! The inbound boundary: text in, text out.

use std::sync::Arc;

use synapse_intent::IntentParser;
use synapse_kernel::{Command, Outcome};
use tracing::debug;

use crate::config::AgentConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::formatter::format_outcome;
use crate::registry::{ConnectorRegistry, Credentials};
use crate::status::{HealthReport, aggregate_status};

/// Parses, dispatches and formats one request at a time.  Holds no mutable
/// state, so one router can serve concurrent requests.
pub struct CommandRouter {
    parser: IntentParser,
    dispatcher: Dispatcher,
}

impl CommandRouter {
    pub fn new(parser: IntentParser, registry: Arc<ConnectorRegistry>) -> Self {
        Self {
            parser,
            dispatcher: Dispatcher::new(registry),
        }
    }

    /// Build the parser in the configured priority order and connect every
    /// enabled service.
    pub async fn from_config(config: &AgentConfig, credentials: Credentials) -> Result<Self> {
        let parser = IntentParser::with_priority(&config.services.priority)?;
        let registry = ConnectorRegistry::connect_all(config, credentials).await;
        Ok(Self::new(parser, Arc::new(registry)))
    }

    pub fn parse(&self, text: &str) -> Command {
        self.parser.parse(text)
    }

    /// Parse and dispatch `text`.
    pub async fn handle_outcome(&self, text: &str) -> Outcome {
        let command = self.parse(text);
        debug!(
            service = ?command.service(),
            operation = command.operation().unwrap_or("-"),
            "parsed request"
        );
        self.dispatcher.dispatch(command).await
    }

    /// Parse, dispatch and format `text`.
    pub async fn handle(&self, text: &str) -> String {
        format_outcome(&self.handle_outcome(text).await)
    }

    /// The health report for every known service.
    pub async fn health(&self) -> HealthReport {
        aggregate_status(self.dispatcher.registry()).await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }
}

#[cfg(test)]
mod tests {
    use synapse_kernel::FailureKind;

    use super::*;

    #[tokio::test]
    async fn vague_text_is_not_understood() {
        let router = CommandRouter::new(
            IntentParser::new().unwrap(),
            Arc::new(ConnectorRegistry::new()),
        );
        let outcome = router.handle_outcome("please do something vague").await;
        assert_eq!(outcome.error, Some(FailureKind::ParseFailure));
        let text = router.handle("please do something vague").await;
        assert!(text.to_lowercase().contains("could not understand"));
    }

    #[tokio::test]
    async fn disabled_service_is_not_configured() {
        let router = CommandRouter::new(
            IntentParser::new().unwrap(),
            Arc::new(ConnectorRegistry::new()),
        );
        let outcome = router.handle_outcome("list my repositories").await;
        assert_eq!(outcome.error, Some(FailureKind::NotConfigured));
        assert!(outcome.message.contains("not enabled"));
    }
}
