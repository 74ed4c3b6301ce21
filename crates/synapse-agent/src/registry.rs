//! The connector registry: the capability set built once at startup.
//!
//! Only enabled services get a connector.  The dispatcher never asks
//! whether a service is compiled in or configured; it asks the registry,
//! and an absent entry means "not configured".

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use synapse_adapters::{
    Connector, Endpoint, GitHubConnector, JiraConnector, JiraCredentials, NotionConnector,
    SlackConnector, github, notion, slack,
};
use synapse_kernel::ServiceId;
use tracing::{debug, info};

use crate::config::AgentConfig;

/// Service credentials, read from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub github_token: Option<String>,
    pub notion_token: Option<String>,
    pub notion_parent_page: Option<String>,
    pub jira: Option<JiraCredentials>,
    pub slack_token: Option<String>,
}

impl Credentials {
    /// Read every service's credentials from the environment.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            github_token: var("GITHUB_TOKEN"),
            notion_token: var("NOTION_TOKEN"),
            notion_parent_page: var("NOTION_PARENT_PAGE_ID"),
            jira: JiraCredentials::from_env(),
            slack_token: var("SLACK_TOKEN"),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("github_token", &self.github_token.is_some())
            .field("notion_token", &self.notion_token.is_some())
            .field("notion_parent_page", &self.notion_parent_page)
            .field("jira", &self.jira)
            .field("slack_token", &self.slack_token.is_some())
            .finish()
    }
}

/// Connectors keyed by service.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<ServiceId, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `connector` under its own service, replacing any previous
    /// entry.
    pub fn register(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.insert(connector.service(), connector);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, connector: Arc<dyn Connector>) -> Self {
        self.register(connector);
        self
    }

    pub fn get(&self, service: ServiceId) -> Option<&Arc<dyn Connector>> {
        self.connectors.get(&service)
    }

    /// Registered services in stable order.
    pub fn services(&self) -> Vec<ServiceId> {
        let mut services: Vec<_> = self.connectors.keys().copied().collect();
        services.sort();
        services
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// Construct a connector for every enabled service and run their
    /// handshakes concurrently.
    pub async fn connect_all(config: &AgentConfig, credentials: Credentials) -> Self {
        let timeout = config.services.http_timeout_secs;
        let endpoint = |service: ServiceId, default: &str| {
            Endpoint::new(config.api_url(service).unwrap_or(default), timeout)
        };

        let mut pending: Vec<BoxFuture<'static, Arc<dyn Connector>>> = Vec::new();
        for service in ServiceId::ALL {
            if !config.is_enabled(service) {
                debug!(service = %service, "service disabled, no connector built");
                continue;
            }
            let future = match service {
                ServiceId::GitHub => {
                    let token = credentials.github_token.clone();
                    let endpoint = endpoint(service, github::DEFAULT_API_URL);
                    async move {
                        let connector = GitHubConnector::connect(token, endpoint).await;
                        Arc::new(connector) as Arc<dyn Connector>
                    }
                    .boxed()
                }
                ServiceId::Notion => {
                    let token = credentials.notion_token.clone();
                    let parent = credentials.notion_parent_page.clone();
                    let endpoint = endpoint(service, notion::DEFAULT_API_URL);
                    async move {
                        Arc::new(NotionConnector::connect(token, parent, endpoint).await)
                            as Arc<dyn Connector>
                    }
                    .boxed()
                }
                ServiceId::Jira => {
                    let jira = credentials.jira.clone().map(|mut creds| {
                        if let Some(server) = config.jira.server.as_deref() {
                            creds.server = server.to_owned();
                        }
                        creds
                    });
                    async move {
                        Arc::new(JiraConnector::connect(jira, timeout).await) as Arc<dyn Connector>
                    }
                    .boxed()
                }
                ServiceId::Slack => {
                    let token = credentials.slack_token.clone();
                    let endpoint = endpoint(service, slack::DEFAULT_API_URL);
                    async move {
                        let connector = SlackConnector::connect(token, endpoint).await;
                        Arc::new(connector) as Arc<dyn Connector>
                    }
                    .boxed()
                }
            };
            pending.push(future);
        }

        let mut registry = Self::new();
        for connector in join_all(pending).await {
            debug!(
                service = %connector.service(),
                state = connector.state().label(),
                "connector ready"
            );
            registry.register(connector);
        }
        let connected = registry
            .connectors
            .values()
            .filter(|c| c.is_connected())
            .count();
        info!(
            registered = registry.len(),
            connected,
            "connector registry built"
        );
        registry
    }
}

impl fmt::Debug for ConnectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.services()
                    .into_iter()
                    .filter_map(|s| self.get(s).map(|c| (s, c.state().label()))),
            )
            .finish()
    }
}
