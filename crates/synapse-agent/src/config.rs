//! Deploy-time configuration.
//!
//! Read once at startup from a TOML file (by default
//! `config/default.toml`).  Every field has a default, so a missing file or
//! an empty table yields a working configuration.  Credentials never live
//! here: they come from the environment (see
//! [`Credentials`](crate::Credentials)).

use std::path::Path;

use serde::{Deserialize, Serialize};
use synapse_intent::DEFAULT_PRIORITY;
use synapse_kernel::ServiceId;
use tracing::{debug, info};

use crate::error::{AgentError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub services: ServicesConfig,
    pub github: ApiConfig,
    pub notion: ApiConfig,
    pub slack: ApiConfig,
    pub jira: JiraConfig,
}

/// `[services]`: which connectors exist and how the parser orders them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// The capability set.  Services not listed are never constructed.
    pub enabled: Vec<ServiceId>,
    /// Cross-service family order for the intent parser.
    pub priority: Vec<ServiceId>,
    /// Per-request timeout for connector HTTP calls.
    pub http_timeout_secs: u64,
}

/// `[github]`, `[notion]`, `[slack]`: endpoint override.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub api_url: Option<String>,
}

/// `[jira]`: site override.  Takes precedence over `JIRA_SERVER`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    pub server: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            enabled: ServiceId::ALL.to_vec(),
            priority: DEFAULT_PRIORITY.to_vec(),
            http_timeout_secs: 30,
        }
    }
}

impl AgentConfig {
    /// Load from `path`.  A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| AgentError::ConfigRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| AgentError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        info!(
            path = %path.display(),
            enabled = ?config.services.enabled,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Whether `service` is part of the capability set.
    pub fn is_enabled(&self, service: ServiceId) -> bool {
        self.services.enabled.contains(&service)
    }

    /// Endpoint override for `service`, if configured.
    pub fn api_url(&self, service: ServiceId) -> Option<&str> {
        match service {
            ServiceId::GitHub => self.github.api_url.as_deref(),
            ServiceId::Notion => self.notion.api_url.as_deref(),
            ServiceId::Slack => self.slack.api_url.as_deref(),
            ServiceId::Jira => self.jira.server.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = AgentConfig::default();
        assert_eq!(config.services.enabled.len(), 4);
        assert_eq!(config.services.priority, DEFAULT_PRIORITY.to_vec());
        assert_eq!(config.services.http_timeout_secs, 30);
        assert!(config.api_url(ServiceId::GitHub).is_none());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: AgentConfig = toml::from_str(
            r#"
            [services]
            enabled = ["github", "slack"]

            [jira]
            server = "https://acme.atlassian.net"
            "#,
        )
        .unwrap();
        assert!(config.is_enabled(ServiceId::GitHub));
        assert!(!config.is_enabled(ServiceId::Notion));
        assert_eq!(config.services.http_timeout_secs, 30);
        assert_eq!(config.services.priority, DEFAULT_PRIORITY.to_vec());
        assert_eq!(
            config.api_url(ServiceId::Jira),
            Some("https://acme.atlassian.net")
        );
    }

    #[test]
    fn unknown_service_name_is_rejected() {
        let parsed: std::result::Result<AgentConfig, _> =
            toml::from_str("[services]\nenabled = [\"trello\"]\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = AgentConfig::load(Path::new("/nonexistent/synapse.toml")).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let text = include_str!("../../../config/default.toml");
        let config: AgentConfig = toml::from_str(text).unwrap();
        assert_eq!(config, AgentConfig::default());
    }
}
