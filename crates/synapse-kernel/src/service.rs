//! Service identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KernelError;

/// One of the external services Synapse can route commands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    GitHub,
    Notion,
    Jira,
    Slack,
}

impl ServiceId {
    /// Every known service, in a stable order.
    pub const ALL: [ServiceId; 4] = [
        ServiceId::GitHub,
        ServiceId::Notion,
        ServiceId::Jira,
        ServiceId::Slack,
    ];

    /// Lowercase wire identifier (`"github"`, `"notion"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Notion => "notion",
            Self::Jira => "jira",
            Self::Slack => "slack",
        }
    }

    /// Human-facing product name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::GitHub => "GitHub",
            Self::Notion => "Notion",
            Self::Jira => "Jira",
            Self::Slack => "Slack",
        }
    }

    /// Environment variables that must be present for this service to
    /// attempt a connection.
    pub fn credential_vars(self) -> &'static [&'static str] {
        match self {
            Self::GitHub => &["GITHUB_TOKEN"],
            Self::Notion => &["NOTION_TOKEN"],
            Self::Jira => &["JIRA_SERVER", "JIRA_EMAIL", "JIRA_TOKEN"],
            Self::Slack => &["SLACK_TOKEN"],
        }
    }

    /// Actionable guidance naming the missing credential(s).
    pub fn credential_hint(self) -> String {
        let vars = self.credential_vars();
        match vars {
            [single] => format!("Set the {single} environment variable."),
            _ => {
                let (last, rest) = vars.split_last().unwrap_or((&"", &[]));
                format!(
                    "Set the {} and {} environment variables.",
                    rest.join(", "),
                    last
                )
            }
        }
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceId {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "notion" => Ok(Self::Notion),
            "jira" => Ok(Self::Jira),
            "slack" => Ok(Self::Slack),
            other => Err(KernelError::UnknownService {
                name: other.to_owned(),
            }),
        }
    }
}
