//! Per-service rule sets.
//!
//! Each family is plain `static` data.  Rule order within a family is
//! significant: rules that act on a sub-resource (issues, pull requests,
//! messages) come before the family's generic listing rules.

use synapse_kernel::{RuleSetSpec, ServiceId};

/// A `"double"` or `'single'` quoted value.
pub const QUOTED: &str = r#""([^"]+)"|'([^']+)'"#;

/// A quoted value introduced by one of the `|`-separated prefix words.
macro_rules! quoted_after {
    ($prefix:literal) => {
        concat!(r"\b(?:", $prefix, r#")\s*:?\s+(?:"([^"]+)"|'([^']+)')"#)
    };
}

mod github;
mod jira;
mod notion;
mod slack;

pub use github::GITHUB;
pub use jira::JIRA;
pub use notion::NOTION;
pub use slack::SLACK;

/// The rule set for `service`.
pub fn rule_set(service: ServiceId) -> &'static RuleSetSpec {
    match service {
        ServiceId::GitHub => &GITHUB,
        ServiceId::Notion => &NOTION,
        ServiceId::Jira => &JIRA,
        ServiceId::Slack => &SLACK,
    }
}
