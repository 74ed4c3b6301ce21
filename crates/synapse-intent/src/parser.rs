//! Intent parser: free-form text to [`Command`].
//!
//! Rule families are evaluated in a fixed service order (configurable with
//! [`IntentParser::with_priority`]); within a family, rules are evaluated in
//! declaration order.  The first rule that triggers and extracts every
//! mandatory parameter produces the command.

use synapse_kernel::{Command, RuleTable, ServiceId};
use tracing::debug;

use crate::error::Result;
use crate::rules;

/// Family order used when no explicit priority is configured.
pub const DEFAULT_PRIORITY: [ServiceId; 4] = [
    ServiceId::Slack,
    ServiceId::Jira,
    ServiceId::Notion,
    ServiceId::GitHub,
];

/// Reason carried by every command the parser cannot resolve.
pub const UNRESOLVED_MESSAGE: &str = "Could not understand the command.";

/// Deterministic, rule-ordered intent parser.
///
/// Compiling the rule table is the only fallible step; after construction
/// the parser is immutable and `Send + Sync`.
pub struct IntentParser {
    table: RuleTable,
}

impl IntentParser {
    /// Create a parser with [`DEFAULT_PRIORITY`].
    pub fn new() -> Result<Self> {
        Self::with_priority(&DEFAULT_PRIORITY)
    }

    /// Create a parser whose families are evaluated in `priority` order.
    ///
    /// Services missing from `priority` are appended in default order, and
    /// duplicates are ignored, so every family is always present.
    pub fn with_priority(priority: &[ServiceId]) -> Result<Self> {
        let mut order: Vec<ServiceId> = Vec::with_capacity(ServiceId::ALL.len());
        for service in priority.iter().chain(DEFAULT_PRIORITY.iter()) {
            if !order.contains(service) {
                order.push(*service);
            }
        }

        let sets: Vec<_> = order.iter().map(|s| rules::rule_set(*s)).collect();
        let table = RuleTable::compile(&sets)?;
        debug!(order = ?order, rules = table.rule_count(), "intent parser ready");
        Ok(Self { table })
    }

    /// Parse `text` into a [`Command`].
    ///
    /// Never fails: text that no rule resolves yields an unresolved command
    /// carrying [`UNRESOLVED_MESSAGE`].
    pub fn parse(&self, text: &str) -> Command {
        match self.table.resolve(text) {
            Some(m) => Command::new(m.service, m.operation, m.params),
            None => {
                debug!(text = %text.trim(), "no rule matched");
                Command::unresolved(UNRESOLVED_MESSAGE)
            }
        }
    }

    /// The compiled rule table, for inspection.
    pub fn table(&self) -> &RuleTable {
        &self.table
    }
}
