//! Rendering outcomes as user-facing text.
//!
//! Failures render as `❌ <message>`.  Successes start from the outcome's
//! message; a collection field replaces it with a `Found N <kind>` header
//! and at most five item lines, and reference fields (URLs) are appended
//! one per line.  Rendering is total: any outcome produces a non-empty
//! string.

use serde_json::{Map, Value};
use synapse_kernel::Outcome;

/// Collection fields, in the order the formatter looks for them.  Only the
/// first one present is rendered.
pub const COLLECTION_FIELDS: &[&str] = &[
    "repositories",
    "pull_requests",
    "issues",
    "commits",
    "pages",
    "results",
    "projects",
    "channels",
    "messages",
    "users",
    "blocks",
];

/// Single-entity reference fields and their labels.
pub const REFERENCE_FIELDS: &[(&str, &str)] = &[
    ("repo_url", "📁 Repo"),
    ("pr_url", "🔗 PR"),
    ("issue_url", "🔗 Issue"),
    ("commit_url", "📝 Commit"),
    ("fork_url", "🍴 Fork"),
    ("page_url", "📄 Page"),
    ("database_url", "🗃️ Database"),
    ("file_url", "📎 File"),
    ("permalink", "🔗 Link"),
];

/// Maximum number of items rendered from a collection.
pub const MAX_ITEMS: usize = 5;

/// Fields tried, in order, for an item's label.
const LABEL_FIELDS: &[&str] = &["name", "key", "title", "full_name", "sha", "text", "id"];

/// Render `outcome` for the user.
pub fn format_outcome(outcome: &Outcome) -> String {
    if !outcome.success {
        let message = outcome.message.trim();
        return match (&outcome.error, message.is_empty()) {
            (_, false) => format!("❌ {message}"),
            (Some(kind), true) => format!("❌ {kind}"),
            (None, true) => "❌ The operation failed.".to_owned(),
        };
    }

    let mut lines = Vec::new();
    match first_collection(&outcome.data) {
        Some((field, items)) => lines.extend(render_collection(field, items)),
        None => {
            let message = outcome.message.trim();
            lines.push(if message.is_empty() {
                "✅ Done.".to_owned()
            } else {
                message.to_owned()
            });
        }
    }

    for (field, label) in REFERENCE_FIELDS {
        if let Some(url) = outcome.data.get(*field).and_then(Value::as_str)
            && !url.is_empty()
        {
            lines.push(format!("{label}: {url}"));
        }
    }

    lines.join("\n")
}

fn first_collection(data: &Map<String, Value>) -> Option<(&'static str, &[Value])> {
    COLLECTION_FIELDS.iter().find_map(|field| {
        data.get(*field)
            .and_then(Value::as_array)
            .map(|items| (*field, items.as_slice()))
    })
}

fn render_collection(field: &str, items: &[Value]) -> Vec<String> {
    let kind = field.replace('_', " ");
    if items.is_empty() {
        return vec![format!("📋 Found 0 {kind}.")];
    }
    let mut lines = vec![format!("📋 Found {} {kind}:", items.len())];
    lines.extend(
        items
            .iter()
            .take(MAX_ITEMS)
            .map(|item| format!("  • {}", render_item(item))),
    );
    lines
}

/// One line for one collection item: `label - metric`.
pub fn render_item(item: &Value) -> String {
    let Some(fields) = item.as_object() else {
        return scalar_text(item).unwrap_or_else(|| "(item)".to_owned());
    };

    let label = LABEL_FIELDS
        .iter()
        .find_map(|key| fields.get(*key).and_then(scalar_text))
        .unwrap_or_else(|| "(untitled)".to_owned());
    let label = match fields.get("number").and_then(Value::as_i64) {
        Some(number) => format!("#{number}: {label}"),
        None => label,
    };

    match metric(fields) {
        Some(metric) => format!("{label} - {metric}"),
        None => label,
    }
}

/// A short metric for an item, when one is available.
fn metric(fields: &Map<String, Value>) -> Option<String> {
    if let Some(stars) = fields.get("stars").and_then(Value::as_i64) {
        return Some(format!("⭐ {stars}"));
    }
    if let Some(members) = fields.get("members").and_then(Value::as_i64) {
        return Some(format!("👥 {members}"));
    }
    ["state", "status", "created"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}
