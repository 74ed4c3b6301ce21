//! Operation tables.
//!
//! Each connector declares a closed, static table of the operations it
//! supports together with the defaults substituted for absent optional
//! parameters.  The dispatcher looks operations up here before invoking the
//! connector.

use synapse_kernel::{ParamValue, Params, ServiceId};

use crate::error::{AdapterError, Result};

/// A documented default for an optional parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    Text(&'static str),
    Integer(i64),
    Flag(bool),
}

impl From<DefaultValue> for ParamValue {
    fn from(value: DefaultValue) -> Self {
        match value {
            DefaultValue::Text(s) => ParamValue::Text(s.to_owned()),
            DefaultValue::Integer(n) => ParamValue::Integer(n),
            DefaultValue::Flag(b) => ParamValue::Flag(b),
        }
    }
}

/// One entry of an [`OperationTable`].
#[derive(Debug)]
pub struct OperationSpec {
    pub name: &'static str,
    pub summary: &'static str,
    pub required: &'static [&'static str],
    pub defaults: &'static [(&'static str, DefaultValue)],
}

impl OperationSpec {
    /// Fill in every documented default that `params` does not already set.
    pub fn apply_defaults(&self, params: &mut Params) {
        for (key, value) in self.defaults {
            if !params.contains(key) {
                params.insert(*key, *value);
            }
        }
    }

    /// The first required parameter missing from `params`, if any.
    pub fn missing_required(&self, params: &Params) -> Option<&'static str> {
        self.required.iter().copied().find(|key| !params.contains(key))
    }
}

/// Closed mapping from operation name to its spec, for one service.
#[derive(Debug)]
pub struct OperationTable {
    service: ServiceId,
    entries: &'static [OperationSpec],
}

impl OperationTable {
    pub const fn new(service: ServiceId, entries: &'static [OperationSpec]) -> Self {
        Self { service, entries }
    }

    pub fn service(&self) -> ServiceId {
        self.service
    }

    pub fn get(&self, name: &str) -> Option<&'static OperationSpec> {
        self.entries.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|spec| spec.name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static OperationSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parameter access for handlers
// ---------------------------------------------------------------------------

/// A parameter rendered as text, if present and non-empty.
pub fn optional_text(params: &Params, key: &str) -> Option<String> {
    params
        .get(key)
        .map(ToString::to_string)
        .filter(|s| !s.trim().is_empty())
}

/// A required parameter rendered as text.
pub fn require_text(params: &Params, operation: &str, key: &str) -> Result<String> {
    optional_text(params, key).ok_or_else(|| AdapterError::missing(operation, key))
}

/// A required integer parameter.  Numeric text is accepted.
pub fn require_int(params: &Params, operation: &str, key: &str) -> Result<i64> {
    match params.get(key) {
        None => Err(AdapterError::missing(operation, key)),
        Some(_) => params.get_int(key).ok_or_else(|| AdapterError::InvalidParams {
            operation: operation.to_owned(),
            reason: format!("`{key}` must be an integer"),
        }),
    }
}
