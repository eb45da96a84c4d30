//! Input events submitted to the controller.

use game_context::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One external stimulus: a player or system choice and its parameters.
///
/// Inputs are built fresh for every event and never mutated once submitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Input {
    /// Verb recognized by the receiving node (e.g. `"bounty_action"`).
    pub kind: String,
    pub params: BTreeMap<String, Value>,
}

impl Input {
    /// Create an input with no parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
        }
    }

    /// Shorthand for the common `{kind, action: <verb>}` shape.
    pub fn action(kind: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(kind).with_param("action", action.into())
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn param(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_int(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(Value::as_int)
    }

    pub fn param_float(&self, key: &str) -> Option<f64> {
        self.params.get(key).and_then(Value::as_float)
    }

    pub fn param_bool(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(Value::as_bool)
    }
}
