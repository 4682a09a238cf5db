//! Conditional display of a field based on another field's response

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::FieldId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConditional {
    pub field_id: FieldId,
    pub operator: ConditionalOperator,
    #[serde(default)]
    pub value: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionalOperator {
    Equals,
    NotEquals,
    Contains,
    IsEmpty,
    IsNotEmpty,
}

impl FieldConditional {
    /// Whether the dependent field is visible given the current responses
    pub fn is_satisfied(&self, responses: &HashMap<String, Value>) -> bool {
        let actual = responses.get(self.field_id.as_str()).unwrap_or(&Value::Null);
        match self.operator {
            ConditionalOperator::Equals => loosely_equal(actual, &self.value),
            ConditionalOperator::NotEquals => !loosely_equal(actual, &self.value),
            ConditionalOperator::Contains => contains(actual, &self.value),
            ConditionalOperator::IsEmpty => is_empty(actual),
            ConditionalOperator::IsNotEmpty => !is_empty(actual),
        }
    }
}

// Ratings arrive as numbers or numeric strings depending on the client.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::Number(n)) | (Value::Number(n), Value::String(s)) => {
            s.trim() == n.to_string()
        }
        _ => a == b,
    }
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| loosely_equal(item, needle)),
        Value::String(s) => needle.as_str().map(|n| s.contains(n)).unwrap_or(false),
        _ => false,
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
