//! Field validation rules
//!
//! Declarative rules plus per-rule custom messages. The rules are interpreted
//! by `domain::services::submission` when a filled form is checked.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RULE_REQUIRED: &str = "required";
pub const RULE_MIN_LENGTH: &str = "minLength";
pub const RULE_MAX_LENGTH: &str = "maxLength";
pub const RULE_EMAIL: &str = "email";
pub const RULE_PATTERN: &str = "pattern";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Rules this crate does not interpret; kept so they round-trip
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ValidationRules {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ValidationRepr")]
pub struct FieldValidation {
    pub rules: ValidationRules,
    /// Custom error message keyed by rule name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, String>,
}

impl FieldValidation {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.messages.is_empty()
    }

    pub fn message_for(&self, rule: &str) -> Option<&str> {
        self.messages.get(rule).map(String::as_str)
    }

    pub fn with_message(mut self, rule: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(rule.into(), message.into());
        self
    }
}

// Older records store the rules flat, without the `rules`/`messages` split.
#[derive(Deserialize)]
#[serde(untagged)]
enum ValidationRepr {
    Nested {
        rules: ValidationRules,
        #[serde(default)]
        messages: BTreeMap<String, String>,
    },
    Flat(ValidationRules),
}

impl From<ValidationRepr> for FieldValidation {
    fn from(repr: ValidationRepr) -> Self {
        match repr {
            ValidationRepr::Nested { rules, messages } => Self { rules, messages },
            ValidationRepr::Flat(rules) => Self { rules, messages: BTreeMap::new() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_shape() {
        let v: FieldValidation = serde_json::from_value(json!({
            "rules": { "minLength": 2, "maxLength": 50 },
            "messages": { "minLength": "Too short" }
        }))
        .unwrap();
        assert_eq!(v.rules.min_length, Some(2));
        assert_eq!(v.rules.max_length, Some(50));
        assert_eq!(v.message_for(RULE_MIN_LENGTH), Some("Too short"));
    }

    #[test]
    fn test_flat_shape_is_accepted() {
        let v: FieldValidation = serde_json::from_value(json!({ "email": true, "minLength": 5 })).unwrap();
        assert_eq!(v.rules.email, Some(true));
        assert_eq!(v.rules.min_length, Some(5));
        assert!(v.messages.is_empty());
    }

    #[test]
    fn test_unknown_rules_survive() {
        let v: FieldValidation = serde_json::from_value(json!({ "rules": { "minWords": 3 } })).unwrap();
        assert_eq!(v.rules.extra.get("minWords"), Some(&json!(3)));

        let back = serde_json::to_value(&v).unwrap();
        assert_eq!(back, json!({ "rules": { "minWords": 3 } }));
    }

    #[test]
    fn test_empty_object_is_empty_validation() {
        let v: FieldValidation = serde_json::from_value(json!({})).unwrap();
        assert!(v.is_empty());
    }
}
