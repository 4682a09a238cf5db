//! Choice options for dropdown and checkbox fields

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    #[serde(default = "generate_option_id")]
    pub id: String,
    pub label: String,
    pub value: String,
}

fn generate_option_id() -> String {
    format!("opt-{}", uuid::Uuid::new_v4())
}

impl FieldOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: generate_option_id(),
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Non-empty, ordered option list with unique values
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldOption>", into = "Vec<FieldOption>")]
pub struct FieldOptions(Vec<FieldOption>);

impl FieldOptions {
    pub fn new(options: Vec<FieldOption>) -> Result<Self, OptionsError> {
        if options.is_empty() {
            return Err(OptionsError::Empty);
        }
        let mut seen = HashSet::new();
        for option in &options {
            if !seen.insert(option.value.as_str()) {
                return Err(OptionsError::DuplicateValue(option.value.clone()));
            }
        }
        Ok(Self(options))
    }

    /// The two options a new choice field starts with
    pub fn defaults() -> Self {
        Self(vec![
            FieldOption::new("Option 1", "option1"),
            FieldOption::new("Option 2", "option2"),
        ])
    }

    pub fn as_slice(&self) -> &[FieldOption] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldOption> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_value(&self, value: &str) -> bool {
        self.0.iter().any(|o| o.value == value)
    }

    pub fn into_inner(self) -> Vec<FieldOption> {
        self.0
    }
}

impl TryFrom<Vec<FieldOption>> for FieldOptions {
    type Error = OptionsError;

    fn try_from(options: Vec<FieldOption>) -> Result<Self, Self::Error> {
        Self::new(options)
    }
}

impl From<FieldOptions> for Vec<FieldOption> {
    fn from(options: FieldOptions) -> Self {
        options.0
    }
}

impl<'a> IntoIterator for &'a FieldOptions {
    type Item = &'a FieldOption;
    type IntoIter = std::slice::Iter<'a, FieldOption>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("options list must not be empty")]
    Empty,
    #[error("duplicate option value: {0}")]
    DuplicateValue(String),
    #[error("field type {0} does not take options")]
    NotAllowed(String),
}
