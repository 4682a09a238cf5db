//! Value Objects module
//!
//! Typed sub-structures of a template. Encoding to text blobs happens only at
//! the storage boundary (`application::dto`).

pub mod field_type;
pub mod validation;
pub mod styling;
pub mod options;
pub mod conditional;
pub mod settings;

pub use field_type::FieldType;
pub use validation::{FieldValidation, ValidationRules};
pub use styling::FieldStyling;
pub use options::{FieldOption, FieldOptions, OptionsError};
pub use conditional::{ConditionalOperator, FieldConditional};
pub use settings::{ReviewUrl, ReviewUrlError, TemplateSettings};

use serde::{Deserialize, Serialize};
use std::fmt;

const LOCAL_ID_PREFIX: &str = "local-";

/// Identifier of a persisted template (server-assigned)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of the business owning a template
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusinessId(String);

impl BusinessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusinessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a field within its template.
///
/// Fields added in the builder get a local id until the store assigns a
/// canonical one on save.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(String);

impl FieldId {
    /// Generate a fresh client-side id
    pub fn generate() -> Self {
        Self(format!("{}{}", LOCAL_ID_PREFIX, uuid::Uuid::new_v4()))
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True while the id has not been assigned by the store
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FieldId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_field_ids_are_local_and_distinct() {
        let a = FieldId::generate();
        let b = FieldId::generate();
        assert!(a.is_local());
        assert_ne!(a, b);
        assert!(!FieldId::from_string("42").is_local());
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = TemplateId::new("tpl_1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tpl_1\"");
    }
}
