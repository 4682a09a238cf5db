//! Aggregates module

pub mod field;
pub mod template;

pub use field::{FieldDefinition, FieldPatch};
pub use template::{Template, TemplateError, TemplateParts};
