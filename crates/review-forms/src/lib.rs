//! Review Forms
//!
//! Custom review form templates for businesses collecting customer feedback.
//!
//! ## Architecture
//!
//! - **Domain Layer**: field definitions, the template aggregate, typed
//!   settings/validation/styling/options value objects, domain events
//! - **Application Layer**: the builder state machine (pure transitions) and
//!   the builder service that performs store calls
//! - **Ports Layer**: template store and business profile interfaces
//! - **Infrastructure Layer**: HTTP store client and an in-memory store
//! - **Render**: HTML rendering of a template in edit or fill mode
//!
//! ## Key invariants
//!
//! - `fields[i].order == i` after every structural mutation
//! - dropdown/checkbox fields always carry a non-empty option list with
//!   unique values; other field types never carry options
//! - a template is saved only with a non-blank name and at least one field

pub mod domain;
pub mod application;
pub mod ports;
pub mod infrastructure;
pub mod render;

// Re-exports for convenience
pub use domain::aggregates::{FieldDefinition, FieldPatch, Template, TemplateError};
pub use domain::value_objects::{
    BusinessId, FieldConditional, FieldId, FieldOption, FieldOptions, FieldStyling, FieldType,
    FieldValidation, OptionsError, ReviewUrl, TemplateId, TemplateSettings,
};
pub use domain::events::{DomainEvent, TemplateEvent};
pub use domain::services::submission::{validate_submission, FieldIssue, Responses};
pub use application::builder::{BuilderAction, BuilderMode, BuilderState, DeletePrompt, Notice, NoticeLevel};
pub use application::commands::{BuilderError, BuilderOptions, TemplateBuilder};
pub use application::dto::{FieldRecord, TemplateRecord};
pub use ports::outbound::{BusinessProfileSource, StoreError, TemplateStore};
pub use infrastructure::http::{HttpStoreConfig, HttpTemplateStore};
pub use infrastructure::persistence::InMemoryTemplateStore;
pub use render::{render_form, RenderMode};
