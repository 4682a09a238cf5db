//! Outbound ports
//!
//! The template store is a remote service; every call persists or returns a
//! whole template, never individual fields.

use async_trait::async_trait;

use crate::application::dto::CodecError;
use crate::domain::aggregates::Template;
use crate::domain::value_objects::{BusinessId, ReviewUrl, TemplateId};

/// Template storage port
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// All templates of a business, in store order
    async fn list(&self, business_id: &BusinessId) -> Result<Vec<Template>, StoreError>;

    /// Persist a new template; returns the canonical stored record
    async fn create(&self, template: &Template) -> Result<Template, StoreError>;

    /// Replace a stored template in full; returns the canonical stored record
    async fn update(&self, id: &TemplateId, template: &Template) -> Result<Template, StoreError>;

    async fn delete(&self, id: &TemplateId) -> Result<(), StoreError>;

    /// Mark the template served on the public review page
    async fn activate(&self, id: &TemplateId) -> Result<(), StoreError>;
}

/// Business profile port
#[async_trait]
pub trait BusinessProfileSource: Send + Sync {
    /// The business-level Google review URL, if one is configured
    async fn review_url(&self, business_id: &BusinessId) -> Result<Option<ReviewUrl>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
