//! Template Aggregate
//!
//! A business's custom review form: metadata, ordered fields and settings.
//! Field order is derived from position and recomputed after every
//! structural mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::aggregates::field::{FieldDefinition, FieldPatch};
use crate::domain::events::{DomainEvent, TemplateEvent};
use crate::domain::value_objects::{
    BusinessId, FieldId, FieldType, OptionsError, ReviewUrl, ReviewUrlError, TemplateId,
    TemplateSettings,
};

/// Template aggregate root
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "TemplateParts", rename_all = "camelCase")]
pub struct Template {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<TemplateId>,
    business_id: BusinessId,
    name: String,
    description: String,
    settings: TemplateSettings,
    fields: Vec<FieldDefinition>,
    is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    events: Vec<DomainEvent>,
}

/// Raw template contents as read from outside the aggregate (storage record,
/// import file). Converting into a `Template` restores the invariants.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateParts {
    #[serde(default)]
    pub id: Option<TemplateId>,
    pub business_id: BusinessId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: TemplateSettings,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<TemplateParts> for Template {
    fn from(mut parts: TemplateParts) -> Self {
        // Stored order wins over array position when loading, then it is made dense.
        parts.fields.sort_by_key(|f| f.order);
        for field in &mut parts.fields {
            field.normalize_options();
        }
        let mut template = Self {
            id: parts.id,
            business_id: parts.business_id,
            name: parts.name,
            description: parts.description,
            settings: parts.settings,
            fields: parts.fields,
            is_active: parts.is_active,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
            events: vec![],
        };
        template.renumber();
        template
    }
}

impl Template {
    /// Empty, unsaved template
    pub fn new(business_id: BusinessId) -> Self {
        Self {
            id: None,
            business_id,
            name: String::new(),
            description: String::new(),
            settings: TemplateSettings::default(),
            fields: vec![],
            is_active: false,
            created_at: None,
            updated_at: None,
            events: vec![],
        }
    }

    /// Fresh template with the four standard review fields
    pub fn with_default_fields(business_id: BusinessId, review_url: Option<ReviewUrl>) -> Self {
        let mut template = Self::new(business_id);
        template.settings.google_review_url = review_url;
        template.fields = vec![
            FieldDefinition::new(FieldType::Text)
                .labeled("Your Name", "Enter your name")
                .required(true),
            FieldDefinition::new(FieldType::Email)
                .labeled("Email Address", "Enter your email")
                .required(true),
            FieldDefinition::new(FieldType::Rating)
                .labeled("Rate Your Experience", "")
                .required(true),
            FieldDefinition::new(FieldType::Textarea)
                .labeled("Tell us about your experience", "Share your thoughts...")
                .required(true),
        ];
        template.renumber();
        template
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> Option<&TemplateId> { self.id.as_ref() }
    pub fn business_id(&self) -> &BusinessId { &self.business_id }
    pub fn name(&self) -> &str { &self.name }
    pub fn description(&self) -> &str { &self.description }
    pub fn settings(&self) -> &TemplateSettings { &self.settings }
    pub fn fields(&self) -> &[FieldDefinition] { &self.fields }
    pub fn is_active(&self) -> bool { self.is_active }
    pub fn is_persisted(&self) -> bool { self.id.is_some() }
    pub fn created_at(&self) -> Option<DateTime<Utc>> { self.created_at }
    pub fn updated_at(&self) -> Option<DateTime<Utc>> { self.updated_at }
    pub fn review_url(&self) -> Option<&ReviewUrl> { self.settings.google_review_url.as_ref() }

    pub fn field(&self, id: &FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| &f.id == id)
    }

    pub fn position(&self, id: &FieldId) -> Option<usize> {
        self.fields.iter().position(|f| &f.id == id)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_settings(&mut self, settings: TemplateSettings) {
        self.settings = settings;
    }

    /// Parse and set the review redirect; a blank value clears it
    pub fn set_review_url(&mut self, raw: &str) -> Result<(), TemplateError> {
        if raw.trim().is_empty() {
            self.settings.google_review_url = None;
            return Ok(());
        }
        self.settings.google_review_url = Some(ReviewUrl::parse(raw)?);
        Ok(())
    }

    /// Adopt `url` only when this template has none of its own
    pub fn inherit_review_url(&mut self, url: Option<ReviewUrl>) {
        if self.settings.google_review_url.is_none() {
            self.settings.google_review_url = url;
        }
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    // =========================================================================
    // Field operations
    // =========================================================================

    /// Append a field with type defaults; returns its id
    pub fn add_field(&mut self, field_type: FieldType) -> FieldId {
        let field = FieldDefinition::new(field_type);
        let id = field.id.clone();
        self.fields.push(field);
        self.renumber();
        self.raise_event(DomainEvent::Template(TemplateEvent::FieldAdded {
            template_id: self.id.clone(),
            field_id: id.clone(),
            field_type,
        }));
        id
    }

    /// Merge a partial attribute set into a field. A refused patch leaves the
    /// field unchanged.
    pub fn update_field(&mut self, id: &FieldId, patch: FieldPatch) -> Result<&FieldDefinition, TemplateError> {
        let index = self.index_of(id)?;
        let updated = self.fields[index].patched(patch)?;
        self.fields[index] = updated;
        Ok(&self.fields[index])
    }

    pub fn remove_field(&mut self, id: &FieldId) -> Result<FieldDefinition, TemplateError> {
        let index = self.index_of(id)?;
        let removed = self.fields.remove(index);
        self.renumber();
        self.raise_event(DomainEvent::Template(TemplateEvent::FieldRemoved {
            template_id: self.id.clone(),
            field_id: removed.id.clone(),
        }));
        Ok(removed)
    }

    /// Append a copy of the field at the end of the list; returns the copy's id
    pub fn duplicate_field(&mut self, id: &FieldId) -> Result<FieldId, TemplateError> {
        let index = self.index_of(id)?;
        let copy = self.fields[index].duplicate();
        let copy_id = copy.id.clone();
        self.fields.push(copy);
        self.renumber();
        self.raise_event(DomainEvent::Template(TemplateEvent::FieldDuplicated {
            template_id: self.id.clone(),
            source_id: id.clone(),
            copy_id: copy_id.clone(),
        }));
        Ok(copy_id)
    }

    /// Move the field at `from` so it ends up at index `to`
    pub fn move_field(&mut self, from: usize, to: usize) -> Result<(), TemplateError> {
        let len = self.fields.len();
        for index in [from, to] {
            if index >= len {
                return Err(TemplateError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let field = self.fields.remove(from);
        self.fields.insert(to, field);
        self.renumber();
        self.raise_event(DomainEvent::Template(TemplateEvent::FieldsReordered {
            template_id: self.id.clone(),
        }));
        Ok(())
    }

    // =========================================================================
    // Save rules
    // =========================================================================

    /// Local checks run before any store call
    pub fn validate_for_save(&self) -> Result<(), TemplateError> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if self.fields.is_empty() {
            return Err(TemplateError::NoFields);
        }
        Ok(())
    }

    // =========================================================================
    // Domain Events
    // =========================================================================

    /// Get and clear accumulated domain events
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn raise_event(&mut self, event: DomainEvent) {
        self.events.push(event);
    }

    fn index_of(&self, id: &FieldId) -> Result<usize, TemplateError> {
        self.position(id)
            .ok_or_else(|| TemplateError::FieldNotFound(id.clone()))
    }

    fn renumber(&mut self) {
        for (index, field) in self.fields.iter_mut().enumerate() {
            field.order = index as u32;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Please enter a template name")]
    EmptyName,

    #[error("Please add at least one field")]
    NoFields,

    #[error("Field not found: {0}")]
    FieldNotFound(FieldId),

    #[error("Position {index} is out of range for {len} fields")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid options: {0}")]
    Options(#[from] OptionsError),

    #[error("Invalid Google review URL: {0}")]
    InvalidReviewUrl(#[from] ReviewUrlError),
}
