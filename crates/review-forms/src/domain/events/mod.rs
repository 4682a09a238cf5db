//! Domain Events
//!
//! Raised by the template aggregate and the builder service.

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{FieldId, FieldType, TemplateId};

#[derive(Clone, Debug, PartialEq)]
pub enum DomainEvent {
    Template(TemplateEvent),
}

#[derive(Clone, Debug, PartialEq)]
pub enum TemplateEvent {
    FieldAdded {
        template_id: Option<TemplateId>,
        field_id: FieldId,
        field_type: FieldType,
    },

    FieldRemoved {
        template_id: Option<TemplateId>,
        field_id: FieldId,
    },

    FieldDuplicated {
        template_id: Option<TemplateId>,
        source_id: FieldId,
        copy_id: FieldId,
    },

    FieldsReordered {
        template_id: Option<TemplateId>,
    },

    Saved {
        template_id: TemplateId,
        created: bool,
        saved_at: DateTime<Utc>,
    },

    Deleted {
        template_id: TemplateId,
        was_last: bool,
    },

    Activated {
        template_id: TemplateId,
    },
}

impl DomainEvent {
    /// Template this event belongs to; `None` for a template not yet saved
    pub fn template_id(&self) -> Option<&TemplateId> {
        match self {
            DomainEvent::Template(e) => match e {
                TemplateEvent::FieldAdded { template_id, .. }
                | TemplateEvent::FieldRemoved { template_id, .. }
                | TemplateEvent::FieldDuplicated { template_id, .. }
                | TemplateEvent::FieldsReordered { template_id } => template_id.as_ref(),
                TemplateEvent::Saved { template_id, .. }
                | TemplateEvent::Deleted { template_id, .. }
                | TemplateEvent::Activated { template_id } => Some(template_id),
            },
        }
    }

    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::Template(e) => match e {
                TemplateEvent::FieldAdded { .. } => "template.field_added",
                TemplateEvent::FieldRemoved { .. } => "template.field_removed",
                TemplateEvent::FieldDuplicated { .. } => "template.field_duplicated",
                TemplateEvent::FieldsReordered { .. } => "template.fields_reordered",
                TemplateEvent::Saved { .. } => "template.saved",
                TemplateEvent::Deleted { .. } => "template.deleted",
                TemplateEvent::Activated { .. } => "template.activated",
            },
        }
    }
}
