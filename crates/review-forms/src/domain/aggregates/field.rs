//! Field Definition
//!
//! One input of a review form. Owned exclusively by its template.

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{
    FieldConditional, FieldId, FieldOption, FieldOptions, FieldStyling, FieldType,
    FieldValidation, OptionsError,
};

pub const COPY_SUFFIX: &str = " (Copy)";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Generated when absent, so hand-written import files may leave it out
    #[serde(default = "FieldId::generate")]
    pub id: FieldId,
    pub field_type: FieldType,
    pub label: String,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub is_required: bool,
    /// Position in the template; recomputed by the template after every
    /// structural change
    #[serde(default)]
    pub order: u32,
    #[serde(default, skip_serializing_if = "FieldValidation::is_empty")]
    pub validation: FieldValidation,
    #[serde(default, skip_serializing_if = "FieldStyling::is_empty")]
    pub styling: FieldStyling,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<FieldOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<FieldConditional>,
}

impl FieldDefinition {
    /// New field with type-appropriate defaults
    pub fn new(field_type: FieldType) -> Self {
        Self {
            id: FieldId::generate(),
            field_type,
            label: field_type.default_label().to_string(),
            placeholder: field_type.default_placeholder().to_string(),
            is_required: false,
            order: 0,
            validation: FieldValidation::default(),
            styling: FieldStyling::default(),
            options: field_type.requires_options().then(FieldOptions::defaults),
            conditional: None,
        }
    }

    pub fn labeled(mut self, label: impl Into<String>, placeholder: impl Into<String>) -> Self {
        self.label = label.into();
        self.placeholder = placeholder.into();
        self
    }

    pub fn required(mut self, is_required: bool) -> Self {
        self.is_required = is_required;
        self
    }

    /// Copy with a fresh id and " (Copy)" appended to the label
    pub fn duplicate(&self) -> Self {
        Self {
            id: FieldId::generate(),
            label: format!("{}{}", self.label, COPY_SUFFIX),
            ..self.clone()
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        self.options.as_ref().map(FieldOptions::as_slice).unwrap_or(&[])
    }

    /// Field with the patch merged in. The receiver is left untouched, so a
    /// refused patch changes nothing.
    pub fn patched(&self, patch: FieldPatch) -> Result<Self, OptionsError> {
        let field_type = patch.field_type.unwrap_or(self.field_type);

        let options = match patch.options {
            Some(_) if !field_type.requires_options() => {
                return Err(OptionsError::NotAllowed(field_type.to_string()));
            }
            Some(list) => Some(FieldOptions::new(list)?),
            None if field_type.requires_options() => {
                Some(self.options.clone().unwrap_or_else(FieldOptions::defaults))
            }
            None => None,
        };

        Ok(Self {
            id: self.id.clone(),
            field_type,
            label: patch.label.unwrap_or_else(|| self.label.clone()),
            placeholder: patch.placeholder.unwrap_or_else(|| self.placeholder.clone()),
            is_required: patch.is_required.unwrap_or(self.is_required),
            order: self.order,
            validation: patch.validation.unwrap_or_else(|| self.validation.clone()),
            styling: patch.styling.unwrap_or_else(|| self.styling.clone()),
            options,
            conditional: patch.conditional.unwrap_or_else(|| self.conditional.clone()),
        })
    }

    /// Bring the options in line with the field type after loading from an
    /// external source. Returns true when something had to change.
    pub(crate) fn normalize_options(&mut self) -> bool {
        match (self.field_type.requires_options(), &self.options) {
            (true, None) => {
                tracing::warn!(field_id = %self.id, "choice field without options, seeding defaults");
                self.options = Some(FieldOptions::defaults());
                true
            }
            (false, Some(_)) => {
                tracing::warn!(field_id = %self.id, field_type = %self.field_type, "dropping options from non-choice field");
                self.options = None;
                true
            }
            _ => false,
        }
    }
}

/// Partial attribute set merged into a field by `Template::update_field`.
///
/// `conditional: Some(None)` clears an existing condition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldPatch {
    pub field_type: Option<FieldType>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub is_required: Option<bool>,
    pub validation: Option<FieldValidation>,
    pub styling: Option<FieldStyling>,
    pub options: Option<Vec<FieldOption>>,
    pub conditional: Option<Option<FieldConditional>>,
}

impl FieldPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn field_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    pub fn required(is_required: bool) -> Self {
        Self {
            is_required: Some(is_required),
            ..Default::default()
        }
    }

    pub fn options(options: Vec<FieldOption>) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
