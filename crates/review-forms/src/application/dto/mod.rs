//! Data Transfer Objects (DTOs)
//!
//! Flat storage records. Every sub-object (`settings`, `validation`,
//! `styling`, `conditional`, `options`) travels as an independently
//! JSON-encoded string; on the way back in, each blob may be an encoded
//! string or a native JSON value.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use crate::domain::aggregates::{FieldDefinition, Template, TemplateParts};
use crate::domain::value_objects::{
    BusinessId, ConditionalOperator, FieldConditional, FieldId, FieldOption, FieldOptions, FieldStyling, FieldType,
    FieldValidation, ReviewUrl, TemplateId, TemplateSettings,
};

// =============================================================================
// Records
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_id")]
    pub business_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub settings: Option<Value>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub fields: Vec<FieldRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_id")]
    pub id: Option<String>,
    pub field_type: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub validation: Option<Value>,
    #[serde(default)]
    pub styling: Option<Value>,
    #[serde(default)]
    pub conditional: Option<Value>,
    #[serde(default)]
    pub options: Option<Value>,
}

/// Stored shape of a conditional. A target without a canonical id yet is
/// referenced by its `order` and resolved once the store has assigned ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConditionalRecord {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_id")]
    field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field_order: Option<u32>,
    operator: ConditionalOperator,
    #[serde(default)]
    value: Value,
}

/// Subset of the business profile the builder needs
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfileRecord {
    #[serde(default)]
    pub google_review_url: Option<String>,
}

impl BusinessProfileRecord {
    /// The profile's review URL, if it is set and well-formed
    pub fn review_url(&self) -> Option<ReviewUrl> {
        let raw = self.google_review_url.as_deref()?;
        match ReviewUrl::parse(raw) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(url = %raw, error = %e, "business profile has unusable review url");
                None
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid {what} blob: {source}")]
    Blob {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid template record: {0}")]
    Record(#[source] serde_json::Error),

    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

// =============================================================================
// Encoding
// =============================================================================

impl TemplateRecord {
    /// Flatten a template for the store. Local field ids are left out so the
    /// store assigns canonical ones.
    pub fn encode(template: &Template) -> Result<Self, CodecError> {
        let local_orders: HashMap<&FieldId, u32> = template
            .fields()
            .iter()
            .filter(|f| f.id.is_local())
            .map(|f| (&f.id, f.order))
            .collect();
        let fields = template
            .fields()
            .iter()
            .map(|f| FieldRecord::encode(f, &local_orders))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: template.id().map(|id| id.to_string()),
            business_id: template.business_id().to_string(),
            name: template.name().trim().to_string(),
            description: Some(template.description().to_string()),
            settings: Some(encode_blob(template.settings())?),
            is_active: template.is_active(),
            fields,
            created_at: template.created_at(),
            updated_at: template.updated_at(),
        })
    }

    /// Decode a raw record as the store returned it
    pub fn decode_value(value: Value) -> Result<Template, CodecError> {
        serde_json::from_value::<Self>(value).map_err(CodecError::Record)?.decode()
    }

    /// Rebuild the aggregate. Fields of an unknown type are skipped.
    pub fn decode(self) -> Result<Template, CodecError> {
        let settings: TemplateSettings = decode_blob(self.settings, "settings")?.unwrap_or_default();

        let mut fields = Vec::with_capacity(self.fields.len());
        let mut conditionals = Vec::with_capacity(self.fields.len());
        let mut by_order: HashMap<u32, FieldId> = HashMap::new();
        for record in self.fields {
            let order = record.order;
            if let Some((field, conditional)) = record.decode()? {
                by_order.entry(order).or_insert_with(|| field.id.clone());
                fields.push(field);
                conditionals.push(conditional);
            }
        }
        for (field, conditional) in fields.iter_mut().zip(conditionals) {
            field.conditional = conditional.and_then(|c| c.resolve(&field.id, &by_order));
        }

        Ok(Template::from(TemplateParts {
            id: self.id.map(TemplateId::new),
            business_id: BusinessId::new(self.business_id),
            name: self.name,
            description: self.description.unwrap_or_default(),
            settings,
            fields,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

impl FieldRecord {
    /// `local_orders` maps fields still carrying a local id to their order
    pub fn encode(field: &FieldDefinition, local_orders: &HashMap<&FieldId, u32>) -> Result<Self, CodecError> {
        Ok(Self {
            id: (!field.id.is_local()).then(|| field.id.to_string()),
            field_type: field.field_type.as_str().to_string(),
            label: field.label.clone(),
            placeholder: Some(field.placeholder.clone()),
            is_required: field.is_required,
            order: field.order,
            validation: Some(encode_blob(&field.validation)?),
            styling: Some(encode_blob(&field.styling)?),
            conditional: field
                .conditional
                .as_ref()
                .map(|c| encode_blob(&ConditionalRecord::encode(c, local_orders)))
                .transpose()?,
            options: field.options.as_ref().map(encode_blob).transpose()?,
        })
    }

    /// `Ok(None)` when the field type is not one this crate renders. The
    /// conditional comes back unresolved; the template decode resolves it.
    fn decode(self) -> Result<Option<(FieldDefinition, Option<ConditionalRecord>)>, CodecError> {
        let field_type: FieldType = match self.field_type.parse() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(field_id = ?self.id, error = %e, "skipping stored field");
                return Ok(None);
            }
        };

        let options = decode_blob::<Vec<FieldOption>>(self.options, "options")?
            .and_then(dedupe_options);

        let mut field = FieldDefinition {
            id: self.id.map(FieldId::from_string).unwrap_or_else(FieldId::generate),
            field_type,
            label: self.label,
            placeholder: self.placeholder.unwrap_or_default(),
            is_required: self.is_required,
            order: self.order,
            validation: decode_blob::<FieldValidation>(self.validation, "validation")?.unwrap_or_default(),
            styling: decode_blob::<FieldStyling>(self.styling, "styling")?.unwrap_or_default(),
            options,
            conditional: None,
        };
        field.normalize_options();
        let conditional = decode_blob::<ConditionalRecord>(self.conditional, "conditional")?;
        Ok(Some((field, conditional)))
    }
}

impl ConditionalRecord {
    fn encode(conditional: &FieldConditional, local_orders: &HashMap<&FieldId, u32>) -> Self {
        let field_order = local_orders.get(&conditional.field_id).copied();
        Self {
            field_id: field_order.is_none().then(|| conditional.field_id.to_string()),
            field_order,
            operator: conditional.operator,
            value: conditional.value.clone(),
        }
    }

    fn resolve(self, owner: &FieldId, by_order: &HashMap<u32, FieldId>) -> Option<FieldConditional> {
        let field_id = match (self.field_id, self.field_order) {
            (Some(id), _) => FieldId::from_string(id),
            (None, Some(order)) => match by_order.get(&order) {
                Some(id) => id.clone(),
                None => {
                    tracing::warn!(field_id = %owner, order, "dropping conditional on a missing field");
                    return None;
                }
            },
            (None, None) => {
                tracing::warn!(field_id = %owner, "dropping conditional without a target");
                return None;
            }
        };
        Some(FieldConditional { field_id, operator: self.operator, value: self.value })
    }
}

fn dedupe_options(options: Vec<FieldOption>) -> Option<FieldOptions> {
    let mut seen = HashSet::new();
    let unique: Vec<FieldOption> = options
        .into_iter()
        .filter(|o| seen.insert(o.value.clone()))
        .collect();
    FieldOptions::new(unique).ok()
}

// =============================================================================
// Blob helpers
// =============================================================================

fn encode_blob<T: Serialize>(value: &T) -> Result<Value, CodecError> {
    Ok(Value::String(serde_json::to_string(value)?))
}

/// Accepts an encoded string, a native value, null or nothing
fn decode_blob<T: DeserializeOwned>(blob: Option<Value>, what: &'static str) -> Result<Option<T>, CodecError> {
    let native = match blob {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => {
            serde_json::from_str::<Value>(&s).map_err(|source| CodecError::Blob { what, source })?
        }
        Some(other) => other,
    };
    if native.is_null() {
        return Ok(None);
    }
    serde_json::from_value(native)
        .map(Some)
        .map_err(|source| CodecError::Blob { what, source })
}

// ORM-backed stores hand out integer keys; everything here treats ids as strings.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}

fn lenient_opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!("expected string or number id, got {}", other))),
    }
}
