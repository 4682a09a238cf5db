//! Presentational hints for a field

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldStyling {
    /// e.g. "full", "half"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    /// e.g. "sm", "md", "lg"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    /// e.g. "outlined", "filled"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl FieldStyling {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// CSS class list for the rendered field wrapper
    pub fn css_classes(&self) -> String {
        let mut classes = vec!["rf-field".to_string()];
        if let Some(width) = &self.width {
            classes.push(format!("rf-w-{}", width));
        }
        if let Some(size) = &self.size {
            classes.push(format!("rf-size-{}", size));
        }
        if let Some(variant) = &self.variant {
            classes.push(format!("rf-{}", variant));
        }
        classes.join(" ")
    }
}
