//! Field type
//!
//! Closed set of inputs a review form can contain. Every dispatch over it is
//! an exhaustive `match`, so an eighth type shows up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Email,
    Phone,
    Textarea,
    Rating,
    Dropdown,
    Checkbox,
}

impl FieldType {
    pub const ALL: [FieldType; 7] = [
        FieldType::Text,
        FieldType::Email,
        FieldType::Phone,
        FieldType::Textarea,
        FieldType::Rating,
        FieldType::Dropdown,
        FieldType::Checkbox,
    ];

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Textarea => "textarea",
            Self::Rating => "rating",
            Self::Dropdown => "dropdown",
            Self::Checkbox => "checkbox",
        }
    }

    /// Dropdown and checkbox fields must carry options
    pub fn requires_options(&self) -> bool {
        match self {
            Self::Dropdown | Self::Checkbox => true,
            Self::Text | Self::Email | Self::Phone | Self::Textarea | Self::Rating => false,
        }
    }

    /// Label given to a freshly added field of this type
    pub fn default_label(&self) -> &'static str {
        match self {
            Self::Text => "Text Field",
            Self::Email => "Email Address",
            Self::Phone => "Phone Number",
            Self::Textarea => "Your Feedback",
            Self::Rating => "Rating",
            Self::Dropdown => "Select an Option",
            Self::Checkbox => "Select All That Apply",
        }
    }

    /// Placeholder given to a freshly added field of this type
    pub fn default_placeholder(&self) -> &'static str {
        match self {
            Self::Text => "Enter text...",
            Self::Email => "Enter your email...",
            Self::Phone => "Enter your phone number...",
            Self::Textarea => "Share your thoughts...",
            Self::Rating => "",
            Self::Dropdown => "Choose an option...",
            Self::Checkbox => "",
        }
    }

    /// Whether the value collected is free text (length rules apply)
    pub fn is_textual(&self) -> bool {
        match self {
            Self::Text | Self::Email | Self::Phone | Self::Textarea => true,
            Self::Rating | Self::Dropdown | Self::Checkbox => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field type: {0}")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| UnknownFieldType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_choice_types_require_options() {
        let with_options: Vec<_> = FieldType::ALL
            .into_iter()
            .filter(FieldType::requires_options)
            .collect();
        assert_eq!(with_options, vec![FieldType::Dropdown, FieldType::Checkbox]);
    }

    #[test]
    fn test_parse_round_trips_wire_names() {
        for t in FieldType::ALL {
            assert_eq!(t.as_str().parse::<FieldType>().unwrap(), t);
        }
        assert_eq!(" Rating ".parse::<FieldType>().unwrap(), FieldType::Rating);
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(matches!("signature".parse::<FieldType>(), Err(UnknownFieldType(_))));
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&FieldType::Textarea).unwrap(), "\"textarea\"");
    }
}
