//! Submission checks
//!
//! Interprets each field's declarative validation rules against the values a
//! customer entered in fill mode.

use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::aggregates::{FieldDefinition, Template};
use crate::domain::value_objects::validation::{
    RULE_EMAIL, RULE_MAX_LENGTH, RULE_MIN_LENGTH, RULE_PATTERN, RULE_REQUIRED,
};
use crate::domain::value_objects::{FieldId, FieldType};

/// Responses keyed by field id
pub type Responses = HashMap<String, Value>;

pub const RULE_PHONE: &str = "phone";
pub const RULE_RATING: &str = "rating";
pub const RULE_OPTIONS: &str = "options";
pub const RULE_TYPE: &str = "type";

pub const RATING_SCALE: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field_id: FieldId,
    pub rule: &'static str,
    pub message: String,
}

/// Fields currently shown, honouring conditional display
pub fn visible_fields<'a>(
    template: &'a Template,
    responses: &'a Responses,
) -> impl Iterator<Item = &'a FieldDefinition> + 'a {
    template.fields().iter().filter(move |field| {
        field
            .conditional
            .as_ref()
            .map(|c| c.is_satisfied(responses))
            .unwrap_or(true)
    })
}

/// Check every visible field; hidden fields are never required
pub fn validate_submission(template: &Template, responses: &Responses) -> Result<(), Vec<FieldIssue>> {
    let issues: Vec<FieldIssue> = visible_fields(template, responses)
        .filter_map(|field| check_field(field, responses.get(field.id.as_str())))
        .collect();

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_field(field: &FieldDefinition, value: Option<&Value>) -> Option<FieldIssue> {
    let rules = &field.validation.rules;
    let issue = |rule: &'static str, default: String| FieldIssue {
        field_id: field.id.clone(),
        rule,
        message: field
            .validation
            .message_for(rule)
            .map(str::to_string)
            .unwrap_or(default),
    };

    let value = match value {
        Some(v) if !is_blank(v) => v,
        _ => {
            let required = field.is_required || rules.required == Some(true);
            return required.then(|| issue(RULE_REQUIRED, format!("{} is required", field.label)));
        }
    };

    match field.field_type {
        FieldType::Text | FieldType::Email | FieldType::Phone | FieldType::Textarea => {
            let Some(text) = as_text(value) else {
                return Some(issue(RULE_TYPE, format!("{} must be text", field.label)));
            };
            let length = text.chars().count();
            if let Some(min) = rules.min_length {
                if length < min as usize {
                    return Some(issue(
                        RULE_MIN_LENGTH,
                        format!("{} must be at least {} characters", field.label, min),
                    ));
                }
            }
            if let Some(max) = rules.max_length {
                if length > max as usize {
                    return Some(issue(
                        RULE_MAX_LENGTH,
                        format!("{} must be at most {} characters", field.label, max),
                    ));
                }
            }
            let wants_email = field.field_type == FieldType::Email || rules.email == Some(true);
            if wants_email && !is_valid_email(&text) {
                return Some(issue(RULE_EMAIL, "Please enter a valid email address".to_string()));
            }
            if field.field_type == FieldType::Phone && !is_valid_phone(&text) {
                return Some(issue(RULE_PHONE, "Please enter a valid phone number".to_string()));
            }
            if let Some(pattern) = &rules.pattern {
                match Regex::new(pattern) {
                    Ok(re) if !re.is_match(&text) => {
                        return Some(issue(RULE_PATTERN, format!("{} has an invalid format", field.label)));
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(field_id = %field.id, error = %e, "skipping invalid validation pattern");
                    }
                }
            }
            None
        }
        FieldType::Rating => match as_rating(value) {
            Some(stars) if (1..=RATING_SCALE).contains(&stars) => None,
            _ => Some(issue(
                RULE_RATING,
                format!("{} must be between 1 and {}", field.label, RATING_SCALE),
            )),
        },
        FieldType::Dropdown => match value.as_str() {
            Some(choice) if field.options.as_ref().map_or(false, |o| o.contains_value(choice)) => None,
            _ => Some(issue(RULE_OPTIONS, format!("Please choose a valid option for {}", field.label))),
        },
        FieldType::Checkbox => {
            let chosen: Option<Vec<&str>> = match value {
                Value::Array(items) => items.iter().map(Value::as_str).collect(),
                Value::String(s) => Some(vec![s.as_str()]),
                _ => None,
            };
            let valid = chosen.map_or(false, |values| {
                values
                    .iter()
                    .all(|v| field.options.as_ref().map_or(false, |o| o.contains_value(v)))
            });
            (!valid).then(|| issue(RULE_OPTIONS, format!("Please choose valid options for {}", field.label)))
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_rating(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn is_valid_email(email: &str) -> bool {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.contains(char::is_whitespace)
}

fn is_valid_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
    let digits = phone.chars().filter(char::is_ascii_digit).count();
    allowed && (7..=15).contains(&digits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::FieldPatch;
    use crate::domain::value_objects::{
        BusinessId, ConditionalOperator, FieldConditional, FieldValidation, ValidationRules,
    };
    use serde_json::json;

    fn default_template() -> Template {
        let mut t = Template::with_default_fields(BusinessId::new("b"), None);
        t.set_name("Feedback");
        t
    }

    fn ids(t: &Template) -> Vec<String> {
        t.fields().iter().map(|f| f.id.to_string()).collect()
    }

    fn filled(t: &Template) -> Responses {
        let ids = ids(t);
        Responses::from([
            (ids[0].clone(), json!("Ada Lovelace")),
            (ids[1].clone(), json!("ada@example.com")),
            (ids[2].clone(), json!(5)),
            (ids[3].clone(), json!("Lovely service")),
        ])
    }

    #[test]
    fn test_complete_submission_passes() {
        let t = default_template();
        assert_eq!(validate_submission(&t, &filled(&t)), Ok(()));
    }

    #[test]
    fn test_missing_required_fields() {
        let t = default_template();
        let issues = validate_submission(&t, &Responses::new()).unwrap_err();
        assert_eq!(issues.len(), 4);
        assert!(issues.iter().all(|i| i.rule == RULE_REQUIRED));
        assert_eq!(issues[0].message, "Your Name is required");
    }

    #[test]
    fn test_email_and_rating_checked() {
        let t = default_template();
        let ids = ids(&t);
        let mut responses = filled(&t);
        responses.insert(ids[1].clone(), json!("not-an-email"));
        responses.insert(ids[2].clone(), json!("9"));

        let rules: Vec<_> = validate_submission(&t, &responses)
            .unwrap_err()
            .into_iter()
            .map(|i| i.rule)
            .collect();
        assert_eq!(rules, vec![RULE_EMAIL, RULE_RATING]);
    }

    #[test]
    fn test_length_rules_with_custom_message() {
        let mut t = default_template();
        let id = t.fields()[3].id.clone();
        let validation = FieldValidation {
            rules: ValidationRules { min_length: Some(20), ..Default::default() },
            ..Default::default()
        }
        .with_message(RULE_MIN_LENGTH, "Tell us a bit more");
        t.update_field(&id, FieldPatch { validation: Some(validation), ..Default::default() })
            .unwrap();

        let issues = validate_submission(&t, &filled(&t)).unwrap_err();
        assert_eq!(issues[0].message, "Tell us a bit more");
    }

    #[test]
    fn test_choice_fields_must_match_options() {
        let mut t = default_template();
        let dropdown = t.add_field(FieldType::Dropdown);
        let checkbox = t.add_field(FieldType::Checkbox);

        let mut responses = filled(&t);
        responses.insert(dropdown.to_string(), json!("option2"));
        responses.insert(checkbox.to_string(), json!(["option1", "option2"]));
        assert_eq!(validate_submission(&t, &responses), Ok(()));

        responses.insert(checkbox.to_string(), json!(["option3"]));
        let issues = validate_submission(&t, &responses).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field_id, checkbox);
    }

    #[test]
    fn test_hidden_fields_are_skipped() {
        let mut t = default_template();
        let rating_id = t.fields()[2].id.clone();
        let follow_up = t.add_field(FieldType::Textarea);
        t.update_field(
            &follow_up,
            FieldPatch {
                is_required: Some(true),
                conditional: Some(Some(FieldConditional {
                    field_id: rating_id.clone(),
                    operator: ConditionalOperator::Equals,
                    value: json!(1),
                })),
                ..Default::default()
            },
        )
        .unwrap();

        let mut responses = filled(&t);
        assert_eq!(visible_fields(&t, &responses).count(), 4);
        assert_eq!(validate_submission(&t, &responses), Ok(()));

        responses.insert(rating_id.to_string(), json!(1));
        let issues = validate_submission(&t, &responses).unwrap_err();
        assert_eq!(issues[0].field_id, follow_up);
    }

    #[test]
    fn test_phone_format() {
        assert!(is_valid_phone("+1 (555) 123-4567"));
        assert!(!is_valid_phone("call me"));
        assert!(!is_valid_phone("12"));
    }
}
