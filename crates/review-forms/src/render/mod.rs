//! Form rendering
//!
//! Turns a template into HTML. `Edit` mode lays the form out with inert
//! controls for the builder preview; `Fill` mode is the interactive form a
//! customer submits.

use maud::{html, Markup};
use serde_json::Value;

use crate::domain::aggregates::{FieldDefinition, Template};
use crate::domain::services::submission::{visible_fields, Responses, RATING_SCALE};
use crate::domain::value_objects::FieldType;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RenderMode {
    /// Disabled controls, every field shown
    #[default]
    Edit,
    /// Interactive controls, conditional fields applied
    Fill,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Edit => "edit",
            RenderMode::Fill => "fill",
        }
    }
}

pub fn render_form(template: &Template, mode: RenderMode, responses: &Responses) -> Markup {
    let settings = template.settings();
    let fill = mode == RenderMode::Fill;
    let style = format!(
        "--rf-theme-color: {}; font-family: {};",
        settings.css_theme_color(),
        settings.css_font_family()
    );
    let fields: Vec<&FieldDefinition> = if fill {
        visible_fields(template, responses).collect()
    } else {
        template.fields().iter().collect()
    };

    html! {
        form.rf-form
            data-mode=(mode.as_str())
            data-animated[settings.animation]
            data-thank-you=[fill.then(|| settings.thank_you_message())]
            data-redirect=[fill.then(|| template.review_url().map(|u| u.as_str())).flatten()]
            style=(style)
        {
            @if !template.name().is_empty() {
                h2.rf-title { (template.name()) }
            }
            @if !template.description().is_empty() {
                p.rf-description { (template.description()) }
            }
            @for field in fields {
                (render_field(field, mode, responses.get(field.id.as_str())))
            }
            @if fill {
                button.rf-submit type="submit" style=(format!("background-color: {};", settings.css_theme_color())) {
                    "Submit"
                }
            }
        }
    }
}

fn render_field(field: &FieldDefinition, mode: RenderMode, value: Option<&Value>) -> Markup {
    let disabled = mode == RenderMode::Edit;
    html! {
        div class=(field.styling.css_classes())
            data-field-id=(field.id.as_str())
            data-field-type=(field.field_type.as_str())
        {
            label.rf-label for=(field.id.as_str()) {
                (field.label)
                @if field.is_required {
                    span.rf-required { " *" }
                }
            }
            (render_control(field, disabled, value))
        }
    }
}

fn render_control(field: &FieldDefinition, disabled: bool, value: Option<&Value>) -> Markup {
    let name = field.id.as_str();
    let required = !disabled && field.is_required;
    let placeholder = Some(field.placeholder.as_str()).filter(|p| !p.is_empty());
    let rules = &field.validation.rules;

    match field.field_type {
        FieldType::Text | FieldType::Email | FieldType::Phone => {
            let input_type = match field.field_type {
                FieldType::Email => "email",
                FieldType::Phone => "tel",
                _ => "text",
            };
            html! {
                input.rf-input type=(input_type) id=(name) name=(name)
                    placeholder=[placeholder]
                    value=[value.and_then(as_text)]
                    minlength=[rules.min_length]
                    maxlength=[rules.max_length]
                    pattern=[rules.pattern.as_deref()]
                    required[required]
                    disabled[disabled];
            }
        }
        FieldType::Textarea => html! {
            textarea.rf-textarea id=(name) name=(name) rows="4"
                placeholder=[placeholder]
                minlength=[rules.min_length]
                maxlength=[rules.max_length]
                required[required]
                disabled[disabled]
            {
                @if let Some(text) = value.and_then(as_text) { (text) }
            }
        },
        FieldType::Rating => {
            let current = value.and_then(as_rating);
            html! {
                div.rf-rating role="radiogroup" {
                    @for star in 1..=RATING_SCALE {
                        label.rf-star {
                            input type="radio" name=(name) value=(star)
                                checked[current == Some(star)]
                                required[required && star == 1]
                                disabled[disabled];
                            span.rf-star-symbol aria-label=(format!("{} of {}", star, RATING_SCALE)) { "★" }
                        }
                    }
                }
            }
        }
        FieldType::Dropdown => {
            let selected = value.and_then(as_text);
            html! {
                select.rf-select id=(name) name=(name) required[required] disabled[disabled] {
                    option value="" selected[selected.is_none()] {
                        (placeholder.unwrap_or("Select an option"))
                    }
                    @for option in field.options() {
                        option value=(option.value) selected[selected.as_deref() == Some(option.value.as_str())] {
                            (option.label)
                        }
                    }
                }
            }
        }
        FieldType::Checkbox => {
            let checked = value.map(as_list).unwrap_or_default();
            html! {
                div.rf-options {
                    @for option in field.options() {
                        label.rf-option {
                            input type="checkbox" name=(name) value=(option.value)
                                checked[checked.iter().any(|v| v == &option.value)]
                                disabled[disabled];
                            " " (option.label)
                        }
                    }
                }
            }
        }
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_rating(value: &Value) -> Option<u8> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        other => as_text(other).into_iter().collect(),
    }
}
