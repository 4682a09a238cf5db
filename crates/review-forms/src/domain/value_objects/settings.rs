//! Form-level settings
//!
//! Theme, redirect target and thank-you copy shown after submission.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

pub const DEFAULT_THEME_COLOR: &str = "#3B82F6";
pub const DEFAULT_FONT_FAMILY: &str = "Inter";
pub const DEFAULT_THANK_YOU_MESSAGE: &str = "Thank you for your feedback!";

// Values end up inside an inline `style` attribute, so nothing that could
// open another declaration or a function call gets through.
const THEME_COLOR_PATTERN: &str = r"^(#[0-9A-Fa-f]{3,8}|[A-Za-z]{3,20})$";
const FONT_FAMILY_PATTERN: &str = r#"^[A-Za-z0-9 ,'"_-]{1,80}$"#;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSettings {
    #[serde(default = "default_theme_color")]
    pub theme_color: String,
    #[serde(default = "default_font_family")]
    pub font_family: String,
    #[serde(default)]
    pub animation: bool,
    /// Where happy customers are sent after submitting; inherited from the
    /// business profile unless overridden per template
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_review_url"
    )]
    pub google_review_url: Option<ReviewUrl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thank_you_message: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_theme_color() -> String {
    DEFAULT_THEME_COLOR.to_string()
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            theme_color: default_theme_color(),
            font_family: default_font_family(),
            animation: false,
            google_review_url: None,
            thank_you_message: None,
            extra: BTreeMap::new(),
        }
    }
}

impl TemplateSettings {
    pub fn thank_you_message(&self) -> &str {
        self.thank_you_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_THANK_YOU_MESSAGE)
    }

    /// Theme colour fit for CSS: a hex colour or a colour keyword, else the default
    pub fn css_theme_color(&self) -> &str {
        css_safe(&self.theme_color, THEME_COLOR_PATTERN, DEFAULT_THEME_COLOR)
    }

    /// Font family fit for CSS, else the default
    pub fn css_font_family(&self) -> &str {
        css_safe(&self.font_family, FONT_FAMILY_PATTERN, DEFAULT_FONT_FAMILY)
    }
}

fn css_safe<'a>(value: &'a str, pattern: &str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    match Regex::new(pattern) {
        Ok(re) if re.is_match(value) => value,
        _ => {
            tracing::warn!(value = %value, "ignoring unsafe style value");
            fallback
        }
    }
}

// Stored settings may carry an empty string or a broken URL; treat both as unset.
fn lenient_review_url<'de, D>(deserializer: D) -> Result<Option<ReviewUrl>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| match ReviewUrl::parse(&s) {
        Ok(url) => Some(url),
        Err(e) => {
            if !s.trim().is_empty() {
                tracing::warn!(url = %s, error = %e, "ignoring stored review url");
            }
            None
        }
    }))
}

/// Absolute http(s) URL customers are redirected to for a public review
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReviewUrl(String);

impl ReviewUrl {
    pub fn parse(value: &str) -> Result<Self, ReviewUrlError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ReviewUrlError::Empty);
        }
        let url = Url::parse(value).map_err(|e| ReviewUrlError::Malformed(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(ReviewUrlError::UnsupportedScheme(other.to_string())),
        }
        if url.host_str().is_none() {
            return Err(ReviewUrlError::Malformed("missing host".into()));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ReviewUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ReviewUrl::parse(&raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ReviewUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReviewUrlError {
    #[error("review URL is empty")]
    Empty,
    #[error("malformed review URL: {0}")]
    Malformed(String),
    #[error("review URL must use http or https, not {0}")]
    UnsupportedScheme(String),
}
