//! HTTP template store
//!
//! REST client for the remote template service. Responses may arrive bare or
//! wrapped in `{ "data": ... }`; both are accepted. Requests are never retried.

use async_trait::async_trait;
use reqwest::{header, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::application::dto::{BusinessProfileRecord, TemplateRecord};
use crate::domain::aggregates::Template;
use crate::domain::value_objects::{BusinessId, ReviewUrl, TemplateId};
use crate::ports::outbound::{BusinessProfileSource, StoreError, TemplateStore};

/// Client version reported in the user agent
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    /// No timeout unless set
    pub timeout: Option<Duration>,
}

impl HttpStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
pub struct HttpTemplateStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    base_url: String,
    http: reqwest::Client,
}

impl HttpTemplateStore {
    pub fn new(config: HttpStoreConfig) -> Result<Self, StoreError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| StoreError::Config(format!("invalid base url {:?}: {}", base_url, e)))?;

        let mut headers = header::HeaderMap::new();
        if let Some(token) = config.api_token.as_deref().filter(|t| !t.is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StoreError::Config("api token contains invalid characters".into()))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(format!("review-forms/{}", VERSION));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| StoreError::Config(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            inner: Arc::new(StoreInner { base_url, http }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, StoreError> {
        let bytes = self.send(method, path, body).await?;

        #[derive(Deserialize)]
        struct ApiResponse<T> {
            data: Option<T>,
        }

        // Try the data wrapper first
        if let Ok(resp) = serde_json::from_slice::<ApiResponse<T>>(&bytes) {
            if let Some(data) = resp.data {
                return Ok(data);
            }
        }

        serde_json::from_slice(&bytes).map_err(|e| StoreError::Transport(format!("unexpected response body: {}", e)))
    }

    /// Issue the request; the body of a successful response is returned raw
    async fn send<B: Serialize>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Vec<u8>, StoreError> {
        let url = format!("{}{}", self.inner.base_url, path);
        let mut request = self.inner.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        let message = error_message(&bytes).unwrap_or_else(|| {
            status.canonical_reason().unwrap_or("request failed").to_string()
        });
        if status == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(message));
        }
        Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(e: reqwest::Error) -> StoreError {
    StoreError::Transport(e.to_string())
}

/// Pulls a message out of `{"error":{"message":..}}`, `{"error":".."}` or
/// `{"message":..}`
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = match value.get("error") {
        Some(Value::Object(err)) => err.get("message").and_then(Value::as_str),
        Some(Value::String(err)) => Some(err.as_str()),
        _ => value.get("message").and_then(Value::as_str),
    };
    message.map(str::to_string)
}

#[async_trait]
impl TemplateStore for HttpTemplateStore {
    #[tracing::instrument(skip_all, fields(business_id = %business_id))]
    async fn list(&self, business_id: &BusinessId) -> Result<Vec<Template>, StoreError> {
        let path = format!("/businesses/{}/templates", business_id);
        // Records are parsed one by one so a single bad row cannot hide the rest
        let records: Vec<Value> = self.request(Method::GET, &path, None::<&()>).await?;

        let mut templates = Vec::with_capacity(records.len());
        for record in records {
            let id = record.get("id").cloned();
            match TemplateRecord::decode_value(record) {
                Ok(template) => templates.push(template),
                Err(e) => tracing::error!(template_id = ?id, error = %e, "skipping undecodable template"),
            }
        }
        tracing::debug!(count = templates.len(), "templates listed");
        Ok(templates)
    }

    #[tracing::instrument(skip_all, fields(business_id = %template.business_id()))]
    async fn create(&self, template: &Template) -> Result<Template, StoreError> {
        let record = TemplateRecord::encode(template)?;
        let stored: TemplateRecord = self.request(Method::POST, "/templates", Some(&record)).await?;
        Ok(stored.decode()?)
    }

    #[tracing::instrument(skip_all, fields(template_id = %id))]
    async fn update(&self, id: &TemplateId, template: &Template) -> Result<Template, StoreError> {
        let record = TemplateRecord::encode(template)?;
        let path = format!("/templates/{}", id);
        let stored: TemplateRecord = self.request(Method::PUT, &path, Some(&record)).await?;
        Ok(stored.decode()?)
    }

    #[tracing::instrument(skip_all, fields(template_id = %id))]
    async fn delete(&self, id: &TemplateId) -> Result<(), StoreError> {
        self.send(Method::DELETE, &format!("/templates/{}", id), None::<&()>)
            .await
            .map(|_| ())
    }

    #[tracing::instrument(skip_all, fields(template_id = %id))]
    async fn activate(&self, id: &TemplateId) -> Result<(), StoreError> {
        self.send(Method::PUT, &format!("/templates/{}/activate", id), None::<&()>)
            .await
            .map(|_| ())
    }
}

#[async_trait]
impl BusinessProfileSource for HttpTemplateStore {
    #[tracing::instrument(skip_all, fields(business_id = %business_id))]
    async fn review_url(&self, business_id: &BusinessId) -> Result<Option<ReviewUrl>, StoreError> {
        let path = format!("/businesses/{}/profile", business_id);
        let profile: BusinessProfileRecord = self.request(Method::GET, &path, None::<&()>).await?;
        Ok(profile.review_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_base_url() {
        let result = HttpTemplateStore::new(HttpStoreConfig::new("not a url"));
        assert!(matches!(result, Err(StoreError::Config(_))));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let store = HttpTemplateStore::new(HttpStoreConfig::new("http://localhost:8080/api/")).unwrap();
        assert_eq!(store.base_url(), "http://localhost:8080/api");
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(br#"{"error":{"code":"bad","message":"name taken"}}"#).as_deref(),
            Some("name taken")
        );
        assert_eq!(error_message(br#"{"error":"nope"}"#).as_deref(), Some("nope"));
        assert_eq!(error_message(br#"{"message":"denied"}"#).as_deref(), Some("denied"));
        assert_eq!(error_message(b"<html>"), None);
    }
}
