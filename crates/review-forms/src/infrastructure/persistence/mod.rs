//! In-memory template store
//!
//! Keeps encoded `TemplateRecord`s, so everything read back has been through
//! the same codec as the HTTP store. Used by tests and offline previews.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::application::dto::TemplateRecord;
use crate::domain::aggregates::Template;
use crate::domain::value_objects::{BusinessId, ReviewUrl, TemplateId};
use crate::ports::outbound::{BusinessProfileSource, StoreError, TemplateStore};

#[derive(Default)]
pub struct InMemoryTemplateStore {
    records: RwLock<Vec<TemplateRecord>>,
    review_urls: RwLock<HashMap<String, ReviewUrl>>,
    next_id: AtomicU64,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the business profile's review URL
    pub fn with_review_url(self, business_id: &BusinessId, url: ReviewUrl) -> Self {
        self.review_urls.write().insert(business_id.to_string(), url);
        self
    }

    /// Raw stored records, as the store would hand them out
    pub fn records(&self) -> Vec<TemplateRecord> {
        self.records.read().clone()
    }

    fn next(&self, prefix: &str) -> String {
        format!("{}_{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn assign_field_ids(&self, record: &mut TemplateRecord) {
        for field in &mut record.fields {
            if field.id.is_none() {
                field.id = Some(self.next("fld"));
            }
        }
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn list(&self, business_id: &BusinessId) -> Result<Vec<Template>, StoreError> {
        let records: Vec<TemplateRecord> = self
            .records
            .read()
            .iter()
            .filter(|r| r.business_id == business_id.as_str())
            .cloned()
            .collect();

        let mut templates = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id.clone();
            match record.decode() {
                Ok(template) => templates.push(template),
                Err(e) => tracing::error!(template_id = ?id, error = %e, "skipping undecodable template"),
            }
        }
        Ok(templates)
    }

    async fn create(&self, template: &Template) -> Result<Template, StoreError> {
        let mut record = TemplateRecord::encode(template)?;
        let now = Utc::now();
        record.id = Some(self.next("tpl"));
        record.created_at = Some(now);
        record.updated_at = Some(now);
        self.assign_field_ids(&mut record);

        self.records.write().push(record.clone());
        Ok(record.decode()?)
    }

    async fn update(&self, id: &TemplateId, template: &Template) -> Result<Template, StoreError> {
        let mut record = TemplateRecord::encode(template)?;
        self.assign_field_ids(&mut record);

        let stored = {
            let mut records = self.records.write();
            let existing = records
                .iter_mut()
                .find(|r| r.id.as_deref() == Some(id.as_str()))
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            record.id = existing.id.clone();
            record.created_at = existing.created_at;
            record.updated_at = Some(Utc::now());
            // Activation is owned by `activate`, not by a full replace.
            record.is_active = existing.is_active;
            *existing = record.clone();
            record
        };
        Ok(stored.decode()?)
    }

    async fn delete(&self, id: &TemplateId) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.id.as_deref() != Some(id.as_str()));
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn activate(&self, id: &TemplateId) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let business_id = records
            .iter()
            .find(|r| r.id.as_deref() == Some(id.as_str()))
            .map(|r| r.business_id.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        for record in records.iter_mut().filter(|r| r.business_id == business_id) {
            record.is_active = record.id.as_deref() == Some(id.as_str());
        }
        Ok(())
    }
}

#[async_trait]
impl BusinessProfileSource for InMemoryTemplateStore {
    async fn review_url(&self, business_id: &BusinessId) -> Result<Option<ReviewUrl>, StoreError> {
        Ok(self.review_urls.read().get(business_id.as_str()).cloned())
    }
}
