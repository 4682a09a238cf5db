//! CLI Commands

pub mod config;
pub mod templates;

use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::Duration;

use review_forms::{BuilderOptions, BusinessId, HttpStoreConfig, HttpTemplateStore, TemplateBuilder};

/// Resolved connection settings (flag, then environment, then config file)
pub struct Connection {
    pub api_url: String,
    pub api_token: Option<String>,
    pub business_id: Option<String>,
    pub timeout: Option<u64>,
}

impl Connection {
    pub fn connect(self) -> anyhow::Result<TemplateBuilder> {
        let business_id = self
            .business_id
            .ok_or_else(|| anyhow!("no business id: pass --business-id or run `reviewforms config set business_id <id>`"))?;

        let mut config = HttpStoreConfig::new(self.api_url);
        if let Some(token) = self.api_token {
            config = config.with_token(token);
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }

        tracing::debug!(api_url = %config.base_url, business_id = %business_id, "using template service");
        let store = Arc::new(HttpTemplateStore::new(config).context("configuring template store")?);
        Ok(TemplateBuilder::new(
            BusinessId::new(business_id),
            store.clone(),
            store,
            BuilderOptions::default(),
        ))
    }
}
