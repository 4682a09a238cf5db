//! Command handlers
//!
//! The builder service: applies builder transitions and performs the store
//! calls they need. Network failures become user notices; nothing here is
//! retried.

use chrono::Utc;
use std::sync::Arc;

use crate::application::builder::{BuilderAction, BuilderState, DeletePrompt, Notice};
use crate::domain::aggregates::{Template, TemplateError};
use crate::domain::events::{DomainEvent, TemplateEvent};
use crate::domain::value_objects::{BusinessId, TemplateId};
use crate::ports::outbound::{BusinessProfileSource, StoreError, TemplateStore};

#[derive(Clone, Debug)]
pub struct BuilderOptions {
    /// Activate a template right after it is saved (best-effort)
    pub activate_on_save: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { activate_on_save: true }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuilderError {
    #[error(transparent)]
    Validation(#[from] TemplateError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("unknown template: {0}")]
    UnknownTemplate(TemplateId),

    #[error("delete cancelled")]
    DeleteCancelled,
}

/// Template builder application service
pub struct TemplateBuilder {
    store: Arc<dyn TemplateStore>,
    profiles: Arc<dyn BusinessProfileSource>,
    options: BuilderOptions,
    state: BuilderState,
    events: Vec<DomainEvent>,
}

impl TemplateBuilder {
    pub fn new(
        business_id: BusinessId,
        store: Arc<dyn TemplateStore>,
        profiles: Arc<dyn BusinessProfileSource>,
        options: BuilderOptions,
    ) -> Self {
        Self {
            store,
            profiles,
            options,
            state: BuilderState::new(business_id, None),
            events: vec![],
        }
    }

    pub fn state(&self) -> &BuilderState {
        &self.state
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.state.take_notices()
    }

    /// Drain every event raised since the last call
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        self.events.extend(self.state.take_events());
        std::mem::take(&mut self.events)
    }

    /// Apply a local transition
    pub fn dispatch(&mut self, action: BuilderAction) {
        self.state.apply(action);
        // Events would be lost once the working template is replaced
        self.events.extend(self.state.take_events());
    }

    /// Load the template list, then start a fresh template
    pub async fn start(&mut self) {
        self.refresh().await.ok();
        self.create_new().await;
    }

    pub async fn refresh(&mut self) -> Result<(), BuilderError> {
        match self.store.list(self.state.business_id()).await {
            Ok(templates) => {
                self.dispatch(BuilderAction::TemplatesLoaded(templates));
                Ok(())
            }
            Err(e) => {
                tracing::error!(business_id = %self.state.business_id(), error = %e, "failed to load templates");
                self.dispatch(BuilderAction::Notify(Notice::error("Failed to load templates")));
                Err(e.into())
            }
        }
    }

    /// Reset to a fresh template seeded with the business review URL
    pub async fn create_new(&mut self) {
        let review_url = match self.profiles.review_url(self.state.business_id()).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(business_id = %self.state.business_id(), error = %e, "could not fetch business review url");
                None
            }
        };
        self.dispatch(BuilderAction::CreateNew { review_url });
    }

    /// Make a listed template the working one
    pub fn load(&mut self, id: &TemplateId) -> Result<(), BuilderError> {
        let template = self
            .state
            .find(id)
            .cloned()
            .ok_or_else(|| BuilderError::UnknownTemplate(id.clone()))?;
        self.dispatch(BuilderAction::Load(template));
        Ok(())
    }

    /// Persist the working template in full. Local validation failures never
    /// reach the store.
    pub async fn save(&mut self) -> Result<Template, BuilderError> {
        if let Err(e) = self.state.working().validate_for_save() {
            self.dispatch(BuilderAction::Notify(Notice::error(e.to_string())));
            return Err(e.into());
        }

        let template = self.state.working().clone();
        let created = !template.is_persisted();
        let result = match template.id() {
            Some(id) => self.store.update(id, &template).await,
            None => self.store.create(&template).await,
        };
        let result = result.and_then(|saved| {
            let id = saved.id().cloned();
            match id {
                Some(id) => Ok((id, saved)),
                None => Err(StoreError::Transport("store returned a template without an id".into())),
            }
        });

        let (id, saved) = match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::error!(template = %template.name(), error = %e, "failed to save template");
                self.dispatch(BuilderAction::Notify(Notice::error("Failed to save template")));
                return Err(e.into());
            }
        };

        tracing::info!(template_id = %id, created, "template saved");
        self.dispatch(BuilderAction::Saved(saved.clone()));
        self.events.push(DomainEvent::Template(TemplateEvent::Saved {
            template_id: id.clone(),
            created,
            saved_at: saved.updated_at().unwrap_or_else(Utc::now),
        }));

        if self.options.activate_on_save {
            self.activate(&id).await;
        }
        self.refresh().await.ok();

        Ok(self.state.working().clone())
    }

    /// Delete after `confirm` accepts the prompt
    pub async fn delete<F>(&mut self, id: &TemplateId, confirm: F) -> Result<(), BuilderError>
    where
        F: FnOnce(&DeletePrompt) -> bool,
    {
        let prompt = self
            .state
            .delete_prompt(id)
            .ok_or_else(|| BuilderError::UnknownTemplate(id.clone()))?;
        if !confirm(&prompt) {
            return Err(BuilderError::DeleteCancelled);
        }

        if let Err(e) = self.store.delete(id).await {
            tracing::error!(template_id = %id, error = %e, "failed to delete template");
            self.dispatch(BuilderAction::Notify(Notice::error("Failed to delete template")));
            return Err(e.into());
        }

        tracing::info!(template_id = %id, was_last = prompt.is_last, "template deleted");
        self.dispatch(BuilderAction::Deleted(id.clone()));
        self.events.push(DomainEvent::Template(TemplateEvent::Deleted {
            template_id: id.clone(),
            was_last: prompt.is_last,
        }));
        self.refresh().await.ok();
        Ok(())
    }

    /// Best-effort; a failure is logged and reported as `false`
    pub async fn activate(&mut self, id: &TemplateId) -> bool {
        match self.store.activate(id).await {
            Ok(()) => {
                self.dispatch(BuilderAction::Activated(id.clone()));
                self.events.push(DomainEvent::Template(TemplateEvent::Activated {
                    template_id: id.clone(),
                }));
                true
            }
            Err(e) => {
                tracing::warn!(template_id = %id, error = %e, "template activation failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::builder::{BuilderMode, NoticeLevel};
    use crate::domain::aggregates::FieldPatch;
    use crate::domain::services::{visible_fields, Responses};
    use crate::domain::value_objects::{ConditionalOperator, FieldConditional, FieldType, ReviewUrl};
    use serde_json::json;
    use crate::infrastructure::persistence::InMemoryTemplateStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn business() -> BusinessId {
        BusinessId::new("biz")
    }

    fn url(s: &str) -> ReviewUrl {
        ReviewUrl::parse(s).unwrap()
    }

    fn builder_with(store: Arc<InMemoryTemplateStore>) -> TemplateBuilder {
        TemplateBuilder::new(business(), store.clone(), store, BuilderOptions::default())
    }

    /// Every call fails and is counted
    #[derive(Default)]
    struct DownStore {
        calls: AtomicUsize,
    }

    impl DownStore {
        fn fail<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Transport("connection refused".into()))
        }
    }

    #[async_trait]
    impl TemplateStore for DownStore {
        async fn list(&self, _: &BusinessId) -> Result<Vec<Template>, StoreError> { self.fail() }
        async fn create(&self, _: &Template) -> Result<Template, StoreError> { self.fail() }
        async fn update(&self, _: &TemplateId, _: &Template) -> Result<Template, StoreError> { self.fail() }
        async fn delete(&self, _: &TemplateId) -> Result<(), StoreError> { self.fail() }
        async fn activate(&self, _: &TemplateId) -> Result<(), StoreError> { self.fail() }
    }

    #[async_trait]
    impl BusinessProfileSource for DownStore {
        async fn review_url(&self, _: &BusinessId) -> Result<Option<ReviewUrl>, StoreError> { self.fail() }
    }

    /// In-memory store whose activation endpoint is broken
    #[derive(Default)]
    struct NoActivation(InMemoryTemplateStore);

    #[async_trait]
    impl TemplateStore for NoActivation {
        async fn list(&self, b: &BusinessId) -> Result<Vec<Template>, StoreError> { self.0.list(b).await }
        async fn create(&self, t: &Template) -> Result<Template, StoreError> { self.0.create(t).await }
        async fn update(&self, id: &TemplateId, t: &Template) -> Result<Template, StoreError> { self.0.update(id, t).await }
        async fn delete(&self, id: &TemplateId) -> Result<(), StoreError> { self.0.delete(id).await }
        async fn activate(&self, _: &TemplateId) -> Result<(), StoreError> {
            Err(StoreError::Rejected { status: 500, message: "boom".into() })
        }
    }

    fn has_notice(builder: &TemplateBuilder, level: NoticeLevel, message: &str) -> bool {
        builder
            .state()
            .notices()
            .iter()
            .any(|n| n.level == level && n.message == message)
    }

    #[tokio::test]
    async fn test_save_without_name_makes_no_store_call() {
        let store = Arc::new(DownStore::default());
        let mut builder = TemplateBuilder::new(business(), store.clone(), store.clone(), BuilderOptions::default());

        let result = builder.save().await;
        assert!(matches!(result, Err(BuilderError::Validation(TemplateError::EmptyName))));
        assert!(has_notice(&builder, NoticeLevel::Error, "Please enter a template name"));

        builder.dispatch(BuilderAction::SetName("   ".into()));
        assert!(builder.save().await.is_err());
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_without_fields_makes_no_store_call() {
        let store = Arc::new(DownStore::default());
        let mut builder = TemplateBuilder::new(business(), store.clone(), store.clone(), BuilderOptions::default());
        builder.dispatch(BuilderAction::SetName("Main".into()));
        while let Some(id) = builder.state().working().fields().first().map(|f| f.id.clone()) {
            builder.dispatch(BuilderAction::RemoveField(id));
        }

        let result = builder.save().await;
        assert!(matches!(result, Err(BuilderError::Validation(TemplateError::NoFields))));
        assert!(has_notice(&builder, NoticeLevel::Error, "Please add at least one field"));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_save_creates_then_updates() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.start().await;
        builder.dispatch(BuilderAction::SetName("Main".into()));

        let saved = builder.save().await.unwrap();
        let id = saved.id().cloned().unwrap();
        assert_eq!(builder.state().mode(), &BuilderMode::Editing(id.clone()));
        assert!(has_notice(&builder, NoticeLevel::Success, "Template saved successfully"));
        assert!(saved.fields().iter().all(|f| !f.id.is_local()));

        builder.dispatch(BuilderAction::AddField(FieldType::Dropdown));
        builder.dispatch(BuilderAction::SetName("Main v2".into()));
        builder.save().await.unwrap();

        let stored = store.list(&business()).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name(), "Main v2");
        assert_eq!(stored[0].fields().len(), 5);
        assert_eq!(builder.state().templates().len(), 1);
    }

    #[tokio::test]
    async fn test_conditional_on_new_field_survives_save() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.dispatch(BuilderAction::SetName("Main".into()));
        let rating = builder.state().working().fields()[2].id.clone();
        builder.dispatch(BuilderAction::AddField(FieldType::Text));
        let follow_up = builder.state().working().fields()[4].id.clone();
        builder.dispatch(BuilderAction::UpdateField {
            id: follow_up,
            patch: FieldPatch {
                conditional: Some(Some(FieldConditional {
                    field_id: rating,
                    operator: ConditionalOperator::Equals,
                    value: json!(1),
                })),
                ..Default::default()
            },
        });

        let saved = builder.save().await.unwrap();
        let new_rating = saved.fields()[2].id.clone();
        assert!(!new_rating.is_local());
        assert_eq!(saved.fields()[4].conditional.as_ref().unwrap().field_id, new_rating);

        let reloaded = store.list(&business()).await.unwrap().remove(0);
        let mut responses = Responses::new();
        responses.insert(new_rating.to_string(), json!(1));
        assert_eq!(visible_fields(&reloaded, &responses).count(), 5);
        responses.insert(new_rating.to_string(), json!(4));
        assert_eq!(visible_fields(&reloaded, &responses).count(), 4);

        // Saving again keeps the reference pointed at the same field
        builder.dispatch(BuilderAction::SetName("Main v2".into()));
        let resaved = builder.save().await.unwrap();
        assert_eq!(resaved.fields()[4].conditional.as_ref().unwrap().field_id, new_rating);
        assert_eq!(visible_fields(&resaved, &responses).count(), 4);
    }

    #[tokio::test]
    async fn test_save_activates_by_default() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.dispatch(BuilderAction::SetName("Main".into()));
        builder.save().await.unwrap();

        assert!(store.list(&business()).await.unwrap()[0].is_active());
        assert!(builder.state().working().is_active());

        let kinds: Vec<_> = builder.take_events().iter().map(DomainEvent::event_type).collect();
        assert!(kinds.contains(&"template.saved"));
        assert!(kinds.contains(&"template.activated"));
    }

    #[tokio::test]
    async fn test_activation_failure_does_not_fail_save() {
        let store = Arc::new(NoActivation::default());
        let mut builder = TemplateBuilder::new(business(), store.clone(), Arc::new(InMemoryTemplateStore::new()), BuilderOptions::default());
        builder.dispatch(BuilderAction::SetName("Main".into()));

        let saved = builder.save().await.unwrap();
        assert!(!saved.is_active());
        assert!(!builder.state().notices().iter().any(|n| n.level == NoticeLevel::Error));
        assert!(!builder.activate(saved.id().unwrap()).await);
    }

    #[tokio::test]
    async fn test_store_failure_reported_generically() {
        let store = Arc::new(DownStore::default());
        let mut builder = TemplateBuilder::new(business(), store.clone(), store.clone(), BuilderOptions::default());
        builder.dispatch(BuilderAction::SetName("Main".into()));

        let result = builder.save().await;
        assert!(matches!(result, Err(BuilderError::Store(StoreError::Transport(_)))));
        assert!(has_notice(&builder, NoticeLevel::Error, "Failed to save template"));
        assert_eq!(builder.state().mode(), &BuilderMode::CreateNew);
        assert_eq!(builder.state().working().name(), "Main");
    }

    #[tokio::test]
    async fn test_refresh_failure_notice() {
        let store = Arc::new(DownStore::default());
        let mut builder = TemplateBuilder::new(business(), store.clone(), store.clone(), BuilderOptions::default());
        assert!(builder.refresh().await.is_err());
        assert!(has_notice(&builder, NoticeLevel::Error, "Failed to load templates"));
    }

    #[tokio::test]
    async fn test_create_new_uses_profile_review_url() {
        let profile_url = url("https://g.page/r/biz/review");
        let store = Arc::new(InMemoryTemplateStore::new().with_review_url(&business(), profile_url.clone()));
        let mut builder = builder_with(store);
        builder.create_new().await;

        assert_eq!(builder.state().working().review_url(), Some(&profile_url));
        assert_eq!(builder.state().working().fields().len(), 4);
    }

    #[tokio::test]
    async fn test_create_new_survives_profile_failure() {
        let mut builder = TemplateBuilder::new(
            business(),
            Arc::new(InMemoryTemplateStore::new()),
            Arc::new(DownStore::default()),
            BuilderOptions::default(),
        );
        builder.create_new().await;
        assert_eq!(builder.state().mode(), &BuilderMode::CreateNew);
        assert_eq!(builder.state().working().review_url(), None);
    }

    #[tokio::test]
    async fn test_load_keeps_review_url() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut plain = Template::with_default_fields(business(), None);
        plain.set_name("Plain");
        let stored = store.create(&plain).await.unwrap();

        let profile_url = url("https://example.com/review");
        let profiles = Arc::new(InMemoryTemplateStore::new().with_review_url(&business(), profile_url.clone()));
        let mut builder = TemplateBuilder::new(business(), store, profiles, BuilderOptions::default());
        builder.start().await;

        builder.load(stored.id().unwrap()).unwrap();
        assert_eq!(builder.state().working().name(), "Plain");
        assert_eq!(builder.state().working().review_url(), Some(&profile_url));

        let missing = builder.load(&TemplateId::new("nope"));
        assert!(matches!(missing, Err(BuilderError::UnknownTemplate(_))));
    }

    #[tokio::test]
    async fn test_delete_last_template_returns_to_create_new() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.dispatch(BuilderAction::SetName("Only".into()));
        let id = builder.save().await.unwrap().id().cloned().unwrap();

        let mut seen = None;
        builder
            .delete(&id, |prompt| {
                seen = Some(prompt.clone());
                true
            })
            .await
            .unwrap();

        let prompt = seen.unwrap();
        assert!(prompt.is_last);
        assert!(prompt.message.contains("only template"));
        assert_eq!(builder.state().mode(), &BuilderMode::CreateNew);
        assert_eq!(builder.state().working().fields().len(), 4);
        assert!(store.list(&business()).await.unwrap().is_empty());
        assert!(has_notice(&builder, NoticeLevel::Success, "Template deleted"));
    }

    #[tokio::test]
    async fn test_delete_cancelled_leaves_store_alone() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.dispatch(BuilderAction::SetName("Keep".into()));
        let id = builder.save().await.unwrap().id().cloned().unwrap();

        let result = builder.delete(&id, |_| false).await;
        assert!(matches!(result, Err(BuilderError::DeleteCancelled)));
        assert_eq!(store.list(&business()).await.unwrap().len(), 1);
        assert_eq!(builder.state().mode(), &BuilderMode::Editing(id));
    }

    #[tokio::test]
    async fn test_delete_other_template_keeps_working_one() {
        let store = Arc::new(InMemoryTemplateStore::new());
        let mut builder = builder_with(store.clone());
        builder.dispatch(BuilderAction::SetName("First".into()));
        let first = builder.save().await.unwrap().id().cloned().unwrap();
        builder.dispatch(BuilderAction::CreateNew { review_url: None });
        builder.dispatch(BuilderAction::SetName("Second".into()));
        let second = builder.save().await.unwrap().id().cloned().unwrap();

        builder.delete(&first, |prompt| !prompt.is_last).await.unwrap();
        assert_eq!(builder.state().mode(), &BuilderMode::Editing(second));
        assert_eq!(builder.state().templates().len(), 1);
    }
}
