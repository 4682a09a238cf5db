//! Builder state machine
//!
//! One explicit state object for the form editor. Every edit is a transition
//! `BuilderState + BuilderAction -> BuilderState`; store calls live in
//! `application::commands` and feed their outcomes back in as actions.

use crate::domain::aggregates::{FieldDefinition, FieldPatch, Template};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::{
    BusinessId, FieldId, FieldType, ReviewUrl, TemplateId, TemplateSettings,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuilderMode {
    /// Working on a template that has never been saved
    CreateNew,
    /// Working on a stored template
    Editing(TemplateId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient message for the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

/// The field open in the side editor; kept in step with the template
#[derive(Clone, Debug, PartialEq)]
pub struct FieldEditor {
    pub field_id: FieldId,
    pub draft: FieldDefinition,
}

/// What to show before deleting a template
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletePrompt {
    pub template_id: TemplateId,
    pub template_name: String,
    pub is_last: bool,
    pub message: String,
}

#[derive(Clone, Debug)]
pub enum BuilderAction {
    /// Start a fresh template; `review_url` is the business profile's URL
    CreateNew { review_url: Option<ReviewUrl> },
    Load(Template),
    SetName(String),
    SetDescription(String),
    SetReviewUrl(String),
    UpdateSettings(TemplateSettings),
    AddField(FieldType),
    UpdateField { id: FieldId, patch: FieldPatch },
    RemoveField(FieldId),
    DuplicateField(FieldId),
    MoveField { from: usize, to: usize },
    OpenEditor(FieldId),
    EditDraft(FieldPatch),
    CloseEditor,
    SetPreview(bool),
    TemplatesLoaded(Vec<Template>),
    Saved(Template),
    Deleted(TemplateId),
    Activated(TemplateId),
    Notify(Notice),
    ClearNotices,
}

#[derive(Clone, Debug)]
pub struct BuilderState {
    business_id: BusinessId,
    mode: BuilderMode,
    working: Template,
    templates: Vec<Template>,
    editor: Option<FieldEditor>,
    preview: bool,
    notices: Vec<Notice>,
}

impl BuilderState {
    /// Builder in create-new mode with the default fields
    pub fn new(business_id: BusinessId, review_url: Option<ReviewUrl>) -> Self {
        Self {
            working: Template::with_default_fields(business_id.clone(), review_url),
            business_id,
            mode: BuilderMode::CreateNew,
            templates: vec![],
            editor: None,
            preview: false,
            notices: vec![],
        }
    }

    pub fn business_id(&self) -> &BusinessId { &self.business_id }
    pub fn mode(&self) -> &BuilderMode { &self.mode }
    pub fn working(&self) -> &Template { &self.working }
    pub fn templates(&self) -> &[Template] { &self.templates }
    pub fn editor(&self) -> Option<&FieldEditor> { self.editor.as_ref() }
    pub fn is_preview(&self) -> bool { self.preview }
    pub fn notices(&self) -> &[Notice] { &self.notices }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Drain field events raised on the working template
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        self.working.take_events()
    }

    pub fn find(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| t.id() == Some(id))
    }

    /// Confirmation copy for deleting `id`; `None` if the template is unknown
    pub fn delete_prompt(&self, id: &TemplateId) -> Option<DeletePrompt> {
        let template = self
            .find(id)
            .or_else(|| Some(&self.working).filter(|w| w.id() == Some(id)))?;
        let is_last = self.templates.iter().all(|t| t.id() == Some(id));
        let name = template.name().to_string();
        let message = if is_last {
            format!(
                "\"{}\" is your only template. Deleting it leaves your review page without a form until you create a new one. Delete it anyway?",
                name
            )
        } else {
            format!("Are you sure you want to delete \"{}\"? This cannot be undone.", name)
        };
        Some(DeletePrompt {
            template_id: id.clone(),
            template_name: name,
            is_last,
            message,
        })
    }

    /// Apply one transition, returning the next state
    pub fn reduce(mut self, action: BuilderAction) -> Self {
        self.apply(action);
        self
    }

    /// Apply one transition in place
    pub fn apply(&mut self, action: BuilderAction) {
        match action {
            BuilderAction::CreateNew { review_url } => {
                let url = review_url.or_else(|| self.working.review_url().cloned());
                self.reset_to_new(url);
            }
            BuilderAction::Load(mut template) => {
                template.inherit_review_url(self.working.review_url().cloned());
                self.mode = match template.id() {
                    Some(id) => BuilderMode::Editing(id.clone()),
                    None => BuilderMode::CreateNew,
                };
                self.working = template;
                self.editor = None;
            }
            BuilderAction::SetName(name) => self.working.set_name(name),
            BuilderAction::SetDescription(description) => self.working.set_description(description),
            BuilderAction::SetReviewUrl(raw) => {
                if let Err(e) = self.working.set_review_url(&raw) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            BuilderAction::UpdateSettings(settings) => self.working.set_settings(settings),
            BuilderAction::AddField(field_type) => {
                let id = self.working.add_field(field_type);
                self.open_editor(&id);
            }
            BuilderAction::UpdateField { id, patch } => {
                if let Err(e) = self.working.update_field(&id, patch) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            BuilderAction::RemoveField(id) => {
                if let Err(e) = self.working.remove_field(&id) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            BuilderAction::DuplicateField(id) => {
                if let Err(e) = self.working.duplicate_field(&id) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            BuilderAction::MoveField { from, to } => {
                if let Err(e) = self.working.move_field(from, to) {
                    self.notices.push(Notice::error(e.to_string()));
                }
            }
            BuilderAction::OpenEditor(id) => self.open_editor(&id),
            BuilderAction::EditDraft(patch) => {
                if let Some(id) = self.editor.as_ref().map(|e| e.field_id.clone()) {
                    self.apply(BuilderAction::UpdateField { id, patch });
                }
            }
            BuilderAction::CloseEditor => self.editor = None,
            BuilderAction::SetPreview(preview) => self.preview = preview,
            BuilderAction::TemplatesLoaded(templates) => self.templates = templates,
            BuilderAction::Saved(template) => {
                if let Some(id) = template.id() {
                    match self.templates.iter_mut().find(|t| t.id() == Some(id)) {
                        Some(existing) => *existing = template.clone(),
                        None => self.templates.push(template.clone()),
                    }
                    self.mode = BuilderMode::Editing(id.clone());
                }
                self.working = template;
                self.notices.push(Notice::success("Template saved successfully"));
            }
            BuilderAction::Deleted(id) => {
                self.templates.retain(|t| t.id() != Some(&id));
                let was_working = self.mode == BuilderMode::Editing(id.clone());
                let none_left = self.templates.is_empty() && self.mode != BuilderMode::CreateNew;
                if was_working || none_left {
                    let url = self.working.review_url().cloned();
                    self.reset_to_new(url);
                }
                self.notices.push(Notice::success("Template deleted"));
            }
            BuilderAction::Activated(id) => {
                for template in &mut self.templates {
                    let active = template.id() == Some(&id);
                    template.set_active(active);
                }
                let active = self.working.id() == Some(&id);
                self.working.set_active(active);
            }
            BuilderAction::Notify(notice) => self.notices.push(notice),
            BuilderAction::ClearNotices => self.notices.clear(),
        }
        self.sync_editor();
    }

    fn reset_to_new(&mut self, review_url: Option<ReviewUrl>) {
        self.working = Template::with_default_fields(self.business_id.clone(), review_url);
        self.mode = BuilderMode::CreateNew;
        self.editor = None;
        self.preview = false;
    }

    fn open_editor(&mut self, id: &FieldId) {
        match self.working.field(id) {
            Some(field) => {
                self.editor = Some(FieldEditor { field_id: id.clone(), draft: field.clone() })
            }
            None => self.notices.push(Notice::error(format!("Field not found: {}", id))),
        }
    }

    // The draft mirrors the committed field; the editor closes if the field is gone.
    fn sync_editor(&mut self) {
        let Some(editor) = &self.editor else { return };
        self.editor = self
            .working
            .field(&editor.field_id)
            .map(|field| FieldEditor { field_id: field.id.clone(), draft: field.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::TemplateParts;
    use crate::domain::value_objects::FieldOption;

    fn url(s: &str) -> ReviewUrl {
        ReviewUrl::parse(s).unwrap()
    }

    fn state() -> BuilderState {
        BuilderState::new(BusinessId::new("biz"), Some(url("https://example.com/profile")))
    }

    fn stored(id: &str, name: &str, review_url: Option<ReviewUrl>) -> Template {
        let mut template = Template::from(TemplateParts {
            id: Some(TemplateId::new(id)),
            business_id: BusinessId::new("biz"),
            name: name.into(),
            ..Default::default()
        });
        template.add_field(FieldType::Text);
        if let Some(u) = review_url {
            template.set_review_url(u.as_str()).unwrap();
        }
        template.take_events();
        template
    }

    #[test]
    fn test_new_state_is_create_new_with_defaults() {
        let s = state();
        assert_eq!(s.mode(), &BuilderMode::CreateNew);
        assert_eq!(s.working().fields().len(), 4);
        assert_eq!(s.working().review_url().unwrap().as_str(), "https://example.com/profile");
    }

    #[test]
    fn test_add_field_opens_editor() {
        let s = state().reduce(BuilderAction::AddField(FieldType::Dropdown));
        let editor = s.editor().unwrap();
        assert_eq!(editor.draft.field_type, FieldType::Dropdown);
        assert_eq!(editor.draft.order, 4);
        assert_eq!(editor.draft.options().len(), 2);
    }

    #[test]
    fn test_update_keeps_draft_in_sync() {
        let s = state().reduce(BuilderAction::AddField(FieldType::Text));
        let id = s.editor().unwrap().field_id.clone();

        let s = s.reduce(BuilderAction::UpdateField { id: id.clone(), patch: FieldPatch::label("Nickname") });
        assert_eq!(s.editor().unwrap().draft.label, "Nickname");

        let s = s.reduce(BuilderAction::EditDraft(FieldPatch::required(true)));
        assert!(s.working().field(&id).unwrap().is_required);
        assert!(s.editor().unwrap().draft.is_required);
    }

    #[test]
    fn test_draft_order_follows_moves() {
        let s = state().reduce(BuilderAction::AddField(FieldType::Phone));
        let s = s.reduce(BuilderAction::MoveField { from: 4, to: 0 });
        assert_eq!(s.editor().unwrap().draft.order, 0);
    }

    #[test]
    fn test_removing_edited_field_closes_editor() {
        let s = state().reduce(BuilderAction::AddField(FieldType::Text));
        let id = s.editor().unwrap().field_id.clone();
        let s = s.reduce(BuilderAction::RemoveField(id));
        assert!(s.editor().is_none());
        assert_eq!(s.working().fields().len(), 4);
    }

    #[test]
    fn test_refused_update_raises_notice() {
        let s = state();
        let id = s.working().fields()[0].id.clone();
        let s = s.reduce(BuilderAction::UpdateField {
            id,
            patch: FieldPatch::options(vec![FieldOption::new("A", "a")]),
        });
        assert_eq!(s.notices().len(), 1);
        assert_eq!(s.notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_malformed_review_url_leaves_state() {
        let s = state().reduce(BuilderAction::SetReviewUrl("javascript:alert(1)".into()));
        assert_eq!(s.working().review_url().unwrap().as_str(), "https://example.com/profile");
        assert_eq!(s.notices()[0].level, NoticeLevel::Error);
    }

    #[test]
    fn test_load_preserves_review_url_when_template_lacks_one() {
        let s = state().reduce(BuilderAction::Load(stored("t1", "One", None)));
        assert_eq!(s.mode(), &BuilderMode::Editing(TemplateId::new("t1")));
        assert_eq!(s.working().review_url().unwrap().as_str(), "https://example.com/profile");

        let own = url("https://example.com/own");
        let s = s.reduce(BuilderAction::Load(stored("t2", "Two", Some(own.clone()))));
        assert_eq!(s.working().review_url(), Some(&own));
    }

    #[test]
    fn test_saved_becomes_working_and_joins_list() {
        let s = state().reduce(BuilderAction::SetName("Main".into()));
        let s = s.reduce(BuilderAction::Saved(stored("t1", "Main", None)));
        assert_eq!(s.mode(), &BuilderMode::Editing(TemplateId::new("t1")));
        assert_eq!(s.templates().len(), 1);
        assert_eq!(s.notices()[0].level, NoticeLevel::Success);

        let s = s.reduce(BuilderAction::Saved(stored("t1", "Main v2", None)));
        assert_eq!(s.templates().len(), 1);
        assert_eq!(s.templates()[0].name(), "Main v2");
    }

    #[test]
    fn test_deleting_working_template_switches_to_create_new() {
        let s = state()
            .reduce(BuilderAction::TemplatesLoaded(vec![stored("t1", "One", None), stored("t2", "Two", None)]))
            .reduce(BuilderAction::Load(stored("t1", "One", None)))
            .reduce(BuilderAction::Deleted(TemplateId::new("t1")));
        assert_eq!(s.mode(), &BuilderMode::CreateNew);
        assert_eq!(s.working().fields().len(), 4);
        assert_eq!(s.templates().len(), 1);
    }

    #[test]
    fn test_deleting_other_template_keeps_working() {
        let s = state()
            .reduce(BuilderAction::TemplatesLoaded(vec![stored("t1", "One", None), stored("t2", "Two", None)]))
            .reduce(BuilderAction::Load(stored("t1", "One", None)))
            .reduce(BuilderAction::Deleted(TemplateId::new("t2")));
        assert_eq!(s.mode(), &BuilderMode::Editing(TemplateId::new("t1")));
    }

    #[test]
    fn test_deleting_only_template() {
        let s = state()
            .reduce(BuilderAction::TemplatesLoaded(vec![stored("t1", "Only", None)]))
            .reduce(BuilderAction::Load(stored("t1", "Only", None)));

        let prompt = s.delete_prompt(&TemplateId::new("t1")).unwrap();
        assert!(prompt.is_last);
        assert!(prompt.message.contains("only template"));

        let s = s.reduce(BuilderAction::Deleted(TemplateId::new("t1")));
        assert_eq!(s.mode(), &BuilderMode::CreateNew);
        assert!(s.templates().is_empty());
        assert_eq!(s.working().review_url().unwrap().as_str(), "https://example.com/profile");
    }

    #[test]
    fn test_delete_prompt_for_one_of_many() {
        let s = state().reduce(BuilderAction::TemplatesLoaded(vec![
            stored("t1", "One", None),
            stored("t2", "Two", None),
        ]));
        let prompt = s.delete_prompt(&TemplateId::new("t2")).unwrap();
        assert!(!prompt.is_last);
        assert!(prompt.message.contains("\"Two\""));
        assert!(s.delete_prompt(&TemplateId::new("t9")).is_none());
    }

    #[test]
    fn test_activation_marks_exactly_one() {
        let s = state()
            .reduce(BuilderAction::TemplatesLoaded(vec![stored("t1", "One", None), stored("t2", "Two", None)]))
            .reduce(BuilderAction::Activated(TemplateId::new("t1")))
            .reduce(BuilderAction::Activated(TemplateId::new("t2")));
        let active: Vec<_> = s.templates().iter().filter(|t| t.is_active()).map(|t| t.name()).collect();
        assert_eq!(active, vec!["Two"]);
    }

    #[test]
    fn test_create_new_resets_editor_and_preview() {
        let s = state()
            .reduce(BuilderAction::AddField(FieldType::Text))
            .reduce(BuilderAction::SetPreview(true))
            .reduce(BuilderAction::CreateNew { review_url: None });
        assert!(s.editor().is_none());
        assert!(!s.is_preview());
        assert_eq!(s.working().fields().len(), 4);
        assert_eq!(s.working().review_url().unwrap().as_str(), "https://example.com/profile");
    }
}
