//! In-memory store for the template collection being edited.
//!
//! Every structural mutation is synchronous and atomic from the caller's
//! perspective. Operations addressed to a missing template/area/scope/question
//! are silently ignored; creators return `None` in that case so callers can
//! observe the no-op.

use chrono::Utc;
use tracing::debug;

use super::domain::{
    AuditArea, NodeId, OptionUpdate, Question, QuestionOption, QuestionUpdate, Scope, Template,
};

/// Owns the template trees plus the selection and async-operation side-state
/// the surrounding surfaces observe.
#[derive(Debug, Default)]
pub struct TemplateStore {
    templates: Vec<Template>,
    selected_template: Option<NodeId>,
    selected_area: Option<NodeId>,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
}

impl TemplateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn template(&self, id: &NodeId) -> Option<&Template> {
        self.templates.iter().find(|template| &template.id == id)
    }

    pub fn selected_template(&self) -> Option<&NodeId> {
        self.selected_template.as_ref()
    }

    pub fn selected_area(&self) -> Option<&NodeId> {
        self.selected_area.as_ref()
    }

    pub fn select_template(&mut self, id: Option<NodeId>) {
        if self.selected_template != id {
            self.selected_area = None;
        }
        self.selected_template = id;
        self.sync_area_selection();
    }

    pub fn select_area(&mut self, id: Option<NodeId>) {
        self.selected_area = id;
    }

    /// Point the area selection at the first area of the selected template
    /// when nothing is selected yet and areas exist.
    fn sync_area_selection(&mut self) {
        if self.selected_area.is_some() {
            return;
        }
        let Some(template_id) = self.selected_template.clone() else {
            return;
        };
        if let Some(template) = self.template(&template_id) {
            self.selected_area = template.areas.first().map(|area| area.id.clone());
        }
    }

    // ---- template lifecycle ----

    /// Create an empty client-only draft and select it.
    pub fn init_draft(&mut self, name: &str) -> NodeId {
        let template = Template::draft(name);
        let id = template.id.clone();
        debug!(template = %id, "initialized draft template");
        self.templates.push(template);
        self.selected_template = Some(id.clone());
        self.selected_area = None;
        id
    }

    pub fn set_template_name(&mut self, id: &NodeId, name: &str) {
        if let Some(template) = self.template_mut(id) {
            template.name = name.to_string();
            template.updated_at = Utc::now();
        }
    }

    /// Replace the whole collection (summary fetch). Selection is kept when
    /// it still resolves, dropped otherwise.
    pub(crate) fn replace_all(&mut self, templates: Vec<Template>) {
        self.templates = templates;
        if let Some(selected) = self.selected_template.clone() {
            if self.template(&selected).is_none() {
                self.selected_template = None;
                self.selected_area = None;
            }
        }
        self.sync_area_selection();
    }

    /// Merge a freshly fetched detail tree: replace the matching slot or
    /// append when the template is new to this store.
    pub(crate) fn upsert_fetched(&mut self, template: Template) {
        match self
            .templates
            .iter_mut()
            .find(|existing| existing.id == template.id)
        {
            Some(slot) => *slot = template,
            None => self.templates.push(template),
        }
        self.sync_area_selection();
    }

    pub(crate) fn insert(&mut self, template: Template) {
        self.templates.push(template);
    }

    /// Replace the slot found by `original_id` with the server's returned
    /// representation. When the saved draft was selected, selection follows
    /// the identity transition to the persisted ID.
    pub(crate) fn apply_saved(&mut self, original_id: &NodeId, saved: Template) {
        let saved_id = saved.id.clone();
        match self
            .templates
            .iter_mut()
            .find(|existing| &existing.id == original_id)
        {
            Some(slot) => *slot = saved,
            None => self.templates.push(saved),
        }

        if self.selected_template.as_ref() == Some(original_id) {
            self.selected_template = Some(saved_id.clone());
            // Area identities changed on save as well; re-point at the tree we
            // actually hold now.
            let still_valid = self
                .selected_area
                .as_ref()
                .and_then(|area_id| self.template(&saved_id).and_then(|t| t.area(area_id)))
                .is_some();
            if !still_valid {
                self.selected_area = None;
                self.sync_area_selection();
            }
        }
    }

    /// Remove a template locally. Clears selection when it pointed here.
    pub fn remove(&mut self, id: &NodeId) {
        self.templates.retain(|template| &template.id != id);
        if self.selected_template.as_ref() == Some(id) {
            self.selected_template = None;
            self.selected_area = None;
        }
    }

    // ---- area CRUD ----

    pub fn add_area(&mut self, template_id: &NodeId, name: &str) -> Option<NodeId> {
        let template = self.template_mut(template_id)?;
        let area = AuditArea::new(template_id.clone(), name);
        let area_id = area.id.clone();
        template.areas.push(area);
        template.updated_at = Utc::now();
        Some(area_id)
    }

    pub fn rename_area(&mut self, template_id: &NodeId, area_id: &NodeId, name: &str) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            area.name = name.to_string();
            changed = true;
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    pub fn delete_area(&mut self, template_id: &NodeId, area_id: &NodeId) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let before = template.areas.len();
        template.areas.retain(|area| &area.id != area_id);
        if template.areas.len() != before {
            template.updated_at = Utc::now();
            if self.selected_area.as_ref() == Some(area_id) {
                self.selected_area = None;
            }
        }
    }

    // ---- scope CRUD ----

    pub fn add_scope(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        name: &str,
    ) -> Option<NodeId> {
        let template = self.template_mut(template_id)?;
        let mut created = None;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            let scope = Scope::new(area_id.clone(), name);
            created = Some(scope.id.clone());
            area.scopes.push(scope);
        }
        if created.is_some() {
            template.updated_at = Utc::now();
        }
        created
    }

    pub fn rename_scope(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        name: &str,
    ) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(scope) = area_scope_mut(&mut template.areas, area_id, scope_id) {
            scope.name = name.to_string();
            changed = true;
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    /// Deleting a scope removes its questions with it, so the owning area's
    /// weightage must be re-derived.
    pub fn delete_scope(&mut self, template_id: &NodeId, area_id: &NodeId, scope_id: &NodeId) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            let before = area.scopes.len();
            area.scopes.retain(|scope| &scope.id != scope_id);
            if area.scopes.len() != before {
                area.rederive_weightage();
                changed = true;
            }
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    // ---- question CRUD ----

    pub fn add_question(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        text: &str,
        percentage: f64,
    ) -> Option<NodeId> {
        let template = self.template_mut(template_id)?;
        let mut created = None;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(scope) = area.scopes.iter_mut().find(|scope| &scope.id == scope_id) {
                let question = Question::new(scope_id.clone(), text, percentage);
                created = Some(question.id.clone());
                scope.questions.push(question);
                area.rederive_weightage();
            }
        }
        if created.is_some() {
            template.updated_at = Utc::now();
        }
        created
    }

    pub fn update_question(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        question_id: &NodeId,
        update: QuestionUpdate,
    ) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(question) =
                scope_question_mut(&mut area.scopes, scope_id, question_id)
            {
                if let Some(text) = update.text {
                    question.text = text;
                }
                let percentage_changed = update.percentage.is_some();
                if let Some(percentage) = update.percentage {
                    question.percentage = percentage;
                }
                changed = true;
                if percentage_changed {
                    area.rederive_weightage();
                }
            }
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    pub fn delete_question(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        question_id: &NodeId,
    ) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(scope) = area.scopes.iter_mut().find(|scope| &scope.id == scope_id) {
                let before = scope.questions.len();
                scope.questions.retain(|question| &question.id != question_id);
                if scope.questions.len() != before {
                    area.rederive_weightage();
                    changed = true;
                }
            }
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    // ---- option CRUD (scoring values, not template weight) ----

    pub fn add_option(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        question_id: &NodeId,
        label: &str,
        value: u32,
    ) -> Option<NodeId> {
        let template = self.template_mut(template_id)?;
        let mut created = None;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(question) = scope_question_mut(&mut area.scopes, scope_id, question_id) {
                let option = QuestionOption::new(label, value);
                created = Some(option.id.clone());
                question.options.push(option);
            }
        }
        if created.is_some() {
            template.updated_at = Utc::now();
        }
        created
    }

    pub fn update_option(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        question_id: &NodeId,
        option_id: &NodeId,
        update: OptionUpdate,
    ) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(question) = scope_question_mut(&mut area.scopes, scope_id, question_id) {
                if let Some(option) = question
                    .options
                    .iter_mut()
                    .find(|option| &option.id == option_id)
                {
                    if let Some(label) = update.label {
                        option.label = label;
                    }
                    if let Some(value) = update.value {
                        option.value = value;
                    }
                    changed = true;
                }
            }
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    pub fn delete_option(
        &mut self,
        template_id: &NodeId,
        area_id: &NodeId,
        scope_id: &NodeId,
        question_id: &NodeId,
        option_id: &NodeId,
    ) {
        let Some(template) = self.template_mut(template_id) else {
            return;
        };
        let mut changed = false;
        if let Some(area) = template.areas.iter_mut().find(|area| &area.id == area_id) {
            if let Some(question) = scope_question_mut(&mut area.scopes, scope_id, question_id) {
                let before = question.options.len();
                question.options.retain(|option| &option.id != option_id);
                changed = question.options.len() != before;
            }
        }
        if changed {
            template.updated_at = Utc::now();
        }
    }

    fn template_mut(&mut self, id: &NodeId) -> Option<&mut Template> {
        self.templates.iter_mut().find(|template| &template.id == id)
    }
}

fn area_scope_mut<'a>(
    areas: &'a mut [AuditArea],
    area_id: &NodeId,
    scope_id: &NodeId,
) -> Option<&'a mut Scope> {
    areas
        .iter_mut()
        .find(|area| &area.id == area_id)?
        .scopes
        .iter_mut()
        .find(|scope| &scope.id == scope_id)
}

fn scope_question_mut<'a>(
    scopes: &'a mut [Scope],
    scope_id: &NodeId,
    question_id: &NodeId,
) -> Option<&'a mut Question> {
    scopes
        .iter_mut()
        .find(|scope| &scope.id == scope_id)?
        .questions
        .iter_mut()
        .find(|question| &question.id == question_id)
}
