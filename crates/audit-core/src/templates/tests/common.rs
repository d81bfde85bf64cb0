use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::RemoteError;
use crate::templates::domain::NodeId;
use crate::templates::persistence::RemoteTemplateStore;
use crate::templates::store::TemplateStore;
use crate::templates::wire::{
    AreaWire, OptionWire, QuestionWire, ScopeWire, TemplatePayload, TemplateWire,
};

/// Build a balanced draft (one area, one scope, 60/40 questions) through the
/// store's own mutation surface and return its ID.
pub(super) fn balanced_draft(store: &mut TemplateStore) -> NodeId {
    let template_id = store.init_draft("Delivery Excellence");
    let area_id = store
        .add_area(&template_id, "Engineering")
        .expect("area created");
    let scope_id = store
        .add_scope(&template_id, &area_id, "Practices")
        .expect("scope created");
    store
        .add_question(&template_id, &area_id, &scope_id, "CI pipeline in place?", 60.0)
        .expect("question created");
    store
        .add_question(&template_id, &area_id, &scope_id, "Code reviews enforced?", 40.0)
        .expect("question created");
    template_id
}

/// Fake remote store: a HashMap of wire trees plus call counters so tests can
/// assert which remote operations actually fired.
#[derive(Default)]
pub(super) struct InMemoryTemplateRemote {
    templates: Mutex<HashMap<String, TemplateWire>>,
    sequence: AtomicU64,
    fail_next: Mutex<Option<RemoteError>>,
    pub(super) detail_calls: AtomicU64,
    pub(super) create_calls: AtomicU64,
    pub(super) update_calls: AtomicU64,
    pub(super) delete_calls: AtomicU64,
}

impl InMemoryTemplateRemote {
    pub(super) fn fail_next(&self, error: RemoteError) {
        *self.fail_next.lock().expect("fail mutex poisoned") = Some(error);
    }

    pub(super) fn contains(&self, id: &str) -> bool {
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .contains_key(id)
    }

    pub(super) fn seed(&self, wire: TemplateWire) {
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .insert(wire.id.clone(), wire);
    }

    fn take_failure(&self) -> Option<RemoteError> {
        self.fail_next.lock().expect("fail mutex poisoned").take()
    }

    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        // 36 characters, the persisted-ID shape.
        format!("00000000-0000-4000-8000-{seq:012x}")
    }

    fn materialize(&self, template_id: String, payload: TemplatePayload) -> TemplateWire {
        let now = Utc::now();
        let areas = payload
            .areas
            .into_iter()
            .map(|area| {
                let area_id = area.id.unwrap_or_else(|| self.next_id());
                let scopes = area
                    .scopes
                    .into_iter()
                    .map(|scope| {
                        let scope_id = scope.id.unwrap_or_else(|| self.next_id());
                        let questions = scope
                            .questions
                            .into_iter()
                            .map(|question| QuestionWire {
                                id: question.id.unwrap_or_else(|| self.next_id()),
                                scope_id: scope_id.clone(),
                                text: question.text,
                                percentage: question.percentage,
                                is_mandatory: question.is_mandatory,
                                options: question
                                    .options
                                    .into_iter()
                                    .map(|option| OptionWire {
                                        id: option.id.unwrap_or_else(|| self.next_id()),
                                        label: option.label,
                                        value: option.value,
                                    })
                                    .collect(),
                            })
                            .collect();
                        ScopeWire {
                            id: scope_id,
                            area_id: area_id.clone(),
                            name: scope.name,
                            questions,
                        }
                    })
                    .collect();
                AreaWire {
                    id: area_id,
                    template_id: template_id.clone(),
                    name: area.name,
                    weightage: area.weightage,
                    scopes,
                }
            })
            .collect();

        TemplateWire {
            id: template_id,
            name: payload.name,
            created_at: now,
            updated_at: now,
            areas,
        }
    }
}

#[async_trait]
impl RemoteTemplateStore for InMemoryTemplateRemote {
    async fn list(&self) -> Result<Vec<TemplateWire>, RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let guard = self.templates.lock().expect("template mutex poisoned");
        let mut summaries: Vec<TemplateWire> = guard
            .values()
            .cloned()
            .map(|mut wire| {
                for area in &mut wire.areas {
                    area.scopes.clear();
                }
                wire
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    async fn get_detail(&self, id: &str) -> Result<TemplateWire, RemoteError> {
        self.detail_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn create(&self, payload: TemplatePayload) -> Result<TemplateWire, RemoteError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        let wire = self.materialize(self.next_id(), payload);
        self.seed(wire.clone());
        Ok(wire)
    }

    async fn update(
        &self,
        id: &str,
        payload: TemplatePayload,
    ) -> Result<TemplateWire, RemoteError> {
        self.update_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        if !self.contains(id) {
            return Err(RemoteError::NotFound);
        }
        let wire = self.materialize(id.to_string(), payload);
        self.seed(wire.clone());
        Ok(wire)
    }

    async fn clone_template(
        &self,
        id: &str,
        new_name: &str,
        snapshot: TemplatePayload,
    ) -> Result<TemplateWire, RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        if !self.contains(id) {
            return Err(RemoteError::NotFound);
        }
        let mut snapshot = snapshot;
        snapshot.name = new_name.to_string();
        let wire = self.materialize(self.next_id(), snapshot);
        self.seed(wire.clone());
        Ok(wire)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.delete_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(RemoteError::NotFound)
    }
}
