use async_trait::async_trait;
use audit_core::audits::{
    Audit, AuditReport, Evidence, EvidenceStore, QuestionResponse, RemoteAuditStore,
    ResponseUpdate, ScoringEngine,
};
use audit_core::error::RemoteError;
use audit_core::templates::persistence::RemoteTemplateStore;
use audit_core::templates::wire::{
    AreaWire, OptionWire, QuestionWire, ScopeWire, TemplatePayload, TemplateWire,
};
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Backend-less template store keeping wire trees in a map and assigning
/// persisted IDs on create. Stands in for the real backend in the demo and
/// local development.
#[derive(Default)]
pub(crate) struct InMemoryTemplateBackend {
    templates: Mutex<HashMap<String, TemplateWire>>,
    sequence: AtomicU64,
}

impl InMemoryTemplateBackend {
    fn next_id(&self) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        // 36 characters, matching the persisted-ID shape clients key on.
        format!("11111111-0000-4000-8000-{seq:012x}")
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
impl RemoteTemplateStore for InMemoryTemplateBackend {
    async fn list(&self) -> Result<Vec<TemplateWire>, RemoteError> {
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
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn create(&self, payload: TemplatePayload) -> Result<TemplateWire, RemoteError> {
        let wire = self.materialize(self.next_id(), payload);
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .insert(wire.id.clone(), wire.clone());
        Ok(wire)
    }

    async fn update(&self, id: &str, payload: TemplatePayload) -> Result<TemplateWire, RemoteError> {
        let mut guard = self.templates.lock().expect("template mutex poisoned");
        if !guard.contains_key(id) {
            return Err(RemoteError::NotFound);
        }
        let wire = self.materialize(id.to_string(), payload);
        guard.insert(id.to_string(), wire.clone());
        Ok(wire)
    }

    async fn clone_template(
        &self,
        id: &str,
        new_name: &str,
        snapshot: TemplatePayload,
    ) -> Result<TemplateWire, RemoteError> {
        if !self
            .templates
            .lock()
            .expect("template mutex poisoned")
            .contains_key(id)
        {
            return Err(RemoteError::NotFound);
        }
        let mut snapshot = snapshot;
        snapshot.name = new_name.to_string();
        let wire = self.materialize(self.next_id(), snapshot);
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .insert(wire.id.clone(), wire.clone());
        Ok(wire)
    }

    async fn delete(&self, id: &str) -> Result<(), RemoteError> {
        self.templates
            .lock()
            .expect("template mutex poisoned")
            .remove(id)
            .map(|_| ())
            .ok_or(RemoteError::NotFound)
    }
}

/// Backend-less audit store: applies response batches to held audits and
/// derives reports on demand.
#[derive(Default)]
pub(crate) struct InMemoryAuditBackend {
    audits: Mutex<HashMap<String, Audit>>,
    finalized: Mutex<HashSet<String>>,
    evidence_sequence: AtomicU64,
}

impl InMemoryAuditBackend {
    pub(crate) fn seed(&self, audit: Audit) {
        self.audits
            .lock()
            .expect("audit mutex poisoned")
            .insert(audit.id.clone(), audit);
    }

    /// Attach an uploaded evidence reference to a question's response.
    pub(crate) fn attach_evidence(&self, audit_id: &str, question_id: &str, evidence: Evidence) {
        let mut audits = self.audits.lock().expect("audit mutex poisoned");
        let Some(audit) = audits.get_mut(audit_id) else {
            return;
        };
        for area in &mut audit.areas {
            for scope in &mut area.scopes {
                for question in &mut scope.questions {
                    if question.id == question_id {
                        if let Some(response) = question.response.as_mut() {
                            response.evidences.push(evidence);
                        }
                        return;
                    }
                }
            }
        }
    }

    fn apply(audit: &mut Audit, updates: &[ResponseUpdate]) {
        for area in &mut audit.areas {
            for scope in &mut area.scopes {
                for question in &mut scope.questions {
                    let Some(update) = updates.iter().find(|u| u.question_id == question.id)
                    else {
                        continue;
                    };
                    let response = question.response.get_or_insert(QuestionResponse {
                        score: None,
                        comment: None,
                        recommendation: None,
                        evidences: Vec::new(),
                        is_answered: false,
                    });
                    if update.score.is_some() {
                        response.score = update.score;
                        response.is_answered = true;
                    }
                    if update.comment.is_some() {
                        response.comment = update.comment.clone();
                    }
                    if update.recommendation.is_some() {
                        response.recommendation = update.recommendation.clone();
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RemoteAuditStore for InMemoryAuditBackend {
    async fn get_audit(&self, id: &str) -> Result<Audit, RemoteError> {
        self.audits
            .lock()
            .expect("audit mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    async fn get_report(&self, id: &str) -> Result<AuditReport, RemoteError> {
        let audit = self.get_audit(id).await?;
        Ok(ScoringEngine::default().report(&audit))
    }

    async fn save_responses(
        &self,
        id: &str,
        updates: Vec<ResponseUpdate>,
    ) -> Result<(), RemoteError> {
        if self
            .finalized
            .lock()
            .expect("finalized mutex poisoned")
            .contains(id)
        {
            return Err(RemoteError::Rejected("audit is finalized".to_string()));
        }
        let mut audits = self.audits.lock().expect("audit mutex poisoned");
        let audit = audits.get_mut(id).ok_or(RemoteError::NotFound)?;
        Self::apply(audit, &updates);
        Ok(())
    }

    async fn finalize(&self, id: &str) -> Result<(), RemoteError> {
        if !self
            .audits
            .lock()
            .expect("audit mutex poisoned")
            .contains_key(id)
        {
            return Err(RemoteError::NotFound);
        }
        self.finalized
            .lock()
            .expect("finalized mutex poisoned")
            .insert(id.to_string());
        Ok(())
    }
}

#[async_trait]
impl EvidenceStore for InMemoryAuditBackend {
    async fn upload(&self, file_name: &str, _bytes: Vec<u8>) -> Result<Evidence, RemoteError> {
        let seq = self.evidence_sequence.fetch_add(1, Ordering::Relaxed);
        Ok(Evidence {
            id: format!("evidence-{seq:06}"),
            file_name: file_name.to_string(),
            file_url: format!("/files/{file_name}"),
        })
    }
}
