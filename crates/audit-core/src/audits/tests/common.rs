use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicU64;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::audits::domain::{
    Audit, AuditArea, AuditQuestion, AuditScope, AuditStatus, QuestionResponse, ResponseUpdate,
    ScoreOption,
};
use crate::audits::remote::RemoteAuditStore;
use crate::audits::scoring::{AuditReport, ScoringEngine};
use crate::error::RemoteError;

/// Audit with one area, one scope, three mandatory questions on the 0-5
/// scale, no responses yet.
pub(super) fn sample_audit() -> Audit {
    let questions = ["CI pipeline in place?", "Code reviews enforced?", "Runbooks current?"]
        .iter()
        .enumerate()
        .map(|(index, text)| AuditQuestion {
            id: format!("q-{}", index + 1),
            text: (*text).to_string(),
            is_mandatory: true,
            options: (0..=5)
                .map(|value| ScoreOption {
                    value,
                    label: format!("Level {value}"),
                })
                .collect(),
            response: None,
        })
        .collect();

    Audit {
        id: "audit-1".to_string(),
        project_name: "Apollo".to_string(),
        template_name: "Delivery Excellence".to_string(),
        audit_date: NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
        status: AuditStatus::InProgress,
        areas: vec![AuditArea {
            id: "area-1".to_string(),
            name: "Engineering".to_string(),
            scopes: vec![AuditScope {
                id: "scope-1".to_string(),
                name: "Practices".to_string(),
                questions,
            }],
        }],
    }
}

/// Fake remote audit store recording every batch it receives, with one-shot
/// failure injection.
#[derive(Default)]
pub(super) struct InMemoryAuditRemote {
    audits: Mutex<HashMap<String, Audit>>,
    finalized: Mutex<HashSet<String>>,
    fail_next: Mutex<Option<RemoteError>>,
    pub(super) batches: Mutex<Vec<Vec<ResponseUpdate>>>,
    pub(super) save_calls: AtomicU64,
}

impl InMemoryAuditRemote {
    pub(super) fn with_audit(audit: Audit) -> Self {
        let remote = Self::default();
        remote
            .audits
            .lock()
            .expect("audit mutex poisoned")
            .insert(audit.id.clone(), audit);
        remote
    }

    pub(super) fn fail_next(&self, error: RemoteError) {
        *self.fail_next.lock().expect("fail mutex poisoned") = Some(error);
    }

    pub(super) fn recorded_batches(&self) -> Vec<Vec<ResponseUpdate>> {
        self.batches.lock().expect("batch mutex poisoned").clone()
    }

    fn take_failure(&self) -> Option<RemoteError> {
        self.fail_next.lock().expect("fail mutex poisoned").take()
    }

    fn apply(audit: &mut Audit, updates: &[ResponseUpdate]) {
        for area in &mut audit.areas {
            for scope in &mut area.scopes {
                for question in &mut scope.questions {
                    let Some(update) =
                        updates.iter().find(|u| u.question_id == question.id)
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
impl RemoteAuditStore for InMemoryAuditRemote {
    async fn get_audit(&self, id: &str) -> Result<Audit, RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
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
        self.save_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
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
        self.batches
            .lock()
            .expect("batch mutex poisoned")
            .push(updates);
        Ok(())
    }

    async fn finalize(&self, id: &str) -> Result<(), RemoteError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }
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
