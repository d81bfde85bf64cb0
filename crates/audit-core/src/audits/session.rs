//! Debounced autosave for audit response editing.
//!
//! Edits accumulate into a pending batch keyed by question; the batch is
//! flushed to the remote store once the editor has been quiet for the
//! configured debounce window. A failed flush keeps the batch locally so the
//! next flush retries it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::AutosaveConfig;

use super::domain::{Audit, ResponseUpdate};
use super::remote::RemoteAuditStore;

/// Where the session currently stands with the remote store. Surfaced
/// verbatim to "Saving... / Saved" style indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    Saving,
    Saved,
    Error,
}

impl SaveStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "",
            Self::Saving => "Saving...",
            Self::Saved => "Saved",
            Self::Error => "Save failed",
        }
    }
}

/// Answered/total counters for a progress bar, taking locally pending scores
/// into account before they reach the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditProgress {
    pub answered: u32,
    pub total: u32,
    pub unanswered_mandatory: u32,
}

impl AuditProgress {
    pub fn percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((100.0 * f64::from(self.answered)) / f64::from(self.total)).round() as u32
    }
}

struct State {
    pending: HashMap<String, ResponseUpdate>,
    status: SaveStatus,
    error: Option<String>,
    // Monotonic counters invalidating timers that were outrun by newer
    // activity.
    debounce_epoch: u64,
    save_epoch: u64,
    debounce_timer: Option<JoinHandle<()>>,
    status_timer: Option<JoinHandle<()>>,
}

struct Shared<S> {
    audit_id: String,
    remote: Arc<S>,
    debounce: Duration,
    saved_display: Duration,
    state: Mutex<State>,
}

/// One editing session over a single audit. Cloning is cheap and all clones
/// share the same pending batch.
pub struct ResponseEditSession<S> {
    inner: Arc<Shared<S>>,
}

impl<S> Clone for ResponseEditSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> ResponseEditSession<S>
where
    S: RemoteAuditStore + 'static,
{
    pub fn new(audit_id: &str, remote: Arc<S>, autosave: AutosaveConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                audit_id: audit_id.to_string(),
                remote,
                debounce: autosave.debounce(),
                saved_display: autosave.saved_display(),
                state: Mutex::new(State {
                    pending: HashMap::new(),
                    status: SaveStatus::Idle,
                    error: None,
                    debounce_epoch: 0,
                    save_epoch: 0,
                    debounce_timer: None,
                    status_timer: None,
                }),
            }),
        }
    }

    /// Record an edit and (re)arm the autosave timer. Must be called from
    /// within a tokio runtime.
    pub fn edit(&self, update: ResponseUpdate) {
        let my_epoch = {
            let mut state = self.inner.state.lock().expect("session state poisoned");
            state
                .pending
                .entry(update.question_id.clone())
                .and_modify(|existing| existing.merge(&update))
                .or_insert_with(|| update.clone());
            state.debounce_epoch += 1;
            state.debounce_epoch
        };

        // The timer holds a weak handle; once every session clone is gone the
        // shared state drops and the wakeup finds nothing to flush.
        let debounce = self.inner.debounce;
        let shared = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let Some(shared) = shared.upgrade() else {
                return;
            };
            {
                let state = shared.state.lock().expect("session state poisoned");
                // A later edit rearmed the window; this timer went stale and
                // the newer one owns the flush.
                if state.debounce_epoch != my_epoch {
                    return;
                }
            }
            Shared::flush(shared).await;
        });

        // Stale timers exit via the epoch check, so the previous handle only
        // needs dropping, never aborting mid-flush.
        let mut state = self.inner.state.lock().expect("session state poisoned");
        state.debounce_timer = Some(handle);
    }

    /// Flush the pending batch immediately, bypassing the debounce window.
    /// Used when the editor navigates away.
    pub async fn flush(&self) {
        {
            let mut state = self.inner.state.lock().expect("session state poisoned");
            // Invalidate any armed timer; it will wake, see the epoch moved
            // on, and exit without flushing.
            state.debounce_epoch += 1;
            state.debounce_timer = None;
        }
        Shared::flush(Arc::clone(&self.inner)).await;
    }

    /// Flush anything still pending and stop the timers.
    pub async fn close(&self) {
        self.flush().await;
        let mut state = self.inner.state.lock().expect("session state poisoned");
        if let Some(timer) = state.debounce_timer.take() {
            timer.abort();
        }
        if let Some(timer) = state.status_timer.take() {
            timer.abort();
        }
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.state.lock().expect("session state poisoned").status
    }

    pub fn error(&self) -> Option<String> {
        self.inner
            .state
            .lock()
            .expect("session state poisoned")
            .error
            .clone()
    }

    /// Snapshot of the accumulated, not-yet-saved diffs. Optimistic UI reads
    /// these over the stored responses.
    pub fn pending(&self) -> Vec<ResponseUpdate> {
        let mut updates: Vec<ResponseUpdate> = self
            .inner
            .state
            .lock()
            .expect("session state poisoned")
            .pending
            .values()
            .cloned()
            .collect();
        updates.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        updates
    }

    pub fn has_pending(&self) -> bool {
        !self
            .inner
            .state
            .lock()
            .expect("session state poisoned")
            .pending
            .is_empty()
    }

    /// Progress counters for the audit, counting a question as answered when
    /// either the stored response says so or this session holds a pending
    /// score for it.
    pub fn progress(&self, audit: &Audit) -> AuditProgress {
        let state = self.inner.state.lock().expect("session state poisoned");
        let mut answered = 0;
        let mut total = 0;
        let mut unanswered_mandatory = 0;
        for question in audit.questions() {
            total += 1;
            let pending_score = state
                .pending
                .get(&question.id)
                .and_then(|update| update.score)
                .is_some();
            if question.is_answered() || pending_score {
                answered += 1;
            } else if question.is_mandatory {
                unanswered_mandatory += 1;
            }
        }
        AuditProgress {
            answered,
            total,
            unanswered_mandatory,
        }
    }
}

impl<S> Shared<S>
where
    S: RemoteAuditStore + 'static,
{
    async fn flush(shared: Arc<Self>) {
        let (batch, my_save) = {
            let mut state = shared.state.lock().expect("session state poisoned");
            if state.pending.is_empty() {
                return;
            }
            let batch: Vec<ResponseUpdate> = state.pending.drain().map(|(_, v)| v).collect();
            state.status = SaveStatus::Saving;
            state.error = None;
            state.save_epoch += 1;
            (batch, state.save_epoch)
        };

        debug!(
            audit_id = %shared.audit_id,
            updates = batch.len(),
            "flushing response batch"
        );

        let outcome = shared
            .remote
            .save_responses(&shared.audit_id, batch.clone())
            .await;

        match outcome {
            Ok(()) => {
                let mut state = shared.state.lock().expect("session state poisoned");
                if state.save_epoch != my_save {
                    return;
                }
                state.status = SaveStatus::Saved;

                let saved_display = shared.saved_display;
                let revert = Arc::downgrade(&shared);
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(saved_display).await;
                    let Some(revert) = revert.upgrade() else {
                        return;
                    };
                    let mut state = revert.state.lock().expect("session state poisoned");
                    if state.save_epoch == my_save && state.status == SaveStatus::Saved {
                        state.status = SaveStatus::Idle;
                    }
                });
                if let Some(previous) = state.status_timer.replace(handle) {
                    previous.abort();
                }
            }
            Err(err) => {
                warn!(audit_id = %shared.audit_id, error = %err, "response batch save failed");
                let mut state = shared.state.lock().expect("session state poisoned");
                // Restore the failed batch without clobbering edits made
                // while the save was in flight.
                for update in batch {
                    state
                        .pending
                        .entry(update.question_id.clone())
                        .and_modify(|newer| newer.backfill(&update))
                        .or_insert(update);
                }
                if state.save_epoch == my_save {
                    state.status = SaveStatus::Error;
                    state.error = Some(err.to_string());
                }
            }
        }
    }
}

impl<S> Drop for Shared<S> {
    fn drop(&mut self) {
        let mut state = self.state.lock().expect("session state poisoned");
        if let Some(timer) = state.debounce_timer.take() {
            timer.abort();
        }
        if let Some(timer) = state.status_timer.take() {
            timer.abort();
        }
    }
}
