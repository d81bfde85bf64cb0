//! Orchestration between the in-memory [`TemplateStore`] and the remote
//! template store: fetching, saving (with the draft-to-persisted identity
//! transition), server-side cloning, and deletion.
//!
//! Remote failures never touch the tree; they land in `store.error` so the
//! caller can surface and retry. Save-validity gating lives in
//! [`super::validation`] and is the caller's responsibility.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::RemoteError;

use super::domain::NodeId;
use super::domain::Template;
use super::store::TemplateStore;
use super::wire::{TemplatePayload, TemplateWire};

/// Abstract remote template store (HTTP in production, in-memory in tests).
#[async_trait]
pub trait RemoteTemplateStore: Send + Sync {
    /// Summary list: areas without nested scopes.
    async fn list(&self) -> Result<Vec<TemplateWire>, RemoteError>;
    async fn get_detail(&self, id: &str) -> Result<TemplateWire, RemoteError>;
    async fn create(&self, payload: TemplatePayload) -> Result<TemplateWire, RemoteError>;
    async fn update(&self, id: &str, payload: TemplatePayload)
        -> Result<TemplateWire, RemoteError>;
    /// Persist a new, independent template seeded from a full-tree snapshot.
    async fn clone_template(
        &self,
        id: &str,
        new_name: &str,
        snapshot: TemplatePayload,
    ) -> Result<TemplateWire, RemoteError>;
    async fn delete(&self, id: &str) -> Result<(), RemoteError>;
}

/// Outcome of a detail fetch. Asking for a draft is a recognized, benign
/// condition handled before any remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFetch {
    Loaded,
    DraftNotFetchable,
    Failed,
}

/// Coordinates remote persistence for a [`TemplateStore`].
pub struct TemplateService<R> {
    remote: Arc<R>,
}

impl<R: RemoteTemplateStore> TemplateService<R> {
    pub fn new(remote: Arc<R>) -> Self {
        Self { remote }
    }

    /// Fetch the summary collection and replace the store's templates.
    pub async fn fetch_all(&self, store: &mut TemplateStore) {
        store.loading = true;
        store.error = None;
        match self.remote.list().await {
            Ok(wires) => {
                store.loading = false;
                store.replace_all(wires.into_iter().map(TemplateWire::into_domain).collect());
            }
            Err(err) => {
                warn!(error = %err, "template list fetch failed");
                store.loading = false;
                store.error = Some(err.to_string());
            }
        }
    }

    /// Fetch one full tree. Drafts are skipped without contacting the remote
    /// store and without raising a user-facing error.
    pub async fn fetch_detail(&self, store: &mut TemplateStore, id: &NodeId) -> DetailFetch {
        let Some(wire_id) = id.wire_id() else {
            debug!(template = %id, "skipping detail fetch for draft template");
            return DetailFetch::DraftNotFetchable;
        };

        store.loading = true;
        store.error = None;
        match self.remote.get_detail(wire_id).await {
            Ok(wire) => {
                store.loading = false;
                store.upsert_fetched(wire.into_domain());
                DetailFetch::Loaded
            }
            Err(err) => {
                warn!(template = %id, error = %err, "template detail fetch failed");
                store.loading = false;
                store.error = Some(err.to_string());
                DetailFetch::Failed
            }
        }
    }

    /// Fetch the base template's full tree, deep-copy it client-side under a
    /// fresh draft identity, and select the new draft. Returns the draft's ID.
    pub async fn create_draft_from_existing(
        &self,
        store: &mut TemplateStore,
        name: &str,
        base_id: &NodeId,
    ) -> Option<NodeId> {
        let Some(wire_id) = base_id.wire_id() else {
            store.error = Some("cannot copy an unsaved draft template".to_string());
            return None;
        };

        store.loading = true;
        store.error = None;
        match self.remote.get_detail(wire_id).await {
            Ok(wire) => {
                store.loading = false;
                let source = wire.into_domain();
                let new_id = NodeId::draft();
                let draft = source.clone_as_draft(new_id.clone(), name);
                store.insert(draft);
                store.select_template(Some(new_id.clone()));
                debug!(base = %base_id, draft = %new_id, "created draft from existing template");
                Some(new_id)
            }
            Err(err) => {
                store.loading = false;
                store.error = Some(err.to_string());
                None
            }
        }
    }

    /// Save `template` (a snapshot taken at dispatch time). Drafts go up as
    /// creates with no IDs; persisted templates as updates with draft nodes
    /// stripped of theirs. On success the slot found by `original_id` is
    /// replaced with the server's representation and selection follows the
    /// identity change.
    pub async fn save(&self, store: &mut TemplateStore, template: Template, original_id: NodeId) {
        store.saving = true;
        store.error = None;

        let result = match template.id.wire_id() {
            None => {
                self.remote
                    .create(TemplatePayload::for_create(&template))
                    .await
            }
            Some(wire_id) => {
                self.remote
                    .update(wire_id, TemplatePayload::for_update(&template))
                    .await
            }
        };

        match result {
            Ok(wire) => {
                store.saving = false;
                let saved = wire.into_domain();
                debug!(original = %original_id, persisted = %saved.id, "template saved");
                store.apply_saved(&original_id, saved);
            }
            Err(err) => {
                warn!(template = %original_id, error = %err, "template save failed");
                store.saving = false;
                store.error = Some(err.to_string());
            }
        }
    }

    /// Ask the remote store to persist an independent copy of `id` under
    /// `new_name`. Distinct from [`Self::create_draft_from_existing`]: the
    /// result is already persisted when it lands in the store.
    pub async fn clone_on_server(
        &self,
        store: &mut TemplateStore,
        id: &NodeId,
        new_name: &str,
    ) -> Option<NodeId> {
        let Some(wire_id) = id.wire_id() else {
            store.error = Some("cannot clone an unsaved draft template".to_string());
            return None;
        };

        store.loading = true;
        store.error = None;
        let detail = match self.remote.get_detail(wire_id).await {
            Ok(wire) => wire,
            Err(err) => {
                store.loading = false;
                store.error = Some(err.to_string());
                return None;
            }
        };

        let snapshot = TemplatePayload::for_create(&detail.into_domain());
        match self.remote.clone_template(wire_id, new_name, snapshot).await {
            Ok(wire) => {
                store.loading = false;
                let cloned = wire.into_domain();
                let cloned_id = cloned.id.clone();
                store.insert(cloned);
                Some(cloned_id)
            }
            Err(err) => {
                store.loading = false;
                store.error = Some(err.to_string());
                None
            }
        }
    }

    /// Delete a template. Drafts are purely local; the remote store has no
    /// record of them.
    pub async fn delete(&self, store: &mut TemplateStore, id: &NodeId) {
        match id.wire_id() {
            None => store.remove(id),
            Some(wire_id) => match self.remote.delete(wire_id).await {
                Ok(()) => store.remove(id),
                Err(err) => {
                    warn!(template = %id, error = %err, "template delete failed");
                    store.error = Some(err.to_string());
                }
            },
        }
    }
}
