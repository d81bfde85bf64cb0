//! Collaborator seams for the audit side: the remote audit store the edit
//! session batches saves into, and the evidence file store.

use async_trait::async_trait;

use crate::error::RemoteError;

use super::domain::{Audit, Evidence, ResponseUpdate};
use super::scoring::AuditReport;

#[async_trait]
pub trait RemoteAuditStore: Send + Sync {
    async fn get_audit(&self, id: &str) -> Result<Audit, RemoteError>;
    async fn get_report(&self, id: &str) -> Result<AuditReport, RemoteError>;
    /// Persist a batch of response diffs. Last write wins; single-editor
    /// sessions are assumed.
    async fn save_responses(
        &self,
        id: &str,
        updates: Vec<ResponseUpdate>,
    ) -> Result<(), RemoteError>;
    /// One-way transition; the store rejects edits afterwards.
    async fn finalize(&self, id: &str) -> Result<(), RemoteError>;
}

/// Upload mechanics are out of scope; the core only needs the returned
/// reference to attach to a response's evidence list.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<Evidence, RemoteError>;
}
