//! Conducting audits: responded hierarchy, role capabilities, debounced
//! autosave, and the scoring/report projection.

pub mod domain;
pub mod remote;
pub mod roles;
pub mod scoring;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    Audit, AuditArea, AuditQuestion, AuditScope, AuditStatus, Evidence, QuestionResponse,
    RagStatus, ResponseUpdate, ScoreOption,
};
pub use remote::{EvidenceStore, RemoteAuditStore};
pub use roles::UserRole;
pub use scoring::{AreaFindings, AreaScore, AuditReport, FindingItem, ScoringConfig, ScoringEngine};
pub use session::{AuditProgress, ResponseEditSession, SaveStatus};
