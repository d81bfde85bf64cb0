//! Weighted audit template hierarchy: domain tree, derived-weight
//! maintenance, save validation, and remote persistence orchestration.

pub mod domain;
pub mod persistence;
pub mod store;
pub mod validation;
pub mod weights;
pub mod wire;

#[cfg(test)]
mod tests;

pub use domain::{
    AuditArea, NodeId, OptionUpdate, Question, QuestionOption, QuestionUpdate, Scope, Template,
};
pub use persistence::{DetailFetch, RemoteTemplateStore, TemplateService};
pub use store::TemplateStore;
pub use validation::{save_blockers, validate_for_save, ValidationError};
pub use weights::{count_template_questions, template_total, TemplateTotal};
