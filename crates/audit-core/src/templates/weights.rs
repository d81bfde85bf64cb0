//! Pure percentage arithmetic for the template hierarchy.
//!
//! The area weightage definition here is authoritative: an area always weighs
//! the sum of the question percentages across its scopes.

use serde::Serialize;

use super::domain::{AuditArea, Question, Scope, Template};

/// Target every template must sum to before it may be persisted.
pub const WEIGHT_TARGET: f64 = 100.0;

/// Tolerance for float drift accumulated by repeated additions.
pub const WEIGHT_EPSILON: f64 = 0.01;

/// Sum of question percentages inside one scope.
pub fn scope_total(questions: &[Question]) -> f64 {
    questions.iter().map(|question| question.percentage).sum()
}

/// Sum of scope totals across an area's scopes.
pub fn area_weightage(scopes: &[Scope]) -> f64 {
    scopes.iter().map(|scope| scope_total(&scope.questions)).sum()
}

/// Template-level total and its persistability verdict.
///
/// `total` is rounded to two decimals for display; validity is judged on the
/// unrounded sum. Empty templates sum to 0 and are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemplateTotal {
    pub total: f64,
    pub is_valid: bool,
}

pub fn template_total(areas: &[AuditArea]) -> TemplateTotal {
    let total: f64 = areas.iter().map(|area| area.weightage).sum();
    TemplateTotal {
        total: (total * 100.0).round() / 100.0,
        is_valid: (total - WEIGHT_TARGET).abs() < WEIGHT_EPSILON,
    }
}

pub fn count_scope_questions(scope: &Scope) -> usize {
    scope.questions.len()
}

pub fn count_area_questions(area: &AuditArea) -> usize {
    area.scopes.iter().map(|scope| scope.questions.len()).sum()
}

pub fn count_template_questions(template: &Template) -> usize {
    template.areas.iter().map(count_area_questions).sum()
}
