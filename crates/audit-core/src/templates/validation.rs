//! Save gating for templates.
//!
//! A template may drift through invalid totals while being edited; these
//! checks only decide whether a save may proceed. Blockers are human-readable
//! and surfaced as state, never as a panic.

use super::domain::Template;
use super::weights;

/// Save blocked because the template is not in a persistable state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("template cannot be saved: {}", blockers.join("; "))]
pub struct ValidationError {
    pub blockers: Vec<String>,
}

/// Every reason the given template cannot be persisted right now.
///
/// Empty result means the save may proceed: the weight total equals 100%
/// (within epsilon) and the tree is structurally complete (every area has a
/// scope, every scope a question, every question an option).
pub fn save_blockers(template: &Template) -> Vec<String> {
    let mut blockers = Vec::new();

    let totals = weights::template_total(&template.areas);
    if !totals.is_valid {
        blockers.push(format!(
            "total weightage must equal 100%, currently {}%",
            totals.total
        ));
    }

    if template.areas.is_empty() {
        blockers.push("template has no audit areas".to_string());
    }

    for area in &template.areas {
        if area.scopes.is_empty() {
            blockers.push(format!("audit area '{}' has no scopes", area.name));
        }
        for scope in &area.scopes {
            if scope.questions.is_empty() {
                blockers.push(format!(
                    "scope '{}' in area '{}' has no questions",
                    scope.name, area.name
                ));
            }
            for question in &scope.questions {
                if question.options.is_empty() {
                    blockers.push(format!(
                        "question '{}' in scope '{}' has no options",
                        question.text, scope.name
                    ));
                }
            }
        }
    }

    blockers
}

pub fn validate_for_save(template: &Template) -> Result<(), ValidationError> {
    let blockers = save_blockers(template);
    if blockers.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { blockers })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::store::TemplateStore;

    #[test]
    fn complete_balanced_template_passes() {
        let mut store = TemplateStore::new();
        let tid = store.init_draft("Delivery Excellence");
        let aid = store.add_area(&tid, "Engineering").expect("area");
        let sid = store.add_scope(&tid, &aid, "Practices").expect("scope");
        store.add_question(&tid, &aid, &sid, "CI in place?", 60.0);
        store.add_question(&tid, &aid, &sid, "Reviews enforced?", 40.0);

        let template = store.template(&tid).expect("template");
        assert!(save_blockers(template).is_empty());
        assert!(validate_for_save(template).is_ok());
    }

    #[test]
    fn empty_template_reports_total_and_structure() {
        let mut store = TemplateStore::new();
        let tid = store.init_draft("Empty");
        let template = store.template(&tid).expect("template");

        let blockers = save_blockers(template);
        assert!(blockers.iter().any(|b| b.contains("100%")));
        assert!(blockers.iter().any(|b| b.contains("no audit areas")));
    }

    #[test]
    fn structural_gaps_are_each_named() {
        let mut store = TemplateStore::new();
        let tid = store.init_draft("Gappy");
        store.add_area(&tid, "Bare Area").expect("area");
        let a2 = store.add_area(&tid, "Filled Area").expect("area");
        let s2 = store.add_scope(&tid, &a2, "Scope").expect("scope");
        let q = store
            .add_question(&tid, &a2, &s2, "Weighted?", 100.0)
            .expect("question");
        // Strip the default options to trip the option check.
        let template = store.template(&tid).expect("template").clone();
        let option_ids: Vec<_> = template.areas[1].scopes[0].questions[0]
            .options
            .iter()
            .map(|option| option.id.clone())
            .collect();
        for option_id in &option_ids {
            store.delete_option(&tid, &a2, &s2, &q, option_id);
        }

        let template = store.template(&tid).expect("template");
        let blockers = save_blockers(template);
        assert!(blockers.iter().any(|b| b.contains("'Bare Area' has no scopes")));
        assert!(blockers.iter().any(|b| b.contains("has no options")));
        let err = validate_for_save(template).expect_err("blocked");
        assert_eq!(err.blockers, blockers);
    }
}
