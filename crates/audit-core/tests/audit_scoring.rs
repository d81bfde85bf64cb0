use audit_core::audits::{
    Audit, AuditArea, AuditQuestion, AuditScope, AuditStatus, QuestionResponse, RagStatus,
    ScoreOption, ScoringEngine, UserRole,
};
use chrono::NaiveDate;

fn level_options() -> Vec<ScoreOption> {
    (0..=5)
        .map(|value| ScoreOption {
            value,
            label: format!("Level {value}"),
        })
        .collect()
}

fn question(id: &str, text: &str, score: Option<u32>) -> AuditQuestion {
    AuditQuestion {
        id: id.to_string(),
        text: text.to_string(),
        is_mandatory: true,
        options: level_options(),
        response: score.map(|value| QuestionResponse {
            score: Some(value),
            comment: None,
            recommendation: None,
            evidences: Vec::new(),
            is_answered: true,
        }),
    }
}

fn two_area_audit() -> Audit {
    Audit {
        id: "audit-7".to_string(),
        project_name: "Hermes".to_string(),
        template_name: "Delivery Excellence".to_string(),
        audit_date: NaiveDate::from_ymd_opt(2026, 4, 20).expect("valid date"),
        status: AuditStatus::InProgress,
        areas: vec![
            AuditArea {
                id: "area-eng".to_string(),
                name: "Engineering".to_string(),
                scopes: vec![AuditScope {
                    id: "scope-eng".to_string(),
                    name: "Practices".to_string(),
                    questions: vec![
                        question("q-1", "CI pipeline in place?", Some(5)),
                        question("q-2", "Code reviews enforced?", Some(4)),
                    ],
                }],
            },
            AuditArea {
                id: "area-ops".to_string(),
                name: "Operations".to_string(),
                scopes: vec![AuditScope {
                    id: "scope-ops".to_string(),
                    name: "Runbooks".to_string(),
                    questions: vec![
                        question("q-3", "On-call documented?", Some(2)),
                        question("q-4", "Incident reviews held?", None),
                    ],
                }],
            },
        ],
    }
}

#[test]
fn report_scores_each_area_and_bands_the_overall() {
    let report = ScoringEngine::default().report(&two_area_audit());

    // Engineering 9/10, Operations 2/10, overall 11/20.
    assert_eq!(report.area_scores[0].percentage, 90);
    assert_eq!(report.area_scores[1].percentage, 20);
    assert_eq!(report.overall_score, 55);
    assert_eq!(report.rag_status, RagStatus::Amber);
}

#[test]
fn findings_group_by_area_and_include_unanswered_mandatory() {
    let report = ScoringEngine::default().report(&two_area_audit());

    // Engineering is clean; only Operations appears.
    assert_eq!(report.findings.len(), 1);
    let operations = &report.findings[0];
    assert_eq!(operations.area_name, "Operations");
    assert_eq!(operations.items.len(), 2);

    let low = operations
        .items
        .iter()
        .find(|item| item.question == "On-call documented?")
        .expect("low score finding");
    assert_eq!(low.score, 2);

    let unanswered = operations
        .items
        .iter()
        .find(|item| item.question == "Incident reviews held?")
        .expect("unanswered mandatory finding");
    assert_eq!(unanswered.score, 0);
}

#[test]
fn fully_green_audit_produces_no_findings() {
    let mut audit = two_area_audit();
    for area in &mut audit.areas {
        for scope in &mut area.scopes {
            for q in &mut scope.questions {
                q.response = Some(QuestionResponse {
                    score: Some(5),
                    comment: None,
                    recommendation: None,
                    evidences: Vec::new(),
                    is_answered: true,
                });
            }
        }
    }

    let report = ScoringEngine::default().report(&audit);
    assert_eq!(report.overall_score, 100);
    assert_eq!(report.rag_status, RagStatus::Green);
    assert!(report.findings.is_empty());
}

#[test]
fn only_practice_leads_create_and_finalize_audits() {
    assert!(UserRole::PracticeLead.can_create_audit());
    assert!(UserRole::PracticeLead.can_finalize_audit());
    for role in [UserRole::Auditor, UserRole::Delivery, UserRole::Leadership] {
        assert!(!role.can_create_audit());
        assert!(!role.can_finalize_audit());
    }
}
